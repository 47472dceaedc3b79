use serde::{Deserialize, Serialize};
use std::fmt;

/// Region an account or study is active in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Zone {
    pub id: u64,
    pub city: String,
    pub local_name_of_city: String,
    pub province: String,
}

impl fmt::Display for Zone {
    /// `Seoul(서울특별시)/none`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})/{}", self.city, self.local_name_of_city, self.province)
    }
}

/// Split `city(local)/province` into `(city, province)`
pub fn parse_zone_name(zone_name: &str) -> Option<(String, String)> {
    let open = zone_name.find('(')?;
    let slash = zone_name.rfind('/')?;
    if slash < open {
        return None;
    }

    let city = zone_name[..open].trim();
    let province = zone_name[slash + 1..].trim();
    if city.is_empty() || province.is_empty() {
        return None;
    }

    Some((city.to_string(), province.to_string()))
}
