use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A study group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Study {
    pub id: u64,

    /// URL path segment, unique
    pub path: String,

    pub title: String,

    pub short_description: String,

    pub full_description: String,

    #[serde(default)]
    pub image: Option<String>,

    /// Account ids
    #[serde(default)]
    pub managers: BTreeSet<u64>,

    /// Account ids
    #[serde(default)]
    pub members: BTreeSet<u64>,

    #[serde(default)]
    pub tags: BTreeSet<u64>,

    #[serde(default)]
    pub zones: BTreeSet<u64>,

    #[serde(default)]
    pub published_date_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub closed_date_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub recruiting_updated_date_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub recruiting: bool,

    #[serde(default)]
    pub published: bool,

    #[serde(default)]
    pub closed: bool,

    #[serde(default)]
    pub use_banner: bool,
}

impl Study {
    pub fn new(
        path: String,
        title: String,
        short_description: String,
        full_description: String,
    ) -> Self {
        Self {
            id: 0,
            path,
            title,
            short_description,
            full_description,
            image: None,
            managers: BTreeSet::new(),
            members: BTreeSet::new(),
            tags: BTreeSet::new(),
            zones: BTreeSet::new(),
            published_date_time: None,
            closed_date_time: None,
            recruiting_updated_date_time: None,
            recruiting: false,
            published: false,
            closed: false,
            use_banner: false,
        }
    }

    pub fn add_manager(&mut self, account_id: u64) {
        self.managers.insert(account_id);
    }

    pub fn is_manager(&self, account_id: u64) -> bool {
        self.managers.contains(&account_id)
    }

    pub fn is_member(&self, account_id: u64) -> bool {
        self.members.contains(&account_id)
    }

    /// Anyone may join a published, recruiting study they are not already in
    pub fn is_joinable(&self, account_id: u64) -> bool {
        self.published
            && self.recruiting
            && !self.closed
            && !self.is_member(account_id)
            && !self.is_manager(account_id)
    }
}
