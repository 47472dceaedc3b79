use serde::{Deserialize, Serialize};

/// Interest keyword shared by accounts and studies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: u64,
    pub title: String,
}
