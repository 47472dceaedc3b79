use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{Account, Study, Tag, Zone};
use crate::error::{AppError, Result};

/// Current schema version of the state file
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the application persists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Schema version for migrations
    pub version: u32,

    /// Last commit timestamp (Unix seconds)
    pub last_updated: i64,

    /// Next primary key, shared by all tables
    pub next_id: u64,

    pub accounts: BTreeMap<u64, Account>,

    #[serde(default)]
    pub tags: BTreeMap<u64, Tag>,

    #[serde(default)]
    pub zones: BTreeMap<u64, Zone>,

    #[serde(default)]
    pub studies: BTreeMap<u64, Study>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            last_updated: chrono::Utc::now().timestamp(),
            next_id: 1,
            accounts: BTreeMap::new(),
            tags: BTreeMap::new(),
            zones: BTreeMap::new(),
            studies: BTreeMap::new(),
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file, or create new if not exists
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let db: Database =
                    serde_json::from_str(&content).map_err(|e| AppError::StateParse {
                        path: path.display().to_string(),
                        source: e,
                    })?;

                if db.version > SCHEMA_VERSION {
                    return Err(AppError::StateVersion {
                        found: db.version,
                        supported: SCHEMA_VERSION,
                    });
                }

                Ok(db)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(AppError::StateLoad {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Save to a JSON file atomically
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::StateSave {
                        path: path.display().to_string(),
                        source: e,
                    })?;
            }
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| AppError::StateSave {
                path: path.display().to_string(),
                source: e,
            })?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| AppError::StateSave {
                path: path.display().to_string(),
                source: e,
            })?;

        Ok(())
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // Accounts

    /// Insert a new account, assigning its id; returns the stored value
    pub fn insert_account(&mut self, mut account: Account) -> Account {
        account.id = self.allocate_id();
        self.accounts.insert(account.id, account.clone());
        account
    }

    /// Drop an account; its id is not reused
    pub fn remove_account(&mut self, id: u64) -> Option<Account> {
        self.accounts.remove(&id)
    }

    pub fn find_account(&self, id: u64) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn find_account_mut(&mut self, id: u64) -> Result<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or(AppError::AccountNotFound { id })
    }

    pub fn find_account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.email == email)
    }

    pub fn find_account_by_nickname(&self, nickname: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.nickname == nickname)
    }

    pub fn exists_by_email(&self, email: &str) -> bool {
        self.find_account_by_email(email).is_some()
    }

    pub fn exists_by_nickname(&self, nickname: &str) -> bool {
        self.find_account_by_nickname(nickname).is_some()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // Tags

    pub fn find_tag(&self, id: u64) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn find_tag_by_title(&self, title: &str) -> Option<&Tag> {
        self.tags.values().find(|t| t.title == title)
    }

    /// Return the tag with this title, creating it if needed
    pub fn find_or_create_tag(&mut self, title: &str) -> Tag {
        if let Some(tag) = self.find_tag_by_title(title) {
            return tag.clone();
        }

        let tag = Tag {
            id: self.allocate_id(),
            title: title.to_string(),
        };
        self.tags.insert(tag.id, tag.clone());
        tag
    }

    // Zones

    pub fn find_zone(&self, id: u64) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn find_zone_by_city_and_province(&self, city: &str, province: &str) -> Option<&Zone> {
        self.zones
            .values()
            .find(|z| z.city == city && z.province == province)
    }

    /// Insert a zone unless one with the same city and province exists
    pub fn insert_zone(&mut self, city: &str, local_name_of_city: &str, province: &str) -> Zone {
        if let Some(zone) = self.find_zone_by_city_and_province(city, province) {
            return zone.clone();
        }

        let zone = Zone {
            id: self.allocate_id(),
            city: city.to_string(),
            local_name_of_city: local_name_of_city.to_string(),
            province: province.to_string(),
        };
        self.zones.insert(zone.id, zone.clone());
        zone
    }

    // Studies

    /// Insert a new study; paths are unique
    pub fn insert_study(&mut self, mut study: Study) -> Result<Study> {
        if self.exists_study_by_path(&study.path) {
            return Err(AppError::Conflict {
                field: "path",
                value: study.path,
            });
        }

        study.id = self.allocate_id();
        self.studies.insert(study.id, study.clone());
        Ok(study)
    }

    pub fn find_study_by_path(&self, path: &str) -> Option<&Study> {
        self.studies.values().find(|s| s.path == path)
    }

    pub fn exists_study_by_path(&self, path: &str) -> bool {
        self.find_study_by_path(path).is_some()
    }
}
