use std::sync::Arc;
use tracing::info;

use crate::domain::Study;
use crate::error::{AppError, Result};
use crate::forms::{StudyForm, Validated};
use crate::state::SharedStore;

pub struct StudyManager {
    store: SharedStore,
}

impl StudyManager {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create a study managed by `account_id`
    pub async fn create_new_study(&self, form: &StudyForm, account_id: u64) -> Result<Validated<Study>> {
        let mut tx = self.store.begin().await;

        let errors = form.validate_with(&tx);
        if errors.has_errors() {
            return Ok(Validated::Invalid(errors));
        }
        if tx.find_account(account_id).is_none() {
            return Err(AppError::AccountNotFound { id: account_id });
        }

        let mut study = Study::new(
            form.path.clone(),
            form.title.trim().to_string(),
            form.short_description.trim().to_string(),
            form.full_description.clone(),
        );
        study.add_manager(account_id);
        let study = tx.insert_study(study)?;
        tx.commit().await?;

        info!("Account {} created study '{}'", account_id, study.path);
        Ok(Validated::Valid(study))
    }

    pub async fn get_study(&self, path: &str) -> Result<Study> {
        self.store
            .read(|db| db.find_study_by_path(path).cloned())
            .await
            .ok_or_else(|| AppError::StudyNotFound {
                path: path.to_string(),
            })
    }

    /// Nicknames of the study's managers
    pub async fn manager_nicknames(&self, study: &Study) -> Vec<String> {
        self.store
            .read(|db| {
                study
                    .managers
                    .iter()
                    .filter_map(|id| db.find_account(*id))
                    .map(|a| a.nickname.clone())
                    .collect()
            })
            .await
    }
}

pub type SharedStudyManager = Arc<StudyManager>;

pub fn create_shared_study_manager(store: SharedStore) -> SharedStudyManager {
    Arc::new(StudyManager::new(store))
}
