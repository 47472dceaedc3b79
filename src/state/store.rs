//! Transactional access to the persisted [`Database`].
//!
//! Writers take the single write lock, mutate a private copy and either
//! commit it (persist, then publish) or drop it. Readers only ever observe
//! committed data.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info};

use super::database::Database;
use crate::error::Result;

pub struct Store {
    db: RwLock<Database>,
    /// Where commits are written; `None` keeps the store in memory
    path: Option<PathBuf>,
}

impl Store {
    pub fn new(db: Database, path: Option<PathBuf>) -> Self {
        Self {
            db: RwLock::new(db),
            path,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Database::new(), None)
    }

    /// Open the store backed by `path`, loading existing state if present
    pub async fn open(path: Option<PathBuf>) -> Result<Self> {
        let db = match &path {
            Some(p) => {
                info!("Loading state from {}", p.display());
                Database::load(p).await?
            }
            None => Database::new(),
        };

        info!(
            "State ready: {} accounts, {} studies, {} tags, {} zones",
            db.accounts.len(),
            db.studies.len(),
            db.tags.len(),
            db.zones.len()
        );

        Ok(Self::new(db, path))
    }

    /// Run a read-only query against committed data
    pub async fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let db = self.db.read().await;
        f(&db)
    }

    /// Start a transaction; other writers wait until it commits or drops
    pub async fn begin(&self) -> Transaction<'_> {
        let guard = self.db.write().await;
        let working = guard.clone();
        Transaction {
            guard,
            working,
            store: self,
        }
    }

    /// Run `f` in a transaction and commit if it succeeds
    pub async fn transaction<R>(&self, f: impl FnOnce(&mut Database) -> Result<R>) -> Result<R> {
        let mut tx = self.begin().await;
        let out = f(&mut tx)?;
        tx.commit().await?;
        Ok(out)
    }
}

/// Uncommitted changes; dropping without [`Transaction::commit`] rolls back
pub struct Transaction<'a> {
    guard: RwLockWriteGuard<'a, Database>,
    working: Database,
    store: &'a Store,
}

impl Transaction<'_> {
    /// Persist and publish the working copy
    pub async fn commit(self) -> Result<()> {
        let Transaction {
            mut guard,
            mut working,
            store,
        } = self;

        working.last_updated = chrono::Utc::now().timestamp();

        if let Some(path) = &store.path {
            working.save(path).await?;
        }

        *guard = working;
        debug!("Transaction committed");
        Ok(())
    }
}

impl Deref for Transaction<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.working
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        &mut self.working
    }
}

/// Shared store type
pub type SharedStore = Arc<Store>;

pub fn create_shared_store(store: Store) -> SharedStore {
    Arc::new(store)
}
