pub mod database;
pub mod store;

pub use database::Database;
pub use store::{create_shared_store, SharedStore, Store};
