pub mod account;
pub mod auth;
pub mod server;
pub mod settings;
pub mod study;
pub mod views;

#[cfg(test)]
mod tests;

pub use auth::create_session_store;
pub use server::{build_router, start_web_server, AppState};
