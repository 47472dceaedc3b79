//! Outgoing email.

mod console;
mod http;
pub mod templates;

use async_trait::async_trait;
use std::sync::Arc;

pub use console::ConsoleEmailService;
pub use http::HttpEmailService;

use crate::config::MailConfig;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    /// HTML body
    pub message: String,
}

#[async_trait]
pub trait EmailService: Send + Sync {
    /// Deliver a message; failures surface as [`crate::error::AppError::Mail`]
    async fn send_email(&self, message: EmailMessage) -> Result<()>;
}

pub type SharedEmailService = Arc<dyn EmailService>;

pub fn create_email_service(config: &MailConfig) -> Result<SharedEmailService> {
    let service: SharedEmailService = match config {
        MailConfig::Console => Arc::new(ConsoleEmailService::new()),
        MailConfig::Http {
            api_url,
            api_key,
            sender_email,
            sender_name,
        } => Arc::new(HttpEmailService::new(
            api_url.clone(),
            api_key.clone(),
            sender_email.clone(),
            sender_name.clone(),
        )?),
    };
    Ok(service)
}
