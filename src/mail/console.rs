use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::{EmailMessage, EmailService};
use crate::error::Result;

/// Logs messages instead of delivering them and keeps a copy of each
pub struct ConsoleEmailService {
    outbox: Mutex<Vec<EmailMessage>>,
}

impl ConsoleEmailService {
    pub fn new() -> Self {
        Self {
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Messages "sent" so far, oldest first
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox.lock().clone()
    }

    pub fn last_sent_to(&self, to: &str) -> Option<EmailMessage> {
        self.outbox.lock().iter().rev().find(|m| m.to == to).cloned()
    }
}

impl Default for ConsoleEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<()> {
        info!(
            "Sent email to {} with subject '{}':\n{}",
            message.to, message.subject, message.message
        );
        self.outbox.lock().push(message);
        Ok(())
    }
}
