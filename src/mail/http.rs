use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use super::{EmailMessage, EmailService};
use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody {
    sender: MailAddress,
    to: Vec<MailAddress>,
    subject: String,
    html_content: String,
}

/// Upper bound for one API call, connect included
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers through a transactional mail HTTP API (JSON body, `api-key` header)
pub struct HttpEmailService {
    api_url: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
    http_client: reqwest::Client,
}

impl HttpEmailService {
    pub fn new(
        api_url: String,
        api_key: String,
        sender_email: String,
        sender_name: Option<String>,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("failed to build mail HTTP client: {}", e),
            })?;

        Ok(Self {
            api_url,
            api_key,
            sender_email,
            sender_name,
            http_client,
        })
    }

    fn body(&self, message: &EmailMessage) -> SendMailBody {
        SendMailBody {
            sender: MailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![MailAddress {
                email: message.to.clone(),
                name: None,
            }],
            subject: message.subject.clone(),
            html_content: message.message.clone(),
        }
    }
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<()> {
        let mail_error = |msg: String| AppError::Mail {
            to: message.to.clone(),
            message: msg,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&self.body(&message))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach mail API: {}", e);
                mail_error(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Mail API rejected message to {}: {} - {}", message.to, status, text);
            return Err(mail_error(format!("status {}: {}", status, text)));
        }

        debug!("Mail API accepted message to {}", message.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let service = HttpEmailService::new(
            "https://mail.example.com/v3/smtp/email".to_string(),
            "key".to_string(),
            "noreply@studyolle.com".to_string(),
            Some("StudyOlle".to_string()),
        )
        .unwrap();
        let body = service.body(&EmailMessage {
            to: "a@a.com".to_string(),
            subject: "subject".to_string(),
            message: "<p>hi</p>".to_string(),
        });

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sender"]["email"], "noreply@studyolle.com");
        assert_eq!(json["sender"]["name"], "StudyOlle");
        assert_eq!(json["to"][0]["email"], "a@a.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["htmlContent"], "<p>hi</p>");
    }
}
