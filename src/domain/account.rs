use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum time between two emailed tokens for the same account
pub const CONFIRM_EMAIL_COOLDOWN_SECS: i64 = 3600;

/// A registered member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: u64,

    pub email: String,

    pub nickname: String,

    /// Encoded password (PHC string, algorithm is part of the encoding)
    pub password: String,

    pub email_verified: bool,

    /// Token sent in the last verification or login-link email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_check_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_check_token_generated_at: Option<DateTime<Utc>>,

    /// Set when the email address is verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub occupation: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    /// Data URL of the profile picture
    #[serde(default)]
    pub profile_image: Option<String>,

    #[serde(default)]
    pub notifications: Notifications,

    /// Tag ids
    #[serde(default)]
    pub tags: BTreeSet<u64>,

    /// Zone ids
    #[serde(default)]
    pub zones: BTreeSet<u64>,
}

impl Account {
    /// Build a not-yet-persisted account; the store assigns the id
    pub fn new(email: String, nickname: String, encoded_password: String) -> Self {
        Self {
            id: 0,
            email,
            nickname,
            password: encoded_password,
            email_verified: false,
            email_check_token: None,
            email_check_token_generated_at: None,
            joined_at: None,
            bio: None,
            url: None,
            occupation: None,
            location: None,
            profile_image: None,
            notifications: Notifications::default(),
            tags: BTreeSet::new(),
            zones: BTreeSet::new(),
        }
    }

    /// Replace the email check token and stamp its generation time
    pub fn generate_email_check_token(&mut self) {
        self.email_check_token = Some(uuid::Uuid::new_v4().to_string());
        self.email_check_token_generated_at = Some(Utc::now());
    }

    /// Mark the email as verified
    pub fn complete_sign_up(&mut self) {
        self.email_verified = true;
        self.joined_at = Some(Utc::now());
    }

    pub fn is_valid_token(&self, token: &str) -> bool {
        self.email_check_token.as_deref() == Some(token)
    }

    /// Whether another token email may be sent now
    pub fn can_send_confirm_email(&self) -> bool {
        self.can_send_confirm_email_at(Utc::now())
    }

    pub fn can_send_confirm_email_at(&self, now: DateTime<Utc>) -> bool {
        match self.email_check_token_generated_at {
            Some(generated_at) => {
                now - generated_at >= Duration::seconds(CONFIRM_EMAIL_COOLDOWN_SECS)
            }
            None => true,
        }
    }
}

/// Per-channel notification preferences
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notifications {
    pub study_created_by_email: bool,
    pub study_created_by_web: bool,
    pub study_enrollment_result_by_email: bool,
    pub study_enrollment_result_by_web: bool,
    pub study_updated_by_email: bool,
    pub study_updated_by_web: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            study_created_by_email: false,
            study_created_by_web: true,
            study_enrollment_result_by_email: false,
            study_enrollment_result_by_web: true,
            study_updated_by_email: false,
            study_updated_by_web: true,
        }
    }
}
