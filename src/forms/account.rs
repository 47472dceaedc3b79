use serde::Deserialize;

use super::{check_length, check_not_blank, is_valid_handle, FieldErrors};
use crate::state::Database;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignUpForm {
    /// Format checks only
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_not_blank(&mut errors, "nickname", &self.nickname);
        if !is_valid_handle(&self.nickname, 3, 20) {
            errors.reject("nickname", "pattern");
        }

        check_not_blank(&mut errors, "email", &self.email);
        if !email_address::EmailAddress::is_valid(self.email.trim()) {
            errors.reject("email", "email");
        }

        check_not_blank(&mut errors, "password", &self.password);
        check_length(&mut errors, "password", &self.password, 8, 50);

        errors
    }

    /// Format checks plus email/nickname uniqueness against `db`
    pub fn validate_with(&self, db: &Database) -> FieldErrors {
        let mut errors = self.validate();

        if db.exists_by_email(self.email.trim()) {
            errors.reject("email", "invalid.email");
        }

        if db.exists_by_nickname(&self.nickname) {
            errors.reject("nickname", "invalid.nickname");
        }

        errors
    }
}

/// Password login; `username` is an email or a nickname
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailLoginForm {
    #[serde(default)]
    pub email: String,
}

/// Query string of emailed links
#[derive(Debug, Clone, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
}
