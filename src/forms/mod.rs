//! Form binding targets and their validators.
//!
//! Validators never fail a request: they collect per-field error codes that
//! the originating view renders inline.

pub mod account;
pub mod settings;
pub mod study;

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

pub use account::{EmailLoginForm, LoginForm, SignUpForm, TokenParams};
pub use settings::{NicknameForm, NotificationsForm, PasswordForm, ProfileForm, TagForm, ZoneForm};
pub use study::StudyForm;

/// Field name -> error code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first error for a field wins
    pub fn reject(&mut self, field: &str, code: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| code.to_string());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Result of an operation that validates its input against stored data
#[derive(Debug, Clone)]
pub enum Validated<T> {
    Valid(T),
    Invalid(FieldErrors),
}

/// Nickname and study path alphabet: Hangul jamo and syllables, `a-z`, `0-9`, `_`, `-`
pub fn is_handle_char(c: char) -> bool {
    matches!(c, 'ㄱ'..='ㅎ' | '가'..='힣' | 'a'..='z' | '0'..='9' | '_' | '-')
}

/// `min..=max` characters, all from the handle alphabet
pub fn is_valid_handle(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len) && value.chars().all(is_handle_char)
}

pub(crate) fn check_length(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.reject(field, "length");
    }
}

pub(crate) fn check_not_blank(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.reject(field, "not.blank");
    }
}

/// HTML checkbox value: browsers send `on`, other clients `true`, `1` or `yes`
pub(crate) fn checkbox<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    ))
}
