use serde::{Deserialize, Serialize};

use super::{check_length, is_valid_handle, FieldErrors};
use crate::domain::{parse_zone_name, Account, Notifications};
use crate::state::Database;

fn empty_as_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl ProfileForm {
    pub fn from_account(account: &Account) -> Self {
        Self {
            bio: account.bio.clone(),
            url: account.url.clone(),
            occupation: account.occupation.clone(),
            location: account.location.clone(),
            profile_image: account.profile_image.clone(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let limits = [
            ("bio", &self.bio, 35),
            ("url", &self.url, 50),
            ("occupation", &self.occupation, 50),
            ("location", &self.location, 50),
        ];
        for (field, value, max) in limits {
            if let Some(value) = value {
                check_length(&mut errors, field, value, 0, max);
            }
        }
        errors
    }

    /// Copy the form onto the account, blank fields become `None`
    pub fn apply_to(&self, account: &mut Account) {
        account.bio = empty_as_none(&self.bio);
        account.url = empty_as_none(&self.url);
        account.occupation = empty_as_none(&self.occupation);
        account.location = empty_as_none(&self.location);
        account.profile_image = empty_as_none(&self.profile_image);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordForm {
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

impl PasswordForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "newPassword", &self.new_password, 8, 50);
        check_length(
            &mut errors,
            "newPasswordConfirm",
            &self.new_password_confirm,
            8,
            50,
        );

        if self.new_password != self.new_password_confirm {
            errors.reject("newPassword", "wrong.value");
        }
        errors
    }
}

/// Unchecked boxes are absent from the submission and bind as `false`
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsForm {
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_created_by_email: bool,
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_created_by_web: bool,
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_enrollment_result_by_email: bool,
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_enrollment_result_by_web: bool,
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_updated_by_email: bool,
    #[serde(default, deserialize_with = "super::checkbox")]
    pub study_updated_by_web: bool,
}

impl From<Notifications> for NotificationsForm {
    fn from(n: Notifications) -> Self {
        Self {
            study_created_by_email: n.study_created_by_email,
            study_created_by_web: n.study_created_by_web,
            study_enrollment_result_by_email: n.study_enrollment_result_by_email,
            study_enrollment_result_by_web: n.study_enrollment_result_by_web,
            study_updated_by_email: n.study_updated_by_email,
            study_updated_by_web: n.study_updated_by_web,
        }
    }
}

impl From<NotificationsForm> for Notifications {
    fn from(f: NotificationsForm) -> Self {
        Self {
            study_created_by_email: f.study_created_by_email,
            study_created_by_web: f.study_created_by_web,
            study_enrollment_result_by_email: f.study_enrollment_result_by_email,
            study_enrollment_result_by_web: f.study_enrollment_result_by_web,
            study_updated_by_email: f.study_updated_by_email,
            study_updated_by_web: f.study_updated_by_web,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NicknameForm {
    #[serde(default)]
    pub nickname: String,
}

impl NicknameForm {
    pub fn validate_with(&self, db: &Database) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !is_valid_handle(&self.nickname, 3, 20) {
            errors.reject("nickname", "pattern");
        }
        if db.exists_by_nickname(&self.nickname) {
            errors.reject("nickname", "invalid.nickname");
        }
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagForm {
    pub tag_title: String,
}

/// Either `zoneName` (`city(local)/province`) or explicit city and province
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneForm {
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub province_name: Option<String>,
}

impl ZoneForm {
    pub fn city_and_province(&self) -> Option<(String, String)> {
        if let (Some(city), Some(province)) = (&self.city_name, &self.province_name) {
            return Some((city.trim().to_string(), province.trim().to_string()));
        }
        self.zone_name.as_deref().and_then(parse_zone_name)
    }
}
