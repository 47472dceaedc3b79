use serde::Deserialize;

use super::{check_length, check_not_blank, is_valid_handle, FieldErrors};
use crate::state::Database;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyForm {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
}

impl StudyForm {
    pub fn validate_with(&self, db: &Database) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_not_blank(&mut errors, "path", &self.path);
        if !is_valid_handle(&self.path, 2, 20) {
            errors.reject("path", "pattern");
        }
        if db.exists_study_by_path(&self.path) {
            errors.reject("path", "wrong.path");
        }

        check_not_blank(&mut errors, "title", &self.title);
        check_length(&mut errors, "title", &self.title, 1, 50);

        check_not_blank(&mut errors, "shortDescription", &self.short_description);
        check_length(
            &mut errors,
            "shortDescription",
            &self.short_description,
            1,
            100,
        );

        check_not_blank(&mut errors, "fullDescription", &self.full_description);

        errors
    }
}
