use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    // State errors
    #[error("Failed to load state from '{path}': {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file '{path}': {source}")]
    StateParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save state to '{path}': {source}")]
    StateSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported state schema version {found} (expected at most {supported})")]
    StateVersion { found: u32, supported: u32 },

    // Lookup errors
    #[error("Account not found: {id}")]
    AccountNotFound { id: u64 },

    #[error("No account with nickname '{nickname}'")]
    NicknameNotFound { nickname: String },

    #[error("Study not found: {path}")]
    StudyNotFound { path: String },

    // Uniqueness violations detected inside a transaction
    #[error("{field} '{value}' is already in use")]
    Conflict { field: &'static str, value: String },

    // Mail errors
    #[error("Failed to send email to {to}: {message}")]
    Mail { to: String, message: String },

    // Password encoding
    #[error("Password hashing failed: {message}")]
    PasswordHash { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AccountNotFound { .. }
            | AppError::NicknameNotFound { .. }
            | AppError::StudyNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let message = match status {
            StatusCode::NOT_FOUND => self.to_string(),
            StatusCode::CONFLICT => self.to_string(),
            _ => "Something went wrong. Please try again later.".to_string(),
        };

        (status, Html(crate::web::views::error_page(status, &message))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
