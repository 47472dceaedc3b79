use std::path::PathBuf;
use tracing::{info, warn};

/// Certificate paths for serving HTTPS directly
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to certificate PEM file (cert + CA bundle)
    pub cert_path: PathBuf,
    /// Path to private key PEM file
    pub key_path: PathBuf,
}

/// How outgoing email is delivered
#[derive(Debug, Clone)]
pub enum MailConfig {
    /// Log messages instead of sending them (local development)
    Console,
    /// Transactional mail HTTP API
    Http {
        api_url: String,
        api_key: String,
        sender_email: String,
        sender_name: Option<String>,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public base URL used in emailed links
    pub host: String,
    /// Address to bind the listener to
    pub bind_address: String,
    /// HTTP(S) port
    pub http_port: u16,
    /// Optional TLS; plain HTTP when absent
    pub tls: Option<TlsConfig>,
    /// JSON state file; `None` keeps everything in memory
    pub state_path: Option<PathBuf>,
    /// Zone seed data (`city,localNameOfCity,province` per line)
    pub zones_csv_path: PathBuf,
    /// Session lifetime in seconds
    pub session_ttl_secs: u64,
    pub mail: MailConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8080".to_string(),
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
            tls: None,
            state_path: Some(PathBuf::from("state/studyolle.json")),
            zones_csv_path: PathBuf::from("data/zones_kr.csv"),
            session_ttl_secs: 86400,
            mail: MailConfig::Console,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tls = match (
            std::env::var("TLS_CERT_PATH").ok(),
            std::env::var("TLS_KEY_PATH").ok(),
        ) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                warn!("Only one of TLS_CERT_PATH / TLS_KEY_PATH is set, serving plain HTTP");
                None
            }
        };

        let mail = match (
            std::env::var("MAIL_API_URL").ok(),
            std::env::var("MAIL_API_KEY").ok(),
            std::env::var("MAIL_SENDER_EMAIL").ok(),
        ) {
            (Some(api_url), Some(api_key), Some(sender_email)) => MailConfig::Http {
                api_url,
                api_key,
                sender_email,
                sender_name: std::env::var("MAIL_SENDER_NAME").ok(),
            },
            _ => {
                info!("Mail API not configured, emails will be logged to the console");
                MailConfig::Console
            }
        };

        Self {
            host: std::env::var("APP_HOST")
                .map(|h| h.trim_end_matches('/').to_string())
                .unwrap_or(defaults.host),
            bind_address: std::env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_port),
            tls,
            state_path: match std::env::var("STATE_PATH") {
                Ok(path) if path.is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => defaults.state_path,
            },
            zones_csv_path: std::env::var("ZONES_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.zones_csv_path),
            session_ttl_secs: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.session_ttl_secs),
            mail,
        }
    }

    /// Config for tests: in-memory state, console mail
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            state_path: None,
            ..Self::default()
        }
    }
}
