//! Router assembly and the HTTP(S) listener

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth::SharedSessionStore;
use super::{account, settings, study};
use crate::config::AppConfig;
use crate::managers::{SharedAccountManager, SharedStudyManager};

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: SharedAccountManager,
    pub studies: SharedStudyManager,
    pub sessions: SharedSessionStore,
}

impl FromRef<AppState> for SharedSessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(account::index))
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", post(account::logout))
        .route("/sign-up", get(account::sign_up_form).post(account::sign_up))
        .route("/check-email-token", get(account::check_email_token))
        .route("/check-email", get(account::check_email))
        .route("/resend-confirm-email", get(account::resend_confirm_email))
        .route(
            "/email-login",
            get(account::email_login_form).post(account::send_email_login_link),
        )
        .route("/login-by-email", get(account::login_by_email))
        .route("/profile/:nickname", get(account::view_profile))
        .route(
            "/settings/profile",
            get(settings::profile_form).post(settings::update_profile),
        )
        .route(
            "/settings/password",
            get(settings::password_form).post(settings::update_password),
        )
        .route(
            "/settings/notifications",
            get(settings::notifications_form).post(settings::update_notifications),
        )
        .route(
            "/settings/account",
            get(settings::account_form).post(settings::update_account),
        )
        .route("/settings/tags", get(settings::tags_form))
        .route("/settings/tags/add", post(settings::add_tag))
        .route("/settings/tags/remove", post(settings::remove_tag))
        .route("/settings/zones", get(settings::zones_form))
        .route("/settings/zones/add", post(settings::add_zone))
        .route("/settings/zones/remove", post(settings::remove_zone))
        .route(
            "/new-study",
            get(study::new_study_form).post(study::new_study),
        )
        .route("/study/:path", get(study::view_study))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the application until the listener fails
pub async fn start_web_server(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.http_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", config.bind_address, e))?;

    match &config.tls {
        Some(tls) => {
            info!("Loading TLS certificates:");
            info!("  Certificate: {}", tls.cert_path.display());
            info!("  Private key: {}", tls.key_path.display());

            if !tls.cert_path.exists() {
                return Err(anyhow::anyhow!(
                    "Certificate file not found: {}",
                    tls.cert_path.display()
                ));
            }
            if !tls.key_path.exists() {
                return Err(anyhow::anyhow!(
                    "Private key file not found: {}",
                    tls.key_path.display()
                ));
            }

            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {}", e))?;

            info!("Web server listening on https://{}", addr);
            info!("Links in emails point at {}", config.host);

            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;

            info!("Web server listening on http://{}", listener.local_addr()?);
            info!("Links in emails point at {}", config.host);

            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}
