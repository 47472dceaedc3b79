use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Study group matching service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides HTTP_PORT)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// JSON state file (overrides STATE_PATH)
    #[arg(long)]
    state_path: Option<PathBuf>,
}

mod config;
mod domain;
mod error;
mod forms;
mod html;
mod logging;
mod mail;
mod managers;
mod password;
mod state;
mod web;

use config::AppConfig;
use managers::{create_shared_account_manager, create_shared_study_manager, init_zones};
use state::{create_shared_store, Store};
use web::{create_session_store, AppState};

/// How often expired sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    logging::init(logging::parse_level(
        &std::env::var("LOG_LEVEL").unwrap_or_default(),
    ));

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(path) = args.state_path {
        config.state_path = Some(path);
    }

    if config.state_path.is_none() {
        warn!("STATE_PATH is empty, state will not survive a restart");
    }
    let store = create_shared_store(Store::open(config.state_path.clone()).await?);

    init_zones(&store, &config.zones_csv_path).await?;

    let mailer = mail::create_email_service(&config.mail)?;

    let config = Arc::new(config);
    let sessions = create_session_store(config.session_ttl_secs);
    let state = AppState {
        accounts: create_shared_account_manager(store.clone(), mailer, config.host.clone()),
        studies: create_shared_study_manager(store),
        sessions: sessions.clone(),
        config,
    };

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                debug!("Swept {} expired sessions", removed);
            }
        }
    });

    info!("Starting StudyOlle...");
    web::start_web_server(state).await
}
