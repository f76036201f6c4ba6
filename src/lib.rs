//! Survey creation and review backend.
//!
//! Signed-in users paste or upload a list of questions; the backend parses
//! them, creates a matching Google Form and tracks the survey through
//! `draft → pending-approval → approved → archived`. Approval sends the form
//! link by email.
//!
//! # Configuration
//!
//! Everything comes from environment variables (secrets may also be mounted
//! under `/run/secrets/<NAME>`), see [`config::Config`]. Google Forms, Google
//! Sign-In and SMTP are each optional; without them the server still runs and
//! reports what it skipped as warnings.

use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod notify;
pub mod questions;
pub mod routes;
pub mod state;
pub mod store;
pub mod survey;
pub mod util;

use config::Config;
use error::StartupError;
use state::AppState;

const DEFAULT_LOG_FILTER: &str = "survey_forge=info";

pub async fn start_server() -> Result<(), StartupError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).init();

    info!("Loading configuration...");
    let config = Config::load()?;
    let address = config.bind_address();

    info!("Initializing state...");
    let state = AppState::from_config(config)?;
    let app = routes::router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
