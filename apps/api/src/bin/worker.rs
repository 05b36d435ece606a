//! The background evaluator process. Run alongside the API server:
//! it consumes the Redis queue and executes the evaluation pipeline.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screening_api::config::Config;
use screening_api::evaluation::worker;
use screening_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("screening_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting evaluation worker v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(config).await?;
    worker::run(state).await
}
