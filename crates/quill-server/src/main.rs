//! quill-server
//!
//! Runs the prompt builder API.

use clap::Parser;
use quill_auth::TokenService;
use quill_server::{build_app, server, AppState, Config};
use quill_store::Database;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // Setup logging
    let log_level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = Database::connect(&config.database, config.max_connections).await?;
    db.create_tables().await?;

    let tokens = TokenService::new(config.jwt_secret.clone(), config.refresh_secret.clone());
    let app = build_app(&AppState::new(db, tokens))?;
    info!(mounts = app.mounts().count(), "application ready");

    server::serve(app, config.bind).await?;
    Ok(())
}
