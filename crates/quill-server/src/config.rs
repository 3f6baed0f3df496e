//! Command-line and environment configuration.

use std::net::SocketAddr;

use clap::Parser;

/// Prompt builder API server.
#[derive(Debug, Clone, Parser)]
#[command(name = "quill-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:prompt_builder.db?mode=rwc")]
    pub database: String,

    /// Address to listen on.
    #[arg(short, long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Secret for signing access tokens.
    #[arg(long, env = "JWT_SECRET", default_value = "your_jwt_secret", hide_env_values = true)]
    pub jwt_secret: String,

    /// Secret for signing refresh tokens.
    #[arg(
        long,
        env = "REFRESH_TOKEN_SECRET",
        default_value = "refresh_secret",
        hide_env_values = true
    )]
    pub refresh_secret: String,

    /// Maximum number of pooled database connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}
