//! # quill-server
//!
//! HTTP API for the prompt builder: users, prompts, tags and templates
//! behind bearer-token authentication.
//!
//! ## Endpoints
//!
//! | Prefix | Routes | Auth |
//! |---|---|---|
//! | `/api/v1/auth` | `POST /register`, `POST /login`, `POST /refresh-token` | no |
//! | `/api/v1/users` | `GET /me`, `GET /`, `POST /`, `PUT /{id}`, `DELETE /{id}` | yes |
//! | `/api/v1/prompts` | `GET /`, `GET /{id}`, `POST /`, `PUT /{id}`, `DELETE /{id}` | yes |
//! | `/api/v1/tags` | same as prompts | yes |
//! | `/api/v1/templates` | same as prompts | yes |
//!
//! ## Embedding
//!
//! ```ignore
//! use quill_auth::TokenService;
//! use quill_server::{build_app, AppState};
//! use quill_store::Database;
//!
//! let db = Database::connect("sqlite:prompt_builder.db?mode=rwc", 5).await?;
//! db.create_tables().await?;
//!
//! let app = build_app(&AppState::new(db, TokenService::new("access", "refresh")))?;
//! quill_server::server::serve(app, "127.0.0.1:8080".parse()?).await?;
//! ```

pub mod config;
pub mod controllers;
pub mod middleware;
pub mod routes;
pub mod server;
mod state;

pub use config::Config;
pub use middleware::AuthMiddleware;
pub use routes::build_app;
pub use state::AppState;
