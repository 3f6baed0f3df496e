use quill_auth::TokenService;
use quill_store::Database;

/// Long-lived services shared by every controller.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
}

impl AppState {
    pub const fn new(db: Database, tokens: TokenService) -> Self {
        Self { db, tokens }
    }
}
