//! Handler ids, route tables and application wiring.

use std::sync::Arc;

use quill_router::{App, CorsMiddleware, HandlerId, HandlerRegistry, Result, Router};
use quill_store::{PromptRepository, TagRepository, TemplateRepository, UserRepository};

use crate::controllers::{
    AuthController, PromptController, TagController, TemplateController, UserController,
};
use crate::middleware::AuthMiddleware;
use crate::state::AppState;

/// Handler ids referenced by the route tables.
pub mod handlers {
    use quill_router::HandlerId;

    pub const AUTH_REGISTER: HandlerId = HandlerId::new("Auth", "register");
    pub const AUTH_LOGIN: HandlerId = HandlerId::new("Auth", "login");
    pub const AUTH_REFRESH: HandlerId = HandlerId::new("Auth", "refreshToken");

    pub const USERS_ME: HandlerId = HandlerId::new("Users", "getCurrentUser");
    pub const USERS_INDEX: HandlerId = HandlerId::new("Users", "getUsers");
    pub const USERS_CREATE: HandlerId = HandlerId::new("Users", "create");
    pub const USERS_UPDATE: HandlerId = HandlerId::new("Users", "update");
    pub const USERS_DELETE: HandlerId = HandlerId::new("Users", "delete");

    pub const PROMPTS_INDEX: HandlerId = HandlerId::new("Prompts", "getAll");
    pub const PROMPTS_SHOW: HandlerId = HandlerId::new("Prompts", "get");
    pub const PROMPTS_CREATE: HandlerId = HandlerId::new("Prompts", "create");
    pub const PROMPTS_UPDATE: HandlerId = HandlerId::new("Prompts", "update");
    pub const PROMPTS_DELETE: HandlerId = HandlerId::new("Prompts", "delete");

    pub const TAGS_INDEX: HandlerId = HandlerId::new("Tags", "getAll");
    pub const TAGS_SHOW: HandlerId = HandlerId::new("Tags", "get");
    pub const TAGS_CREATE: HandlerId = HandlerId::new("Tags", "create");
    pub const TAGS_UPDATE: HandlerId = HandlerId::new("Tags", "update");
    pub const TAGS_DELETE: HandlerId = HandlerId::new("Tags", "delete");

    pub const TEMPLATES_INDEX: HandlerId = HandlerId::new("Templates", "getAll");
    pub const TEMPLATES_SHOW: HandlerId = HandlerId::new("Templates", "get");
    pub const TEMPLATES_CREATE: HandlerId = HandlerId::new("Templates", "create");
    pub const TEMPLATES_UPDATE: HandlerId = HandlerId::new("Templates", "update");
    pub const TEMPLATES_DELETE: HandlerId = HandlerId::new("Templates", "delete");

    /// Every id above, for startup checks.
    pub const ALL: &[HandlerId] = &[
        AUTH_REGISTER,
        AUTH_LOGIN,
        AUTH_REFRESH,
        USERS_ME,
        USERS_INDEX,
        USERS_CREATE,
        USERS_UPDATE,
        USERS_DELETE,
        PROMPTS_INDEX,
        PROMPTS_SHOW,
        PROMPTS_CREATE,
        PROMPTS_UPDATE,
        PROMPTS_DELETE,
        TAGS_INDEX,
        TAGS_SHOW,
        TAGS_CREATE,
        TAGS_UPDATE,
        TAGS_DELETE,
        TEMPLATES_INDEX,
        TEMPLATES_SHOW,
        TEMPLATES_CREATE,
        TEMPLATES_UPDATE,
        TEMPLATES_DELETE,
    ];
}

use handlers::*;

/// Builds the controllers and binds every handler id to its action.
pub fn registry(state: &AppState) -> HandlerRegistry {
    let auth = Arc::new(AuthController::new(
        UserRepository::new(state.db.clone()),
        state.tokens.clone(),
    ));
    let users = Arc::new(UserController::new(UserRepository::new(state.db.clone())));
    let prompts = Arc::new(PromptController::new(PromptRepository::new(state.db.clone())));
    let tags = Arc::new(TagController::new(TagRepository::new(state.db.clone())));
    let templates = Arc::new(TemplateController::new(TemplateRepository::new(
        state.db.clone(),
    )));

    let mut registry = HandlerRegistry::new();
    registry
        .bind(AUTH_REGISTER, &auth, AuthController::register)
        .bind(AUTH_LOGIN, &auth, AuthController::login)
        .bind(AUTH_REFRESH, &auth, AuthController::refresh);
    registry
        .bind(USERS_ME, &users, UserController::me)
        .bind(USERS_INDEX, &users, UserController::index)
        .bind(USERS_CREATE, &users, UserController::create)
        .bind(USERS_UPDATE, &users, UserController::update)
        .bind(USERS_DELETE, &users, UserController::destroy);
    registry
        .bind(PROMPTS_INDEX, &prompts, PromptController::index)
        .bind(PROMPTS_SHOW, &prompts, PromptController::show)
        .bind(PROMPTS_CREATE, &prompts, PromptController::create)
        .bind(PROMPTS_UPDATE, &prompts, PromptController::update)
        .bind(PROMPTS_DELETE, &prompts, PromptController::destroy);
    registry
        .bind(TAGS_INDEX, &tags, TagController::index)
        .bind(TAGS_SHOW, &tags, TagController::show)
        .bind(TAGS_CREATE, &tags, TagController::create)
        .bind(TAGS_UPDATE, &tags, TagController::update)
        .bind(TAGS_DELETE, &tags, TagController::destroy);
    registry
        .bind(TEMPLATES_INDEX, &templates, TemplateController::index)
        .bind(TEMPLATES_SHOW, &templates, TemplateController::show)
        .bind(TEMPLATES_CREATE, &templates, TemplateController::create)
        .bind(TEMPLATES_UPDATE, &templates, TemplateController::update)
        .bind(TEMPLATES_DELETE, &templates, TemplateController::destroy);
    registry
}

pub fn auth_routes(r: &mut Router) -> Result<()> {
    r.post("/register", AUTH_REGISTER)?
        .post("/login", AUTH_LOGIN)?
        .post("/refresh-token", AUTH_REFRESH)?;
    Ok(())
}

/// `/me` comes first so it wins over `/{id}`-style patterns.
pub fn user_routes(r: &mut Router) -> Result<()> {
    r.get("/me", USERS_ME)?
        .get("/", USERS_INDEX)?
        .post("/", USERS_CREATE)?
        .put("/{id}", USERS_UPDATE)?
        .delete("/{id}", USERS_DELETE)?;
    Ok(())
}

pub fn prompt_routes(r: &mut Router) -> Result<()> {
    crud_routes(
        r,
        [PROMPTS_INDEX, PROMPTS_SHOW, PROMPTS_CREATE, PROMPTS_UPDATE, PROMPTS_DELETE],
    )
}

pub fn tag_routes(r: &mut Router) -> Result<()> {
    crud_routes(r, [TAGS_INDEX, TAGS_SHOW, TAGS_CREATE, TAGS_UPDATE, TAGS_DELETE])
}

pub fn template_routes(r: &mut Router) -> Result<()> {
    crud_routes(
        r,
        [
            TEMPLATES_INDEX,
            TEMPLATES_SHOW,
            TEMPLATES_CREATE,
            TEMPLATES_UPDATE,
            TEMPLATES_DELETE,
        ],
    )
}

/// List, get, create, update, delete.
fn crud_routes(
    r: &mut Router,
    [index, show, create, update, delete]: [HandlerId; 5],
) -> Result<()> {
    r.get("/", index)?
        .get("/{id}", show)?
        .post("/", create)?
        .put("/{id}", update)?
        .delete("/{id}", delete)?;
    Ok(())
}

/// Wires the application.
///
/// CORS runs for everything. Authentication is registered after the auth
/// mount, so login and registration stay public and every later mount is
/// protected.
pub fn build_app(state: &AppState) -> Result<App> {
    let mut app = App::new(registry(state));

    app.middleware(CorsMiddleware::permissive());
    app.mount("/api/v1/auth", auth_routes)?;
    app.middleware(AuthMiddleware::new(state.tokens.clone()));
    app.mount("/api/v1/users", user_routes)?
        .mount("/api/v1/prompts", prompt_routes)?
        .mount("/api/v1/tags", tag_routes)?
        .mount("/api/v1/templates", template_routes)?;

    Ok(app)
}
