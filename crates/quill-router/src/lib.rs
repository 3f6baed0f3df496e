//! # quill-router
//!
//! A small routing core with prefix mounts and continuation-style
//! middleware.
//!
//! This crate provides:
//! - Path pattern matching with `{name}` parameters
//! - Per-mount route tables matched in registration order
//! - Middleware that continues through a `next` handle or answers early
//! - A handler registry resolving typed handler ids at dispatch time
//! - An [`App`] that walks global middleware and mounts in order
//!
//! ## Quick Start
//!
//! ```ignore
//! use quill_router::{App, CorsMiddleware, HandlerId, HandlerRegistry, Request};
//!
//! const LIST: HandlerId = HandlerId::new("Prompts", "index");
//! const SHOW: HandlerId = HandlerId::new("Prompts", "show");
//!
//! let mut registry = HandlerRegistry::new();
//! registry.bind(LIST, &prompts, PromptController::index);
//! registry.bind(SHOW, &prompts, PromptController::show);
//!
//! let mut app = App::new(registry);
//! app.middleware(CorsMiddleware::permissive());
//! app.mount("/api/v1/prompts", |r| {
//!     r.get("/", LIST)?.get("/{id}", SHOW)?;
//!     Ok(())
//! })?;
//!
//! let response = app.handle(Request::get("/api/v1/prompts/42")).await;
//! ```
//!
//! ## Path Parameters
//!
//! A `{name}` token matches one or more non-slash characters. Parameters
//! are available on the request once the router matched:
//!
//! ```ignore
//! let id: Option<i64> = req.params().parse("id");
//! ```
//!
//! ## Middleware ordering
//!
//! Middleware registered with [`App::middleware`] runs for every mount
//! registered after it, and for none registered before it:
//!
//! ```ignore
//! app.middleware(CorsMiddleware::permissive());   // everything
//! app.mount("/api/v1/auth", auth_routes)?;        // public
//! app.middleware(AuthMiddleware::new(tokens));    // from here on
//! app.mount("/api/v1/prompts", prompt_routes)?;   // protected
//! ```

mod app;
mod error;
mod middleware;
mod path;
mod registry;
mod request;
mod response;
mod router;

pub use app::{App, Mount};
pub use error::{Result, RouterError};
pub use middleware::{
    from_fn, BoxFuture, CorsMiddleware, FnMiddleware, Middleware, MiddlewareChain, Next, Terminal,
};
pub use path::PathPattern;
pub use registry::{
    handler_fn, Action, FnHandler, Handler, HandlerId, HandlerRegistry, MethodHandler,
};
pub use request::{normalize_header_name, Method, PathParams, Principal, Request};
pub use response::Response;
pub use router::{Route, Router};
