//! Top-level dispatcher over global middleware and mounted routers.

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::middleware::{BoxFuture, Middleware, MiddlewareChain, Terminal};
use crate::registry::HandlerRegistry;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// A router mounted under a path prefix.
#[derive(Debug)]
pub struct Mount {
    prefix: String,
    router: Router,
}

impl Mount {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// True for the prefix itself or the prefix followed by `/` and anything.
    fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

enum Entry {
    Middleware(Arc<dyn Middleware>),
    Mount(Mount),
}

/// The application: an ordered list of global middleware and mounts.
///
/// A request walks the list in registration order, collecting every
/// middleware it passes. The first mount whose prefix matches runs the
/// collected middleware and then its router; later entries are never looked
/// at. Middleware registered after a mount therefore does not run for it,
/// which is how authentication covers only the mounts that follow it.
///
/// # Example
///
/// ```
/// use quill_router::{handler_fn, App, CorsMiddleware, HandlerId, HandlerRegistry, Request};
///
/// const PING: HandlerId = HandlerId::new("Health", "ping");
///
/// let mut registry = HandlerRegistry::new();
/// registry.register(
///     PING,
///     handler_fn(|_req, res| {
///         Box::pin(async move { res.emit_json(&serde_json::json!({"ok": true}), 200) })
///     }),
/// );
///
/// let mut app = App::new(registry);
/// app.middleware(CorsMiddleware::permissive());
/// app.mount("/health", |r| {
///     r.get("/", PING)?;
///     Ok(())
/// })
/// .unwrap();
///
/// let res = futures::executor::block_on(app.handle(Request::get("/health")));
/// assert_eq!(res.status(), 200);
/// ```
pub struct App {
    entries: Vec<Entry>,
    registry: Arc<HandlerRegistry>,
}

impl App {
    /// Creates an application resolving handlers through `registry`.
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            entries: Vec::new(),
            registry: Arc::new(registry),
        }
    }

    /// Appends a global middleware.
    pub fn middleware(&mut self, mw: impl Middleware + 'static) -> &mut Self {
        self.entries.push(Entry::Middleware(Arc::new(mw)));
        self
    }

    /// Appends a mount, letting `routes` fill in its router.
    pub fn mount<F>(&mut self, prefix: &str, routes: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Router) -> Result<()>,
    {
        let mut router = Router::new(prefix);
        routes(&mut router)?;
        debug!(prefix, "mounted router");
        self.entries.push(Entry::Mount(Mount {
            prefix: prefix.to_string(),
            router,
        }));
        Ok(self)
    }

    /// Returns the mounts in registration order.
    pub fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Mount(mount) => Some(mount),
            Entry::Middleware(_) => None,
        })
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Handles one request and returns the emitted response.
    ///
    /// Errors from middleware or handlers are logged and answered with a
    /// 500 unless a response was already emitted. A chain that finishes
    /// without emitting is answered with a 500 as well.
    pub async fn handle(&self, mut req: Request) -> Response {
        let mut res = Response::new();
        let mut chain = MiddlewareChain::new();
        let mut selected = None;

        for entry in &self.entries {
            match entry {
                Entry::Middleware(mw) => chain.push(Arc::clone(mw)),
                Entry::Mount(mount) if mount.matches(req.path()) => {
                    selected = Some(mount);
                    break;
                }
                Entry::Mount(_) => {}
            }
        }

        let Some(mount) = selected else {
            debug!(method = %req.method(), path = req.path(), "no mount matched");
            emit_message(&mut res, 404, "Not Found");
            return res;
        };

        debug!(
            method = %req.method(),
            path = req.path(),
            prefix = mount.prefix(),
            middleware = chain.len(),
            "dispatching"
        );

        let outcome = run_mount(&chain, mount, &self.registry, &mut req, &mut res).await;
        if let Err(err) = outcome {
            error!(method = %req.method(), path = req.path(), error = %err, "request failed");
            if !res.is_sent() {
                emit_message(&mut res, 500, "Internal Server Error");
            }
        } else if !res.is_sent() {
            warn!(method = %req.method(), path = req.path(), "chain finished without a response");
            emit_message(&mut res, 500, "Internal Server Error");
        }

        res
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Middleware(_) => "middleware".to_string(),
                Entry::Mount(mount) => format!("mount {}", mount.prefix),
            })
            .collect();
        f.debug_struct("App")
            .field("entries", &entries)
            .field("registry", &self.registry)
            .finish()
    }
}

fn run_mount<'a>(
    chain: &'a MiddlewareChain,
    mount: &'a Mount,
    registry: &'a HandlerRegistry,
    req: &'a mut Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<()>> {
    let terminal: Terminal<'a> = Box::new(
        move |req: &'a mut Request, res: &'a mut Response| -> BoxFuture<'a, Result<()>> {
            mount.router.dispatch(req, res, registry)
        },
    );
    chain.run(req, res, terminal)
}

fn emit_message(res: &mut Response, status: u16, message: &str) {
    if let Err(err) = res.emit_json(&json!({ "message": message }), status) {
        error!(error = %err, status, "failed to emit response");
    }
}
