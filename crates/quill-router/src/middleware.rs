//! Continuation-style middleware.
//!
//! Every middleware receives the request, the response and a [`Next`]
//! continuation. Calling [`Next::run`] hands control to the following
//! entry, or to the terminal step once the chain is exhausted. Returning
//! without calling it short-circuits everything downstream.

use std::fmt;
use std::sync::Arc;

pub use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::error::Result;
use crate::request::{Method, Request};
use crate::response::Response;

/// The step that runs once every middleware has continued.
pub type Terminal<'a> =
    Box<dyn FnOnce(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<()>> + Send + 'a>;

/// Trait for middleware participating in a chain.
///
/// # Example
///
/// ```
/// use quill_router::{BoxFuture, Middleware, Next, Request, Response, Result};
///
/// struct PoweredBy;
///
/// impl Middleware for PoweredBy {
///     fn handle<'a>(
///         &'a self,
///         req: &'a mut Request,
///         res: &'a mut Response,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, Result<()>> {
///         res.set_header("X-Powered-By", "quill");
///         next.run(req, res)
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Processes the request, continuing through `next` or emitting a
    /// response and returning.
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>>;
}

/// The continuation handed to each middleware.
///
/// Holds the position of the following entry. It is consumed by
/// [`Next::run`], so an entry can continue at most once.
pub struct Next<'a> {
    entries: &'a [Arc<dyn Middleware>],
    cursor: usize,
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    /// Advances to the following entry, or the terminal step.
    ///
    /// Does nothing once the response has been emitted.
    pub fn run(self, req: &'a mut Request, res: &'a mut Response) -> BoxFuture<'a, Result<()>> {
        if res.is_sent() {
            debug!(cursor = self.cursor, "response already emitted, chain stops");
            return futures::future::ready(Ok(())).boxed();
        }

        match self.entries.get(self.cursor) {
            Some(entry) => {
                let next = Next {
                    entries: self.entries,
                    cursor: self.cursor + 1,
                    terminal: self.terminal,
                };
                entry.handle(req, res, next)
            }
            None => (self.terminal)(req, res),
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("cursor", &self.cursor)
            .field("remaining", &self.entries.len().saturating_sub(self.cursor))
            .finish_non_exhaustive()
    }
}

/// An ordered list of middleware.
///
/// The list itself is shared configuration; the position within it lives in
/// the [`Next`] values created by [`MiddlewareChain::run`], so concurrent
/// requests never share a cursor.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the end of the chain.
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.entries.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the chain from its first entry, finishing with `terminal`.
    pub fn run<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        terminal: Terminal<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        Next {
            entries: &self.entries,
            cursor: 0,
            terminal,
        }
        .run(req, res)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Middleware built from a closure. See [`from_fn`].
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
{
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        (self.0)(req, res, next)
    }
}

/// Creates middleware from a closure returning a boxed future.
///
/// ```
/// use quill_router::from_fn;
///
/// let tag = from_fn(|req, res, next| {
///     Box::pin(async move {
///         res.set_header("X-Tag", "1");
///         next.run(req, res).await
///     })
/// });
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync,
{
    FnMiddleware(f)
}

/// Middleware that adds CORS headers and answers preflight requests.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            allowed_headers: ["Origin", "Content-Type", "Accept", "Authorization"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Creates CORS middleware with specific origins.
    pub fn new(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|s| (*s).to_string()).collect(),
            ..Self::permissive()
        }
    }
}

impl Middleware for CorsMiddleware {
    fn handle<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<()>> {
        res.set_header(
            "Access-Control-Allow-Origin",
            self.allowed_origins.join(", "),
        );
        res.set_header(
            "Access-Control-Allow-Methods",
            self.allowed_methods.join(", "),
        );
        res.set_header(
            "Access-Control-Allow-Headers",
            self.allowed_headers.join(", "),
        );

        // Preflight ends here.
        if req.method() == Method::Options {
            res.emit_raw(Vec::new(), 204);
            return futures::future::ready(Ok(())).boxed();
        }

        next.run(req, res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        Arc::new(from_fn(move |req, res, next| {
            log.lock().unwrap().push(name.to_string());
            Box::pin(async move { next.run(req, res).await })
        }))
    }

    fn terminal<'a>(log: Arc<Mutex<Vec<String>>>) -> Terminal<'a> {
        Box::new(move |_req, res| {
            log.lock().unwrap().push("terminal".to_string());
            Box::pin(async move { res.emit_json(&serde_json::json!({"ok": true}), 200) })
        })
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recorder(&log, "a"));
        chain.push(recorder(&log, "b"));

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), ["a", "b", "terminal"]);
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_empty_chain_runs_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new();

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), ["terminal"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(recorder(&log, "a"));
        chain.push(Arc::new(from_fn(|_req, res, _next| {
            Box::pin(async move { res.emit_json(&serde_json::json!({"message": "no"}), 401) })
        })));
        chain.push(recorder(&log, "c"));

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), ["a"]);
        assert_eq!(res.status(), 401);
    }

    #[tokio::test]
    async fn test_emit_then_continue_does_not_advance() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(from_fn(|req, res, next| {
            Box::pin(async move {
                res.emit_raw("early", 202);
                next.run(req, res).await
            })
        })));
        chain.push(recorder(&log, "b"));

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(res.status(), 202);
    }

    #[tokio::test]
    async fn test_request_mutation_is_visible_downstream() {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(from_fn(|req, res, next| {
            let mut principal = crate::request::Principal::new();
            principal.insert("userId".to_string(), serde_json::json!(7));
            req.set_principal(principal);
            next.run(req, res)
        })));

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(
                &mut req,
                &mut res,
                Box::new(|req, res| {
                    Box::pin(async move {
                        let id = req.principal().get("userId").cloned();
                        res.emit_json(&serde_json::json!({ "id": id }), 200)
                    })
                }),
            )
            .await
            .unwrap();

        assert_eq!(res.body_json().unwrap()["id"], 7);
    }

    #[tokio::test]
    async fn test_cors_headers_and_preflight() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(CorsMiddleware::permissive()));

        let mut req = Request::options("/api/v1/prompts");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(res.status(), 204);
        assert!(res.body().is_empty());
        assert_eq!(res.get_header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            res.get_header("Access-Control-Allow-Methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(
            res.get_header("Access-Control-Allow-Headers"),
            Some("Origin, Content-Type, Accept, Authorization")
        );
    }

    #[tokio::test]
    async fn test_cors_passes_other_methods_through() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(CorsMiddleware::new(&["https://app.example"])));

        let mut req = Request::get("/");
        let mut res = Response::new();
        chain
            .run(&mut req, &mut res, terminal(Arc::clone(&log)))
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), ["terminal"]);
        assert_eq!(
            res.get_header("Access-Control-Allow-Origin"),
            Some("https://app.example")
        );
    }
}
