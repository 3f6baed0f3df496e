//! Per-mount route table and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error};

use crate::error::Result;
use crate::middleware::{BoxFuture, Middleware, MiddlewareChain, Terminal};
use crate::path::PathPattern;
use crate::registry::{HandlerId, HandlerRegistry};
use crate::request::{Method, PathParams, Request};
use crate::response::Response;

/// A single route definition.
#[derive(Debug, Clone)]
pub struct Route {
    /// HTTP method.
    pub method: Method,
    /// Path pattern, relative to the router's base path.
    pub pattern: PathPattern,
    /// Handler to resolve on a match.
    pub handler: HandlerId,
}

/// The route table of one mounted prefix.
///
/// Routes are kept per method in registration order. Matching walks that
/// order and the first pattern that matches wins, so a literal route such
/// as `/me` only beats `/{id}` when it was registered first.
#[derive(Debug, Default)]
pub struct Router {
    /// Prefix stripped from the request path before matching.
    base_path: String,
    /// Registered routes.
    routes: HashMap<Method, Vec<Route>>,
    /// Router-local middleware, run after a route matched.
    middleware: MiddlewareChain,
}

impl Router {
    /// Creates an empty router for paths under `base_path`.
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
            routes: HashMap::new(),
            middleware: MiddlewareChain::new(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Adds a GET route.
    pub fn get(&mut self, pattern: &str, handler: HandlerId) -> Result<&mut Self> {
        self.route(Method::Get, pattern, handler)
    }

    /// Adds a POST route.
    pub fn post(&mut self, pattern: &str, handler: HandlerId) -> Result<&mut Self> {
        self.route(Method::Post, pattern, handler)
    }

    /// Adds a PUT route.
    pub fn put(&mut self, pattern: &str, handler: HandlerId) -> Result<&mut Self> {
        self.route(Method::Put, pattern, handler)
    }

    /// Adds a PATCH route.
    pub fn patch(&mut self, pattern: &str, handler: HandlerId) -> Result<&mut Self> {
        self.route(Method::Patch, pattern, handler)
    }

    /// Adds a DELETE route.
    pub fn delete(&mut self, pattern: &str, handler: HandlerId) -> Result<&mut Self> {
        self.route(Method::Delete, pattern, handler)
    }

    /// Adds a route with any method.
    ///
    /// Registering the same (method, pattern) again replaces the handler but
    /// keeps the route's original position.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: HandlerId,
    ) -> Result<&mut Self> {
        let compiled = PathPattern::parse(pattern)?;
        let table = self.routes.entry(method).or_default();

        match table.iter_mut().find(|r| r.pattern.pattern() == pattern) {
            Some(existing) => {
                debug!(%method, pattern, %handler, "replacing route handler");
                existing.handler = handler;
            }
            None => table.push(Route {
                method,
                pattern: compiled,
                handler,
            }),
        }

        Ok(self)
    }

    /// Adds router-local middleware.
    pub fn middleware(&mut self, mw: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(mw));
        self
    }

    /// Returns the routes registered for `method`, in matching order.
    pub fn routes(&self, method: Method) -> &[Route] {
        self.routes.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Finds the first route matching `method` and the base-relative `path`.
    pub fn match_route(&self, method: Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes(method)
            .iter()
            .find_map(|route| route.pattern.match_path(path).map(|params| (route, params)))
    }

    fn strip_base<'p>(&self, path: &'p str) -> &'p str {
        path.strip_prefix(self.base_path.as_str()).unwrap_or(path)
    }

    /// Matches the request, resolves the handler and runs it behind the
    /// router-local middleware.
    ///
    /// Answers 404 when nothing matches and 500 when the matched route names
    /// a handler missing from `registry`.
    pub fn dispatch<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        registry: &'a HandlerRegistry,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let method = req.method();
            let matched = self.match_route(method, self.strip_base(req.path()));

            let Some((route, params)) = matched else {
                debug!(%method, path = req.path(), "no route matched");
                return res.emit_json(&json!({ "message": "Route not found" }), 404);
            };
            debug!(%method, path = req.path(), pattern = route.pattern.pattern(), "route matched");
            req.set_params(params);

            let Some(handler) = registry.resolve(&route.handler) else {
                error!(handler = %route.handler, "route points at an unregistered handler");
                return res.emit_json(
                    &json!({ "message": "Controller or method not found" }),
                    500,
                );
            };

            let terminal: Terminal<'a> = Box::new(
                move |req: &'a mut Request, res: &'a mut Response| -> BoxFuture<'a, Result<()>> {
                    Box::pin(async move { handler.call(req, res).await })
                },
            );
            self.middleware.run(req, res, terminal).await
        })
    }
}
