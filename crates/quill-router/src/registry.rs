//! Handler identities and the registry that resolves them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// Identifies a handler as (controller, action).
///
/// Route files refer to handlers through these ids; the concrete handler
/// values are attached once at startup in a [`HandlerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId {
    controller: &'static str,
    action: &'static str,
}

impl HandlerId {
    /// Creates a handler id.
    pub const fn new(controller: &'static str, action: &'static str) -> Self {
        Self { controller, action }
    }

    pub const fn controller(&self) -> &'static str {
        self.controller
    }

    pub const fn action(&self) -> &'static str {
        self.action
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.action)
    }
}

/// The terminal step of a route: reads the request and emits a response.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> BoxFuture<'a, Result<()>>;
}

/// Handler built from a closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        (self.0)(req, res)
    }
}

/// Creates a handler from a closure returning a boxed future.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    FnHandler(f)
}

/// A controller method taking the controller by reference.
pub type Action<C> =
    for<'a> fn(&'a C, &'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<()>>;

/// Handler that calls one method on a shared controller.
pub struct MethodHandler<C> {
    target: Arc<C>,
    action: Action<C>,
}

impl<C> Handler for MethodHandler<C>
where
    C: Send + Sync,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
    ) -> BoxFuture<'a, Result<()>> {
        (self.action)(&*self.target, req, res)
    }
}

/// Maps handler ids to handler values.
///
/// Built once at startup and shared read-only by every router.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for `id`.
    pub fn register(&mut self, id: HandlerId, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.insert(id, Arc::new(handler));
        self
    }

    /// Registers `action` on a shared controller under `id`.
    pub fn bind<C>(&mut self, id: HandlerId, target: &Arc<C>, action: Action<C>) -> &mut Self
    where
        C: Send + Sync + 'static,
    {
        self.register(
            id,
            MethodHandler {
                target: Arc::clone(target),
                action,
            },
        )
    }

    /// Resolves a handler id.
    pub fn resolve(&self, id: &HandlerId) -> Option<Arc<dyn Handler>> {
        self.handlers.get(id).cloned()
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        ids.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &ids)
            .finish()
    }
}
