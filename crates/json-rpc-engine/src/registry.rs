use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::context::RequestContext;

/// Trait for handling a JSON-RPC method call.
///
/// The handler reads the request through the context and records exactly one
/// of a result or an error on it before returning.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext);
}

/// Plain synchronous closures are handlers.
#[async_trait]
impl<F> MethodHandler for F
where
    F: Fn(&mut RequestContext) + Send + Sync,
{
    async fn handle(&self, ctx: &mut RequestContext) {
        (self)(ctx)
    }
}

/// Method name to handler mapping.
///
/// Built during setup, then shared read-only by the engine. Registering a
/// name twice replaces the earlier handler.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a specific method, returning the one it replaced.
    pub fn register<H>(
        &mut self,
        method: impl Into<String>,
        handler: H,
    ) -> Option<Arc<dyn MethodHandler>>
    where
        H: MethodHandler + 'static,
    {
        self.register_shared(method, Arc::new(handler))
    }

    /// Register a synchronous closure. Unlike [`register`](Self::register)
    /// this lets the compiler infer the closure's argument type.
    pub fn register_fn<F>(
        &mut self,
        method: impl Into<String>,
        handler: F,
    ) -> Option<Arc<dyn MethodHandler>>
    where
        F: Fn(&mut RequestContext) + Send + Sync + 'static,
    {
        self.register(method, handler)
    }

    pub fn register_shared(
        &mut self,
        method: impl Into<String>,
        handler: Arc<dyn MethodHandler>,
    ) -> Option<Arc<dyn MethodHandler>> {
        let method = method.into();
        let previous = self.handlers.insert(method.clone(), handler);
        if previous.is_some() {
            warn!(method = %method, "replacing previously registered handler");
        }
        previous
    }

    /// Register one handler for multiple methods
    pub fn register_methods<H, I, S>(&mut self, methods: I, handler: H)
    where
        H: MethodHandler + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handler: Arc<dyn MethodHandler> = Arc::new(handler);
        for method in methods {
            self.register_shared(method, Arc::clone(&handler));
        }
    }

    pub fn with_method<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.register(method, handler);
        self
    }

    pub fn with_fn<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) + Send + Sync + 'static,
    {
        self.register_fn(method, handler);
        self
    }

    pub fn resolve(&self, method: &str) -> Option<Arc<dyn MethodHandler>> {
        self.handlers.get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.keys().cloned().collect();
        methods.sort();
        methods
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
