use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{Instrument, debug, debug_span, warn};

use crate::context::RequestContext;
use crate::error::JsonRpcErrorObject;
use crate::registry::MethodRegistry;
use crate::request::JsonRpcRequest;
use crate::response::Outcome;
use crate::types::RequestId;

/// Resolves validated requests against a [`MethodRegistry`] and runs their handlers.
///
/// Cloning is cheap: the registry sits behind an `Arc` and is never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct JsonRpcDispatcher {
    registry: Arc<MethodRegistry>,
}

impl JsonRpcDispatcher {
    pub fn new(registry: impl Into<Arc<MethodRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Validate one raw request value and dispatch it if well-formed.
    pub async fn process(&self, value: Value) -> Outcome {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.dispatch(request).await,
            Err(reason) => {
                debug!(%reason, "rejecting invalid request");
                Outcome::invalid_request()
            }
        }
    }

    /// Run the handler for a validated request.
    ///
    /// Handler panics and handlers that return without a result or an error
    /// both become Internal error. The outcome is suppressed iff the request
    /// is a notification, whatever the handler did.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Outcome {
        let span = debug_span!("dispatch", method = %request.method, id = ?request.id);
        self.dispatch_inner(request).instrument(span).await
    }

    async fn dispatch_inner(&self, request: JsonRpcRequest) -> Outcome {
        let suppressed = request.is_notification();
        let id = request.id.clone().unwrap_or(RequestId::Null);

        let Some(handler) = self.registry.resolve(&request.method) else {
            debug!("method not found");
            return Outcome::failure(id, JsonRpcErrorObject::method_not_found())
                .suppressed(suppressed);
        };

        let mut ctx = RequestContext::new(request);
        let invocation = AssertUnwindSafe(handler.handle(&mut ctx))
            .catch_unwind()
            .await;

        let body = match invocation {
            Ok(()) => ctx.take_outcome().unwrap_or_else(|| {
                warn!("handler returned without a result or an error");
                Err(JsonRpcErrorObject::internal_error())
            }),
            Err(panic) => {
                warn!(reason = %panic_message(panic.as_ref()), "handler panicked");
                Err(JsonRpcErrorObject::internal_error())
            }
        };

        Outcome { id, body, suppressed }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
