use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{JsonRpcErrorObject, ToJsonRpcError};
use crate::params::Params;
use crate::request::JsonRpcRequest;
use crate::types::RequestId;

/// Per-request state handed to a method handler.
///
/// A handler must leave exactly one of a result or an error in the context.
/// Calling the setters more than once keeps the last value.
#[derive(Debug)]
pub struct RequestContext {
    id: Option<RequestId>,
    method: String,
    params: Params,
    outcome: Option<Result<Value, JsonRpcErrorObject>>,
}

impl RequestContext {
    pub fn new(request: JsonRpcRequest) -> Self {
        Self {
            id: request.id,
            method: request.method,
            params: Params::new(request.params),
            outcome: None,
        }
    }

    /// `None` for notifications.
    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn set_result<T: Serialize>(&mut self, result: T) {
        self.outcome = Some(match serde_json::to_value(result) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(method = %self.method, "handler result is not serializable: {}", err);
                Err(JsonRpcErrorObject::internal_error())
            }
        });
    }

    pub fn set_result_value(&mut self, result: Value) {
        self.outcome = Some(Ok(result));
    }

    pub fn set_error(&mut self, error: impl Into<JsonRpcErrorObject>) {
        self.outcome = Some(Err(error.into()));
    }

    /// Record a domain error through its JSON-RPC mapping.
    pub fn set_domain_error<E: ToJsonRpcError>(&mut self, error: &E) {
        self.outcome = Some(Err(error.to_error_object()));
    }

    /// Store whichever side of `outcome` the handler produced.
    pub fn set_outcome<T, E>(&mut self, outcome: Result<T, E>)
    where
        T: Serialize,
        E: Into<JsonRpcErrorObject>,
    {
        match outcome {
            Ok(result) => self.set_result(result),
            Err(error) => self.set_error(error),
        }
    }

    pub fn has_outcome(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn take_outcome(&mut self) -> Option<Result<Value, JsonRpcErrorObject>> {
        self.outcome.take()
    }
}
