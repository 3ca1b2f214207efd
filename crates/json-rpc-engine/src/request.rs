use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::params::RequestParams;
use crate::types::{JsonRpcVersion, RequestId};

/// Why a value was rejected as an Invalid Request.
///
/// Only used for diagnostics; on the wire every variant becomes the same
/// `-32600` error with a `null` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("request is not a JSON object")]
    NotAnObject,

    #[error("jsonrpc member is missing or not \"2.0\"")]
    Version,

    #[error("method member is missing or not a string")]
    Method,

    #[error("params member must be an array or an object")]
    Params,

    #[error("id member must be a string, a number or null")]
    Id,
}

/// A validated JSON-RPC request. `id: None` marks a notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params: None,
            id: Some(id.into()),
        }
    }

    /// Create a request without an id
    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params: None,
            id: None,
        }
    }

    pub fn with_params(mut self, params: impl Into<RequestParams>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate a parsed value against the request grammar.
    ///
    /// Checks run in order: object, `jsonrpc`, `method`, `params`, `id`.
    /// Unknown members are ignored and method existence is not checked here.
    pub fn from_value(value: Value) -> Result<Self, InvalidRequest> {
        let Value::Object(mut object) = value else {
            return Err(InvalidRequest::NotAnObject);
        };

        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == crate::JSONRPC_VERSION => {}
            _ => return Err(InvalidRequest::Version),
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(InvalidRequest::Method),
        };

        let params = match object.remove("params") {
            Some(value) => Some(RequestParams::from_value(value).ok_or(InvalidRequest::Params)?),
            None => None,
        };

        let id = match object.remove("id") {
            Some(value) => Some(RequestId::from_value(value).ok_or(InvalidRequest::Id)?),
            None => None,
        };

        Ok(Self {
            version: JsonRpcVersion::V2_0,
            method,
            params,
            id,
        })
    }
}

impl TryFrom<Value> for JsonRpcRequest {
    type Error = InvalidRequest;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Top-level shape of a parsed message body.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Anything that is not an array, validated as one request.
    Single(Value),
    /// An array; every element is validated independently.
    Batch(Vec<Value>),
}

impl IncomingMessage {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => IncomingMessage::Batch(items),
            other => IncomingMessage::Single(other),
        }
    }

    /// Parse raw bytes; failure here is a protocol Parse error.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<Value>(bytes).map(Self::classify)
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, IncomingMessage::Batch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn test_valid_request() {
        let request = JsonRpcRequest::from_value(
            json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1}),
        )
        .unwrap();

        assert_eq!(request.method, "subtract");
        assert_eq!(request.id, Some(RequestId::from(1i64)));
        assert_eq!(request.params, Some(RequestParams::Array(vec![json!(42), json!(23)])));
        assert!(!request.is_notification());
    }

    #[test]
    fn test_notification_and_null_id_differ() {
        let notification =
            JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "update"})).unwrap();
        assert!(notification.is_notification());

        let null_id =
            JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "update", "id": null}))
                .unwrap();
        assert!(!null_id.is_notification());
        assert_eq!(null_id.id, Some(RequestId::Null));
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (json!(1), InvalidRequest::NotAnObject),
            (json!("x"), InvalidRequest::NotAnObject),
            (json!({"foo": "boo"}), InvalidRequest::Version),
            (json!({"jsonrpc": "1.0", "method": "a"}), InvalidRequest::Version),
            (json!({"jsonrpc": 2.0, "method": "a"}), InvalidRequest::Version),
            (json!({"jsonrpc": "2.0"}), InvalidRequest::Method),
            (json!({"jsonrpc": "2.0", "method": 1, "params": "bar"}), InvalidRequest::Method),
            (json!({"jsonrpc": "2.0", "method": "a", "params": "bar"}), InvalidRequest::Params),
            (json!({"jsonrpc": "2.0", "method": "a", "params": null}), InvalidRequest::Params),
            (json!({"jsonrpc": "2.0", "method": "a", "id": {}}), InvalidRequest::Id),
            (json!({"jsonrpc": "2.0", "method": "a", "id": [1]}), InvalidRequest::Id),
            (json!({"jsonrpc": "2.0", "method": "a", "id": false}), InvalidRequest::Id),
        ];

        for (value, expected) in cases {
            assert_eq!(
                JsonRpcRequest::from_value(value.clone()),
                Err(expected),
                "value: {}",
                value
            );
        }
    }

    #[test]
    fn test_extra_members_are_ignored() {
        let request = JsonRpcRequest::from_value(
            json!({"jsonrpc": "2.0", "method": "a", "id": "x", "extra": true}),
        );
        assert!(request.is_ok());
    }

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest::new(1i64, "sum").with_params(vec![json!(1), json!(2)]);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "sum", "params": [1, 2], "id": 1})
        );

        let notification = JsonRpcRequest::notification("ping");
        assert_eq!(
            to_value(&notification).unwrap(),
            json!({"jsonrpc": "2.0", "method": "ping"})
        );
    }

    #[test]
    fn test_classify() {
        assert!(IncomingMessage::classify(json!([])).is_batch());
        assert!(!IncomingMessage::classify(json!({})).is_batch());
        assert!(IncomingMessage::parse(br#"{"jsonrpc": "2.0", "method""#).is_err());
        assert_eq!(
            IncomingMessage::parse(b" [1, 2] ").unwrap(),
            IncomingMessage::Batch(vec![json!(1), json!(2)])
        );
    }
}
