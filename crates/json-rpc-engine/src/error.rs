use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

use crate::error_codes;
use crate::types::{JsonRpcVersion, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError(i64), // -32099 to -32000
    Application(i64),
}

impl JsonRpcErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            error_codes::PARSE_ERROR => JsonRpcErrorCode::ParseError,
            error_codes::INVALID_REQUEST => JsonRpcErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => JsonRpcErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => JsonRpcErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => JsonRpcErrorCode::InternalError,
            error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END => {
                JsonRpcErrorCode::ServerError(code)
            }
            _ => JsonRpcErrorCode::Application(code),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError(code) | JsonRpcErrorCode::Application(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError(_) => "Server error",
            JsonRpcErrorCode::Application(_) => "Application error",
        }
    }

    /// Codes whose meaning is fixed by the protocol.
    pub fn is_reserved(&self) -> bool {
        !matches!(self, JsonRpcErrorCode::Application(_))
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error() -> Self {
        JsonRpcErrorCode::ParseError.into()
    }

    pub fn invalid_request() -> Self {
        JsonRpcErrorCode::InvalidRequest.into()
    }

    pub fn method_not_found() -> Self {
        JsonRpcErrorCode::MethodNotFound.into()
    }

    pub fn invalid_params() -> Self {
        JsonRpcErrorCode::InvalidParams.into()
    }

    pub fn internal_error() -> Self {
        JsonRpcErrorCode::InternalError.into()
    }

    /// Implementation-defined server error. Codes are expected in
    /// `-32099..=-32000`; anything else is still sent, but flagged in debug builds.
    pub fn server_error(code: i64) -> Self {
        debug_assert!(
            (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&code),
            "Server error code must be in range -32099 to -32000"
        );
        Self::new(JsonRpcErrorCode::ServerError(code), None, None)
    }

    /// Application-defined error with a caller chosen code and message.
    pub fn application(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach diagnostic `data`. Values that cannot be represented as JSON are dropped.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(err) => warn!(code = self.code, "dropping unserializable error data: {}", err),
        }
        self
    }

    pub fn error_code(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from_code(self.code)
    }
}

impl From<JsonRpcErrorCode> for JsonRpcErrorObject {
    fn from(code: JsonRpcErrorCode) -> Self {
        Self::new(code, None, None)
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorObject {}

/// Trait for errors that can be converted to JSON-RPC error objects
pub trait ToJsonRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this error to a JSON-RPC error object
    fn to_error_object(&self) -> JsonRpcErrorObject;
}

/// JSON-RPC Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    pub id: RequestId,
}

impl JsonRpcError {
    pub fn new(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error,
            id,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorObject::parse_error())
    }

    pub fn invalid_request() -> Self {
        Self::new(RequestId::Null, JsonRpcErrorObject::invalid_request())
    }

    pub fn method_not_found(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::method_not_found())
    }

    pub fn internal_error(id: RequestId) -> Self {
        Self::new(id, JsonRpcErrorObject::internal_error())
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id: {})", self.error, self.id)
    }
}

impl std::error::Error for JsonRpcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(JsonRpcErrorCode::ParseError.code(), -32700);
        assert_eq!(JsonRpcErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(JsonRpcErrorCode::from_code(-32602), JsonRpcErrorCode::InvalidParams);
        assert_eq!(JsonRpcErrorCode::from_code(-32042), JsonRpcErrorCode::ServerError(-32042));
        assert_eq!(JsonRpcErrorCode::from_code(42), JsonRpcErrorCode::Application(42));
        assert!(JsonRpcErrorCode::ServerError(-32000).is_reserved());
        assert!(!JsonRpcErrorCode::Application(-1).is_reserved());
    }

    #[test]
    fn test_canonical_messages() {
        let error = JsonRpcError::method_not_found(RequestId::from("1"));
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found"}, "id": "1"})
        );
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let error = JsonRpcError::parse_error();
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})
        );
    }

    #[test]
    fn test_server_error_with_data() {
        let error = JsonRpcErrorObject::server_error(-32042).with_data("something went wrong");
        assert_eq!(error.code, -32042);
        assert_eq!(error.message, "Server error");
        assert_eq!(error.data, Some(json!("something went wrong")));
    }

    #[test]
    fn test_application_error_keeps_code() {
        let error = JsonRpcErrorObject::application(1001, "Insufficient funds")
            .with_data(json!({"balance": 3}));
        assert_eq!(error.error_code(), JsonRpcErrorCode::Application(1001));
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"code": 1001, "message": "Insufficient funds", "data": {"balance": 3}})
        );
    }
}
