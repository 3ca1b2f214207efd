use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::{JsonRpcError, JsonRpcErrorObject};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }
}

/// Union type that represents either a successful response or an error response
/// This ensures JSON-RPC 2.0 compliance by keeping success and error responses separate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Error response with error field
    Error(JsonRpcError),
    /// Successful response with result field
    Response(JsonRpcResponse),
}

impl JsonRpcMessage {
    /// Create a success message
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(JsonRpcResponse::new(id, result))
    }

    /// Create an error message
    pub fn error(error: JsonRpcError) -> Self {
        Self::Error(error)
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    pub fn id(&self) -> &RequestId {
        match self {
            JsonRpcMessage::Response(resp) => &resp.id,
            JsonRpcMessage::Error(err) => &err.id,
        }
    }
}

/// Decoded by the presence of `error`, so a missing `result` never turns an
/// error object into a success.
impl<'de> Deserialize<'de> for JsonRpcMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let message = if value.get("error").is_some() {
            serde_json::from_value(value).map(JsonRpcMessage::Error)
        } else {
            serde_json::from_value(value).map(JsonRpcMessage::Response)
        };
        message.map_err(de::Error::custom)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Everything written back for one incoming message: one response object, or
/// an array of them for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Single(JsonRpcMessage),
    Batch(Vec<JsonRpcMessage>),
}

impl<'de> Deserialize<'de> for JsonRpcReply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let reply = match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map(JsonRpcReply::Batch),
            other => serde_json::from_value(other).map(JsonRpcReply::Single),
        };
        reply.map_err(de::Error::custom)
    }
}

impl JsonRpcReply {
    pub fn parse_error() -> Self {
        JsonRpcReply::Single(JsonRpcError::parse_error().into())
    }

    pub fn invalid_request() -> Self {
        JsonRpcReply::Single(JsonRpcError::invalid_request().into())
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, JsonRpcReply::Batch(_))
    }

    /// Response objects in wire order.
    pub fn messages(&self) -> &[JsonRpcMessage] {
        match self {
            JsonRpcReply::Single(message) => std::slice::from_ref(message),
            JsonRpcReply::Batch(messages) => messages,
        }
    }
}

/// Result of processing one request or invalid entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: RequestId,
    pub body: Result<Value, JsonRpcErrorObject>,
    /// Set only for well-formed notifications; never written to the wire.
    pub suppressed: bool,
}

impl Outcome {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            body: Ok(result),
            suppressed: false,
        }
    }

    pub fn failure(id: RequestId, error: JsonRpcErrorObject) -> Self {
        Self {
            id,
            body: Err(error),
            suppressed: false,
        }
    }

    pub fn invalid_request() -> Self {
        Self::failure(RequestId::Null, JsonRpcErrorObject::invalid_request())
    }

    pub fn internal_error(id: RequestId) -> Self {
        Self::failure(id, JsonRpcErrorObject::internal_error())
    }

    pub fn suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }

    pub fn is_error(&self) -> bool {
        self.body.is_err()
    }

    /// The wire response, or `None` for a suppressed notification.
    pub fn into_message(self) -> Option<JsonRpcMessage> {
        if self.suppressed {
            return None;
        }
        Some(match self.body {
            Ok(result) => JsonRpcMessage::success(self.id, result),
            Err(error) => JsonRpcMessage::error(JsonRpcError::new(self.id, error)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json, to_value};

    #[test]
    fn test_response_serialization() {
        let message = JsonRpcMessage::success(RequestId::from(1i64), json!(19));
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"jsonrpc": "2.0", "result": 19, "id": 1})
        );
    }

    #[test]
    fn test_null_result_is_kept() {
        let message = JsonRpcMessage::success(RequestId::from("a"), Value::Null);
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"jsonrpc": "2.0", "result": null, "id": "a"})
        );
    }

    #[test]
    fn test_messages_round_trip_keep_their_kind() {
        let error: JsonRpcMessage = from_value(
            json!({"jsonrpc": "2.0", "error": {"code": -32601, "message": "Method not found"}, "id": "1"}),
        )
        .unwrap();
        assert!(error.is_error());
        assert_eq!(error.id(), &RequestId::from("1"));

        let success: JsonRpcMessage =
            from_value(json!({"jsonrpc": "2.0", "result": [1], "id": 2})).unwrap();
        assert!(!success.is_error());
    }

    #[test]
    fn test_reply_decodes_large_ids() {
        let raw = r#"[{"jsonrpc":"2.0","result":1,"id":123456789012345678901234567890},{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":1e+2}]"#;
        let reply: JsonRpcReply = serde_json::from_str(raw).unwrap();
        assert!(reply.is_batch());
        assert!(reply.messages()[1].is_error());
        assert_eq!(serde_json::to_string(&reply).unwrap(), raw);
    }

    #[test]
    fn test_suppressed_outcome_has_no_message() {
        let outcome = Outcome::success(RequestId::Null, json!(1)).suppressed(true);
        assert_eq!(outcome.into_message(), None);

        let error = Outcome::failure(RequestId::Null, JsonRpcErrorObject::internal_error())
            .suppressed(true);
        assert_eq!(error.into_message(), None);
    }

    #[test]
    fn test_reply_framing() {
        let single = JsonRpcReply::invalid_request();
        assert_eq!(
            to_value(&single).unwrap(),
            json!({"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid Request"}, "id": null})
        );

        let batch = JsonRpcReply::Batch(vec![
            JsonRpcMessage::success(RequestId::from("1"), json!(7)),
            JsonRpcError::invalid_request().into(),
        ]);
        assert!(batch.is_batch());
        assert_eq!(batch.messages().len(), 2);
        assert_eq!(
            to_value(&batch).unwrap(),
            json!([
                {"jsonrpc": "2.0", "result": 7, "id": "1"},
                {"jsonrpc": "2.0", "error": {"code": -32600, "message": "Invalid Request"}, "id": null}
            ])
        );
    }
}
