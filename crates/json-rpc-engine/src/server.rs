//! Engine entry point: raw body bytes in, status and optional body out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::batch::{BatchExecution, BatchOrchestrator};
use crate::context::RequestContext;
use crate::dispatch::JsonRpcDispatcher;
use crate::registry::{MethodHandler, MethodRegistry};
use crate::request::IncomingMessage;
use crate::response::JsonRpcReply;

/// Written when a reply cannot be serialized, so a caller always gets valid JSON-RPC.
const INTERNAL_ERROR_BODY: &[u8] =
    br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#;

/// Engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Execution strategy for batch elements
    pub batch_execution: BatchExecution,
}

/// What the transport writes back for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP-equivalent status; protocol errors travel in the body, so this is always 200.
    pub status: u16,
    /// `None` when nothing must be written (notifications).
    pub body: Option<Vec<u8>>,
}

impl WireResponse {
    pub const STATUS_OK: u16 = 200;

    fn ok(body: Option<Vec<u8>>) -> Self {
        Self {
            status: Self::STATUS_OK,
            body,
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body_str(&self) -> Option<&str> {
        self.body
            .as_deref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }
}

/// JSON-RPC 2.0 engine bound to a method registry.
#[derive(Debug, Clone)]
pub struct JsonRpcServer {
    dispatcher: JsonRpcDispatcher,
    config: EngineConfig,
}

impl JsonRpcServer {
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: MethodRegistry, config: EngineConfig) -> Self {
        Self {
            dispatcher: JsonRpcDispatcher::new(Arc::new(registry)),
            config,
        }
    }

    pub fn builder() -> JsonRpcServerBuilder {
        JsonRpcServerBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        self.dispatcher.registry()
    }

    /// Process one message body.
    pub async fn handle_bytes(&self, body: &[u8]) -> WireResponse {
        let reply = match IncomingMessage::parse(body) {
            Ok(message) => self.handle_message(message).await,
            Err(err) => {
                debug!("request body is not valid JSON: {}", err);
                Some(JsonRpcReply::parse_error())
            }
        };
        WireResponse::ok(reply.as_ref().map(encode))
    }

    pub async fn handle_str(&self, body: &str) -> WireResponse {
        self.handle_bytes(body.as_bytes()).await
    }

    /// Process an already parsed message. `None` means no body is written.
    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcReply> {
        self.handle_message(IncomingMessage::classify(value)).await
    }

    async fn handle_message(&self, message: IncomingMessage) -> Option<JsonRpcReply> {
        match message {
            IncomingMessage::Single(value) => self
                .dispatcher
                .process(value)
                .await
                .into_message()
                .map(JsonRpcReply::Single),
            IncomingMessage::Batch(items) => {
                BatchOrchestrator::new(self.dispatcher.clone(), self.config.batch_execution)
                    .run(items)
                    .await
            }
        }
    }
}

fn encode(reply: &JsonRpcReply) -> Vec<u8> {
    serde_json::to_vec(reply).unwrap_or_else(|err| {
        error!("failed to serialize JSON-RPC reply: {}", err);
        INTERNAL_ERROR_BODY.to_vec()
    })
}

/// Builder for [`JsonRpcServer`]
#[derive(Debug, Default)]
pub struct JsonRpcServerBuilder {
    registry: MethodRegistry,
    config: EngineConfig,
}

impl JsonRpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing registry
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn method<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.registry.register(method, handler);
        self
    }

    pub fn method_fn<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) + Send + Sync + 'static,
    {
        self.registry.register_fn(method, handler);
        self
    }

    pub fn batch_execution(mut self, execution: BatchExecution) -> Self {
        self.config.batch_execution = execution;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> JsonRpcServer {
        JsonRpcServer::with_config(self.registry, self.config)
    }
}
