//! # JSON-RPC 2.0 Engine
//!
//! A transport-agnostic JSON-RPC 2.0 request engine. It takes the raw body of
//! one incoming message, validates it against the protocol grammar, dispatches
//! each request to a registered handler and assembles the response body, or
//! no body at all for notifications.
//!
//! ## Features
//! - Single requests and batches, with per-element validation
//! - Notification suppression for single requests and batch elements
//! - Handler panics contained and reported as Internal error
//! - Concurrent batch execution with responses kept in input order
//! - Typed positional and named parameter access
//!
//! ```rust
//! use json_rpc_engine::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let server = JsonRpcServer::builder()
//!     .method_fn("subtract", |ctx| {
//!         let params = ctx.params();
//!         let difference = match params.kind() {
//!             ParamsKind::Named => params
//!                 .i64("minuend")
//!                 .and_then(|a| Ok(a - params.i64("subtrahend")?)),
//!             _ => params.i64_at(0).and_then(|a| Ok(a - params.i64_at(1)?)),
//!         };
//!         ctx.set_outcome(difference);
//!     })
//!     .build();
//!
//! let response = server
//!     .handle_str(r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#)
//!     .await;
//! assert_eq!(response.body_str(), Some(r#"{"jsonrpc":"2.0","result":19,"id":1}"#));
//! # });
//! ```

pub mod batch;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;
pub mod types;

pub mod prelude;

// Re-export main types
pub use batch::{BatchExecution, BatchOrchestrator};
pub use context::RequestContext;
pub use dispatch::JsonRpcDispatcher;
pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, ToJsonRpcError};
pub use params::{Params, ParamsError, ParamsKind, RequestParams};
pub use registry::{MethodHandler, MethodRegistry};
pub use request::{IncomingMessage, InvalidRequest, JsonRpcRequest};
pub use response::{JsonRpcMessage, JsonRpcReply, JsonRpcResponse, Outcome};
pub use server::{EngineConfig, JsonRpcServer, JsonRpcServerBuilder, WireResponse};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
