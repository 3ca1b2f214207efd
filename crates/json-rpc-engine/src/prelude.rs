//! # JSON-RPC Engine Prelude
//!
//! This module provides convenient re-exports of the most commonly used types
//! from the JSON-RPC engine.
//!
//! ```rust
//! use json_rpc_engine::prelude::*;
//! ```

// Core JSON-RPC types
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, ToJsonRpcError};
pub use crate::params::{Params, ParamsError, ParamsKind, RequestParams};
pub use crate::request::JsonRpcRequest;
pub use crate::response::{JsonRpcMessage, JsonRpcReply, JsonRpcResponse};
pub use crate::types::{JsonRpcVersion, RequestId};

// Handlers and the engine
pub use crate::batch::BatchExecution;
pub use crate::context::RequestContext;
pub use crate::registry::{MethodHandler, MethodRegistry};
pub use crate::server::{EngineConfig, JsonRpcServer, WireResponse};

// Standard error codes
pub use crate::error_codes::*;
