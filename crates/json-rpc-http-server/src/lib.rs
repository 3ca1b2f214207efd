//! # HTTP JSON-RPC Server
//!
//! HTTP/1.1 transport for a [`json_rpc_engine::JsonRpcServer`]. One POST
//! endpoint receives a JSON-RPC message (single or batch) and writes back
//! whatever the engine produced.
//!
//! ## Features
//! - Protocol errors are reported in the JSON-RPC body with HTTP 200
//! - Empty 200 response when only notifications were received
//! - Request body size limit (413 when exceeded)
//! - CORS support for browser-based clients
//! - Graceful shutdown through a caller supplied future

pub mod cors;
pub mod handler;
pub mod server;

#[cfg(test)]
mod tests;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::JsonRpcHttpHandler;
pub use server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder, ServerConfig};

// Re-export the engine so servers only need one dependency
pub use json_rpc_engine;

/// Result type for HTTP server operations
pub type Result<T> = std::result::Result<T, HttpServerError>;

/// HTTP server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
