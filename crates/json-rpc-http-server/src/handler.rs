//! HTTP request handler for the JSON-RPC endpoint

use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use json_rpc_engine::JsonRpcServer;
use tracing::{debug, error, warn};

use crate::cors::CorsLayer;
use crate::server::ServerConfig;

const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Routes HTTP requests into the JSON-RPC engine.
///
/// Every engine outcome, protocol errors included, is answered with 200.
/// Other statuses only come from transport checks made before the engine runs.
#[derive(Debug, Clone)]
pub struct JsonRpcHttpHandler {
    config: Arc<ServerConfig>,
    engine: JsonRpcServer,
}

impl JsonRpcHttpHandler {
    pub fn new(config: ServerConfig, engine: JsonRpcServer) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn engine(&self) -> &JsonRpcServer {
        &self.engine
    }

    /// Handle one HTTP request
    pub async fn handle_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        debug!("Handling {} {}", req.method(), req.uri().path());

        let mut response = if req.uri().path() != self.config.rpc_path {
            plain_response(StatusCode::NOT_FOUND, "Not Found")
        } else {
            match *req.method() {
                Method::POST => self.handle_json_rpc_request(req).await,
                Method::OPTIONS => preflight_response(),
                _ => method_not_allowed(),
            }
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    /// Handle JSON-RPC requests over HTTP POST
    async fn handle_json_rpc_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let body = Limited::new(req.into_body(), self.config.max_body_size);
        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(
                    "Request body too large: limit is {} bytes",
                    self.config.max_body_size
                );
                return plain_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return plain_response(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        let wire = self.engine.handle_bytes(&body_bytes).await;
        let status = StatusCode::from_u16(wire.status).unwrap_or(StatusCode::OK);

        match wire.body {
            Some(body) => {
                debug!(bytes = body.len(), "Sending JSON-RPC response");
                let mut response = response(status, Bytes::from(body));
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                response
            }
            None => {
                debug!("Nothing to send for notification");
                response(status, Bytes::new())
            }
        }
    }
}

fn response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

fn plain_response(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    let mut response = response(status, Bytes::from_static(message.as_bytes()));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Handle OPTIONS preflight requests
fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = response(StatusCode::OK, Bytes::new());
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}
