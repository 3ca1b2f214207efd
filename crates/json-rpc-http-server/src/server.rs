//! HTTP JSON-RPC server: listener loop and configuration.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use json_rpc_engine::{
    BatchExecution, JsonRpcServer, JsonRpcServerBuilder, MethodHandler, MethodRegistry,
    RequestContext,
};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::handler::JsonRpcHttpHandler;
use crate::{HttpServerError, Result};

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path of the JSON-RPC endpoint
    pub rpc_path: String,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            rpc_path: "/rpc".to_string(),
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        if !self.rpc_path.starts_with('/') {
            return Err(HttpServerError::InvalidConfig(format!(
                "rpc path must start with '/': {}",
                self.rpc_path
            )));
        }
        if self.max_body_size == 0 {
            return Err(HttpServerError::InvalidConfig(
                "max body size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for the HTTP JSON-RPC server
#[derive(Debug, Default)]
pub struct HttpJsonRpcServerBuilder {
    config: ServerConfig,
    engine: JsonRpcServerBuilder,
}

impl HttpJsonRpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Start from an existing method registry
    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.engine = self.engine.registry(registry);
        self
    }

    /// Register a handler for a method
    pub fn method<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.engine = self.engine.method(method, handler);
        self
    }

    /// Register a synchronous closure for a method
    pub fn method_fn<F>(mut self, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut RequestContext) + Send + Sync + 'static,
    {
        self.engine = self.engine.method_fn(method, handler);
        self
    }

    pub fn batch_execution(mut self, execution: BatchExecution) -> Self {
        self.engine = self.engine.batch_execution(execution);
        self
    }

    /// Build the HTTP JSON-RPC server
    pub fn build(self) -> Result<HttpJsonRpcServer> {
        HttpJsonRpcServer::new(self.config, self.engine.build())
    }
}

/// HTTP server exposing one JSON-RPC engine
#[derive(Debug, Clone)]
pub struct HttpJsonRpcServer {
    handler: JsonRpcHttpHandler,
}

impl HttpJsonRpcServer {
    pub fn new(config: ServerConfig, engine: JsonRpcServer) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            handler: JsonRpcHttpHandler::new(config, engine),
        })
    }

    pub fn builder() -> HttpJsonRpcServerBuilder {
        HttpJsonRpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        self.handler.config()
    }

    pub fn handler(&self) -> &JsonRpcHttpHandler {
        &self.handler
    }

    /// Bind the configured address and serve until the process exits
    pub async fn run(&self) -> Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run_with_shutdown<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config().bind_address).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!("JSON-RPC server listening on {}", local_addr);
        info!("JSON-RPC endpoint available at: {}", self.config().rpc_path);
        info!(
            "Registered methods: {:?}",
            self.handler.engine().registry().methods()
        );

        tokio::pin!(shutdown);
        loop {
            let (stream, peer_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                () = &mut shutdown => {
                    info!("Shutting down JSON-RPC server on {}", local_addr);
                    return Ok(());
                }
            };
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req: Request<Incoming>| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler.handle_request(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected (normal): {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}
