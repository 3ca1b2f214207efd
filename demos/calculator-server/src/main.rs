//! # Calculator JSON-RPC Server
//!
//! Serves the methods used throughout the JSON-RPC 2.0 specification examples
//! (`subtract`, `sum`, `update`, `get_data`, ...) over HTTP.
//!
//! ## Usage
//! ```bash
//! cargo run --package calculator-server -- --bind 127.0.0.1:8000 --batch concurrent
//! ```

mod methods;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use json_rpc_engine::BatchExecution;
use json_rpc_http_server::HttpJsonRpcServer;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// Path of the JSON-RPC endpoint
    #[arg(short, long, default_value = "/rpc")]
    path: String,

    /// Maximum request body size in bytes
    #[arg(long, default_value = "1048576")]
    max_body_size: usize,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// How batch elements are executed
    #[arg(long, value_enum, default_value_t = BatchMode::Concurrent)]
    batch: BatchMode,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchMode {
    Sequential,
    Concurrent,
    Spawned,
}

impl From<BatchMode> for BatchExecution {
    fn from(mode: BatchMode) -> Self {
        match mode {
            BatchMode::Sequential => BatchExecution::Sequential,
            BatchMode::Concurrent => BatchExecution::Concurrent,
            BatchMode::Spawned => BatchExecution::Spawned,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    let server = HttpJsonRpcServer::builder()
        .bind_address(args.bind)
        .rpc_path(args.path.clone())
        .cors(!args.no_cors)
        .max_body_size(args.max_body_size)
        .batch_execution(args.batch.into())
        .registry(methods::registry())
        .build()
        .context("invalid server configuration")?;

    println!("JSON-RPC server running at: http://{}{}", args.bind, args.path);
    println!("Try this curl command:");
    println!(
        r#"curl -X POST http://{}{} \
  -H "Content-Type: application/json" \
  -d '[{{"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1}},
       {{"jsonrpc": "2.0", "method": "sum", "params": [1, 2, 4], "id": "2"}}]'"#,
        args.bind, args.path
    );

    server
        .run_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
            }
        })
        .await?;

    Ok(())
}
