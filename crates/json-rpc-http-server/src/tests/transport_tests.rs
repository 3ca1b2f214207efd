//! Loopback transport tests
//!
//! Real TCP connections against a server bound to an ephemeral port.

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::server::HttpJsonRpcServer;

async fn post(addr: std::net::SocketAddr, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    String::from_utf8(raw).unwrap()
}

fn split_body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}

#[tokio::test]
async fn test_serve_over_loopback() {
    let server = HttpJsonRpcServer::builder()
        .method_fn("sum", |ctx| {
            let total: i64 = ctx.params().iter().filter_map(Value::as_i64).sum();
            ctx.set_result(total);
        })
        .build()
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let serving = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let raw = post(
        addr,
        "/rpc",
        r#"{"jsonrpc": "2.0", "method": "sum", "params": [1, 2, 4], "id": "1"}"#,
    )
    .await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "unexpected response: {raw}");
    let body: Value = serde_json::from_str(split_body(&raw)).unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "result": 7, "id": "1"}));

    let raw = post(
        addr,
        "/rpc",
        r#"{"jsonrpc": "2.0", "method": "sum", "params": [1]}"#,
    )
    .await;
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "unexpected response: {raw}");
    assert!(split_body(&raw).is_empty());

    let raw = post(addr, "/elsewhere", "{}").await;
    assert!(raw.starts_with("HTTP/1.1 404"), "unexpected response: {raw}");

    shutdown_tx.send(()).unwrap();
    serving.await.unwrap().unwrap();
}
