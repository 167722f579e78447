//! Common test utilities for integration tests.
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use relay_server::{config::Config, routes, state::AppState};
use relay_types::Response;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// A relay listening on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    _static_dir: TempDir,
}

/// Config pointing at a temp static dir with a tiny index page.
pub fn test_config(static_dir: &TempDir) -> Config {
    std::fs::write(static_dir.path().join("index.html"), "<h1>relay</h1>").unwrap();
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: static_dir.path().to_path_buf(),
        write_timeout_secs: 2,
        prune_on_disconnect: false,
    }
}

/// Start the router and dispatch loop, letting the caller tweak the config.
pub async fn start_test_server(configure: impl FnOnce(&mut Config)) -> TestServer {
    let static_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = test_config(&static_dir);
    configure(&mut config);

    let (state, dispatcher) = AppState::new(config);
    dispatcher.spawn();
    let app = routes::build_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        addr,
        _static_dir: static_dir,
    }
}

/// Open a WebSocket and consume the connection acknowledgement.
pub async fn connect(addr: SocketAddr) -> WsClient {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect to WebSocket");
    assert_eq!(recv(&mut ws).await, Response::connected());
    ws
}

/// Wait for the next JSON response, skipping control frames.
pub async fn recv(ws: &mut WsClient) -> Response {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for a response")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str())
                .unwrap_or_else(|e| panic!("Bad response {}: {}", text.as_str(), e));
        }
    }
}

pub async fn send(ws: &mut WsClient, payload: Value) {
    ws.send(Message::text(payload.to_string()))
        .await
        .expect("Failed to send");
}

/// Assert nothing but control frames arrive for a short while.
pub async fn assert_silent(ws: &mut WsClient) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => panic!("Unexpected response: {}", text.as_str()),
            Ok(Some(Ok(_))) => continue,
            Ok(other) => panic!("Connection ended unexpectedly: {:?}", other),
        }
    }
}

/// Read until the server closes the socket, ignoring anything still in flight.
pub async fn wait_for_close(ws: &mut WsClient) {
    loop {
        let next = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for the server to close");
        match next {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
            Some(Ok(_)) => continue,
        }
    }
}
