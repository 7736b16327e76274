//! End-to-end tests using real WebSocket clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pulsecast::{serve_on, ApiResult, AppState, Config, ProductionLoop};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(300);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Long enough that the background loop never fires during a test
const IDLE_TICK_MS: u64 = 3_600_000;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct TestServer {
    url: String,
    state: AppState,
    stop: CancellationToken,
    handle: JoinHandle<ApiResult<()>>,
}

impl TestServer {
    async fn spawn(tick_interval_ms: u64, min_interval_ms: u64) -> Self {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.broadcast.tick_interval_ms = tick_interval_ms;
        config.broadcast.min_interval_ms = min_interval_ms;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");

        let state = AppState::new(config);
        let stop = CancellationToken::new();
        let signal = {
            let stop = stop.clone();
            async move { stop.cancelled().await }
        };
        let handle = tokio::spawn(serve_on(listener, state.clone(), signal));

        TestServer {
            url: format!("ws://{addr}/ws"),
            state,
            stop,
            handle,
        }
    }

    async fn connect(&self) -> WsStream {
        let (ws, _) = connect_async(self.url.as_str()).await.expect("connect");
        ws
    }

    async fn wait_for_connections(&self, expected: usize) {
        timeout(TIMEOUT, async {
            while self.state.hub.len().await != expected {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("registry never reached {expected} connections"));
    }

    /// Drive exactly one production round
    async fn tick(&self) {
        ProductionLoop::new(
            Arc::clone(&self.state.dispatcher),
            Arc::clone(&self.state.source),
            Duration::from_millis(IDLE_TICK_MS),
        )
        .tick()
        .await;
    }

    async fn shutdown(self) {
        self.stop.cancel();
        timeout(TIMEOUT, self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server returned error");
    }
}

async fn next_text(ws: &mut WsStream) -> String {
    let msg = timeout(TIMEOUT, ws.next())
        .await
        .expect("timed out waiting for message")
        .expect("stream ended")
        .expect("websocket error");
    msg.to_text().expect("text frame").to_string()
}

async fn assert_quiet(ws: &mut WsStream) {
    assert!(
        timeout(QUIET_PERIOD, ws.next()).await.is_err(),
        "received an unexpected extra message"
    );
}

fn assert_valid_sample(text: &str) {
    let value: Value = serde_json::from_str(text).expect("json payload");
    let cpu = value["cpu"].as_f64().expect("cpu is a number");
    let memory = value["memory"].as_f64().expect("memory is a number");
    assert!((0.0..100.0).contains(&cpu), "cpu out of range: {cpu}");
    assert!((1.0..16.0).contains(&memory), "memory out of range: {memory}");
    assert!(value["timestamp"].is_i64(), "timestamp is not an integer");
}

#[tokio::test]
async fn test_one_tick_reaches_every_client_once() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(server.connect().await);
    }
    server.wait_for_connections(3).await;

    server.tick().await;

    for ws in clients.iter_mut() {
        assert_valid_sample(&next_text(ws).await);
    }
    for ws in clients.iter_mut() {
        assert_quiet(ws).await;
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnected_client_is_deregistered() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    let mut ws = server.connect().await;
    server.wait_for_connections(1).await;

    ws.close(None).await.expect("close");
    server.wait_for_connections(0).await;

    server.tick().await;
    assert!(server.state.hub.is_empty().await);

    server.shutdown().await;
}

#[tokio::test]
async fn test_dropped_client_is_deregistered() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    let ws = server.connect().await;
    server.wait_for_connections(1).await;

    drop(ws);
    server.wait_for_connections(0).await;

    server.tick().await;
    assert!(server.state.hub.is_empty().await);

    server.shutdown().await;
}

#[tokio::test]
async fn test_rate_gate_drops_close_broadcasts() {
    let server = TestServer::spawn(IDLE_TICK_MS, 500).await;

    let mut ws = server.connect().await;
    server.wait_for_connections(1).await;

    server.state.dispatcher.broadcast("first").await;
    sleep(Duration::from_millis(100)).await;
    server.state.dispatcher.broadcast("second").await;

    assert_eq!(next_text(&mut ws).await, "first");
    assert_quiet(&mut ws).await;

    server.shutdown().await;
}

#[tokio::test]
async fn test_inbound_messages_are_ignored() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    let mut ws = server.connect().await;
    server.wait_for_connections(1).await;

    ws.send(Message::text("hello server")).await.expect("send");
    ws.send(Message::binary(vec![1u8, 2, 3])).await.expect("send");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(server.state.hub.len().await, 1);

    server.tick().await;
    assert_valid_sample(&next_text(&mut ws).await);

    server.shutdown().await;
}

#[tokio::test]
async fn test_production_loop_streams_samples() {
    let server = TestServer::spawn(100, 0).await;

    let mut ws = server.connect().await;
    server.wait_for_connections(1).await;

    for _ in 0..2 {
        assert_valid_sample(&next_text(&mut ws).await);
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_clients() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    let mut clients = Vec::new();
    for _ in 0..2 {
        clients.push(server.connect().await);
    }
    server.wait_for_connections(2).await;

    let state = server.state.clone();
    server.shutdown().await;
    assert!(state.hub.is_empty().await);

    for mut ws in clients {
        let ended = timeout(TIMEOUT, async {
            loop {
                match ws.next().await {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(ended.is_ok(), "client was not closed on shutdown");
    }
}

#[tokio::test]
async fn test_shutdown_with_stalled_client() {
    let server = TestServer::spawn(IDLE_TICK_MS, 0).await;

    // Connected but never read, so socket buffers fill and the send parks
    let stalled = server.connect().await;
    server.wait_for_connections(1).await;

    let dispatcher = Arc::clone(&server.state.dispatcher);
    let payload = "x".repeat(32 * 1024 * 1024);
    let broadcast = tokio::spawn(async move { dispatcher.broadcast(&payload).await });

    sleep(Duration::from_millis(200)).await;
    assert!(!broadcast.is_finished(), "send to the stalled client completed");

    let state = server.state.clone();
    server.shutdown().await;
    assert!(state.hub.is_empty().await);

    broadcast.abort();
    drop(stalled);
}
