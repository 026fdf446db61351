//! End-to-end tests for the `/ws` real-time channel.
//!
//! Each test serves the full router on `127.0.0.1:0` and connects real
//! `WebSocket` clients with `tokio-tungstenite`. The tick interval is set
//! far out so idle ticks do not interleave with the updates under test.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::{SinkExt, StreamExt};
use scoreboard_core::config::AdminConfig;
use scoreboard_core::scoreboard::NoOpSink;
use scoreboard_core::{Scoreboard, ScoreboardHandle};
use scoreboard_server::{serve, AdminGate, AppState};
use scoreboard_types::{Control, ScoreboardState};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const PASSWORD: &str = "opensesame";
const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    url: String,
    state: Arc<AppState>,
    handle: ScoreboardHandle,
}

async fn start() -> Harness {
    let (board, handle) = Scoreboard::new(
        ScoreboardState::new(Utc::now()),
        Box::new(NoOpSink),
        Duration::from_secs(3_600),
    );
    board.spawn();
    let gate = AdminGate::new(&AdminConfig {
        password: Some(String::from(PASSWORD)),
        session_secret: String::from("ws-test-secret"),
        session_ttl_secs: 600,
    });
    let state = Arc::new(AppState::new(handle.clone(), gate));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Arc::clone(&state), std::future::pending()));

    Harness {
        url: format!("ws://{addr}/ws"),
        state,
        handle,
    }
}

async fn connect(harness: &Harness) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(harness.url.as_str())
        .await
        .unwrap();
    ws
}

async fn connect_as_admin(harness: &Harness) -> Client {
    let session = harness.state.gate.login(PASSWORD).await.unwrap();
    let mut request = harness.url.as_str().into_client_request().unwrap();
    request.headers_mut().insert(
        COOKIE,
        HeaderValue::from_str(&format!("scoreboard_sid={session}")).unwrap(),
    );
    let (ws, _) = tokio_tungstenite::connect_async(request).await.unwrap();
    ws
}

/// Next text frame, parsed.
async fn next_event(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// Assert no text frame arrives within a short window.
async fn assert_silent(ws: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(200), next_event(ws)).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

#[tokio::test]
async fn connect_receives_current_state_first() {
    let harness = start().await;
    harness.handle.apply(Control::Start).await.unwrap();
    harness
        .handle
        .apply(Control::AddIncident {
            note: String::from("trip hazard"),
        })
        .await
        .unwrap();

    let mut ws = connect(&harness).await;
    let event = next_event(&mut ws).await;

    assert_eq!(event["event"], "update");
    assert_eq!(event["data"]["running"], true);
    assert_eq!(event["data"]["incidentsCount"], 1);
    assert_eq!(event["data"]["incidents"][0]["note"], "trip hazard");
}

#[tokio::test]
async fn admin_reset_reaches_every_client_identically() {
    let harness = start().await;
    let mut admin = connect_as_admin(&harness).await;
    let mut viewer = connect(&harness).await;
    next_event(&mut admin).await;
    next_event(&mut viewer).await;

    send(&mut admin, json!({"event": "start"})).await;
    let started = next_event(&mut viewer).await;
    assert_eq!(started["data"]["running"], true);
    assert_eq!(next_event(&mut admin).await, started);

    send(&mut admin, json!({"event": "reset"})).await;
    let a = next_event(&mut admin).await;
    let b = next_event(&mut viewer).await;

    assert_eq!(a, b);
    assert_eq!(a["event"], "update");
    assert_eq!(a["data"]["running"], false);
    assert_eq!(a["data"]["days"], 0);
    assert_eq!(a["data"]["seconds"], 0);
}

#[tokio::test]
async fn admin_can_add_and_delete_incidents() {
    let harness = start().await;
    let mut admin = connect_as_admin(&harness).await;
    next_event(&mut admin).await;

    send(&mut admin, json!({"event": "addIncident", "data": "glove missing"})).await;
    let added = next_event(&mut admin).await;
    assert_eq!(added["data"]["incidentsCount"], 1);
    let id = added["data"]["incidents"][0]["id"].clone();

    send(&mut admin, json!({"event": "deleteIncident", "data": id})).await;
    let deleted = next_event(&mut admin).await;
    assert_eq!(deleted["data"]["incidentsCount"], 0);
}

#[tokio::test]
async fn anonymous_control_is_rejected_to_sender_only() {
    let harness = start().await;
    let mut anonymous = connect(&harness).await;
    let mut bystander = connect(&harness).await;
    next_event(&mut anonymous).await;
    next_event(&mut bystander).await;

    send(&mut anonymous, json!({"event": "start"})).await;

    let reply = next_event(&mut anonymous).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["message"], "admin login required");
    assert_silent(&mut bystander).await;
    assert!(!harness.handle.snapshot().await.unwrap().running);
}

#[tokio::test]
async fn logout_revokes_control_on_open_connection() {
    let harness = start().await;
    let session = harness.state.gate.login(PASSWORD).await.unwrap();
    let mut request = harness.url.as_str().into_client_request().unwrap();
    request.headers_mut().insert(
        COOKIE,
        HeaderValue::from_str(&format!("scoreboard_sid={session}")).unwrap(),
    );
    let (mut ws, _) = tokio_tungstenite::connect_async(request).await.unwrap();
    next_event(&mut ws).await;

    harness.state.gate.logout(Some(&session)).await;
    send(&mut ws, json!({"event": "start"})).await;

    let reply = next_event(&mut ws).await;
    assert_eq!(reply["event"], "error");
    assert!(!harness.handle.snapshot().await.unwrap().running);
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let harness = start().await;
    let mut ws = connect(&harness).await;
    next_event(&mut ws).await;

    ws.send(Message::Ping(b"are you there".to_vec().into()))
        .await
        .unwrap();

    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Pong(payload) = msg {
            assert_eq!(payload.to_vec(), b"are you there".to_vec());
            break;
        }
    }
}
