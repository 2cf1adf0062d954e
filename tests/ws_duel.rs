//! End-to-end tests against a running server: REST health check and a full
//! duel played by two WebSocket clients.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use duel_gateway::app_state::AppState;
use duel_gateway::build_app;
use duel_gateway::domain::{EventBus, QuizBank};
use duel_gateway::service::{DuelService, DuelSettings, RoundTiming};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let settings = DuelSettings {
        timing: RoundTiming {
            deadline: Duration::from_secs(5),
            grace: Duration::from_millis(20),
        },
        forfeit_on_disconnect: true,
    };
    let service = DuelService::new(Arc::new(QuizBank::builtin()), EventBus::new(1000), settings);
    let app = build_app(AppState::new(service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, event: &str, data: Value) {
    let frame = json!({ "id": "req", "payload": { "event": event, "data": data } });
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

async fn send_bare(ws: &mut Client, event: &str) {
    let frame = json!({ "id": "req", "payload": { "event": event } });
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

/// Reads frames until an event with the given name arrives and returns its
/// `data` payload.
async fn expect_event(ws: &mut Client, name: &str) -> Value {
    let wait = async {
        loop {
            let Some(Ok(msg)) = ws.next().await else {
                panic!("socket closed while waiting for {name}");
            };
            let Ok(text) = msg.to_text() else {
                continue;
            };
            let Ok(frame) = serde_json::from_str::<Value>(text) else {
                continue;
            };
            if frame["payload"]["event"] == name {
                return frame["payload"]["data"].clone();
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

async fn join(addr: SocketAddr, name: &str) -> (Client, String) {
    let mut ws = connect(addr).await;
    let welcome = expect_event(&mut ws, "welcome").await;
    let id = welcome["connectionId"].as_str().unwrap().to_string();
    send(&mut ws, "join", json!({ "name": name })).await;
    (ws, id)
}

/// Joins Alice and Bob, has Bob challenge Alice and Alice accept. Returns the
/// sockets, their handles and the session id, with round 1 already shown.
async fn start_duel(addr: SocketAddr) -> (Client, String, Client, String, String) {
    let (mut alice, alice_id) = join(addr, "Alice").await;
    let (mut bob, bob_id) = join(addr, "Bob").await;
    // Bob is registered once Alice sees him in the idle list.
    loop {
        let players = expect_event(&mut alice, "updatePlayers").await;
        if players.as_array().unwrap().iter().any(|p| p["id"] == bob_id) {
            break;
        }
    }

    send(&mut bob, "challenge", json!({ "targetId": alice_id })).await;
    let invite = expect_event(&mut alice, "challengeReceived").await;
    assert_eq!(invite["challengerId"], bob_id);
    assert_eq!(invite["challengerName"], "Bob");

    send(&mut alice, "acceptChallenge", json!({ "challengerId": bob_id })).await;
    // The first question goes out before `gameStart`.
    for ws in [&mut alice, &mut bob] {
        let question = expect_event(ws, "newQuestion").await;
        assert_eq!(question["round"], 1);
    }
    let start = expect_event(&mut alice, "gameStart").await;
    let session_id = start["sessionId"].as_str().unwrap().to_string();
    let bob_start = expect_event(&mut bob, "gameStart").await;
    assert_eq!(bob_start["sessionId"], session_id);

    (alice, alice_id, bob, bob_id, session_id)
}

#[tokio::test]
async fn health_endpoint_responds() {
    let addr = spawn_server().await;
    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["lobby"]["live_sessions"], 0);
}

#[tokio::test]
async fn full_duel_over_websocket() {
    let addr = spawn_server().await;
    let (mut alice, alice_id, mut bob, bob_id, session_id) = start_duel(addr).await;

    let answers = ["Paris", "Mars", "Beijing", "Da Vinci", "Au"];
    for (round, answer) in answers.iter().enumerate() {
        if round > 0 {
            let question = expect_event(&mut alice, "newQuestion").await;
            assert_eq!(question["round"], round + 1);
            assert_eq!(question["totalRounds"], 5);
            assert!(question.get("answer").is_none());
            expect_event(&mut bob, "newQuestion").await;
        }

        send(
            &mut alice,
            "submitAnswer",
            json!({ "answer": answer, "sessionId": session_id }),
        )
        .await;
        expect_event(&mut bob, "disableOptions").await;
        let scores = expect_event(&mut bob, "updateScores").await;
        assert_eq!(scores[&alice_id], 2 * (round + 1));
    }

    let over = expect_event(&mut alice, "gameOver").await;
    let scores: Value = serde_json::from_str(over.as_str().unwrap()).unwrap();
    assert_eq!(scores[&alice_id], 10);
    assert_eq!(scores[&bob_id], 0);
    expect_event(&mut bob, "gameOver").await;

    // Both players are back in the lobby.
    send_bare(&mut alice, "requestPlayerListUpdate").await;
    loop {
        let players = expect_event(&mut alice, "updatePlayers").await;
        if players.as_array().unwrap().len() == 2 {
            break;
        }
    }
}

#[tokio::test]
async fn disconnect_forfeits_running_duel() {
    let addr = spawn_server().await;
    let (alice, _alice_id, mut bob, _bob_id, _session_id) = start_duel(addr).await;

    drop(alice);

    let over = expect_event(&mut bob, "gameOver").await;
    assert!(over["forfeitedBy"].is_string());

    // The table entry is dropped right after `gameOver` goes out.
    let mut count = Value::Null;
    for _ in 0..50 {
        let sessions: Value = reqwest::get(format!("http://{addr}/api/v1/sessions"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        count = sessions["count"].clone();
        if count == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(count, 0);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let addr = spawn_server().await;
    let (_alice, _) = join(addr, "Alice").await;
    let (mut other, _) = join(addr, "Alice").await;
    expect_event(&mut other, "nameConflict").await;
}
