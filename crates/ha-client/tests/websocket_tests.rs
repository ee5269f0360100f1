//! WebSocket client against an in-process mock server

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::{test_config, AuthMode, MockWsServer, HA_VERSION};
use futures_util::future::join_all;
use ha_client::{ClientConfig, HaError, WsClient};
use serde_json::{json, Value};

const BOUND: Duration = Duration::from_secs(2);

fn client(server: &MockWsServer) -> WsClient {
    WsClient::new(&test_config(server.base_url())).unwrap()
}

async fn wait_disconnected(ws: &WsClient) {
    for _ in 0..200 {
        if !ws.is_connected().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session still reported connected");
}

#[tokio::test]
async fn test_ping_round_trip() {
    let server = MockWsServer::responding(|command| {
        assert_eq!(command["type"], "ping");
        Ok(json!({"pong": true}))
    })
    .await;
    let ws = client(&server);

    let result = ws.call(&json!({"type": "ping"})).await.unwrap();

    assert_eq!(result, json!({"pong": true}));
    assert!(ws.is_connected().await);
    assert_eq!(ws.ha_version().await.as_deref(), Some(HA_VERSION));
}

#[tokio::test]
async fn test_structured_error() {
    let server =
        MockWsServer::responding(|_| Err(("not_found".to_string(), "x".to_string()))).await;
    let ws = client(&server);

    let err = ws.call(&json!({"type": "get_thing"})).await.unwrap_err();

    assert_eq!(err.code(), Some("not_found"));
    assert_eq!(err.remote_message(), Some("x"));
    assert_eq!(err.to_string(), "websocket error [not_found]: x");
}

#[tokio::test]
async fn test_generic_failure_without_error_body() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        while let Some(command) = conn.recv_json().await {
            conn.send_json(json!({"id": command["id"], "type": "result", "success": false}))
                .await;
        }
    })
    .await;
    let ws = client(&server);

    let err = ws.call(&json!({"type": "anything"})).await.unwrap_err();
    assert!(matches!(err, HaError::CommandFailed));
}

#[tokio::test]
async fn test_success_without_result_is_null() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        while let Some(command) = conn.recv_json().await {
            conn.send_json(json!({"id": command["id"], "type": "result", "success": true}))
                .await;
        }
    })
    .await;
    let ws = client(&server);

    assert_eq!(ws.call(&json!({"type": "noop"})).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_concurrent_calls_answered_in_reverse_order() {
    const CALLS: usize = 10;

    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        let mut received = Vec::new();
        while received.len() < CALLS {
            match conn.recv_json().await {
                Some(command) => received.push(command),
                None => return,
            }
        }
        for command in received.iter().rev() {
            conn.reply(&command["id"], json!({"n": command["n"]})).await;
        }
        conn.drain().await;
    })
    .await;
    let ws = client(&server);

    let calls = (0..CALLS).map(|n| {
        let ws = &ws;
        async move { ws.call(&json!({"type": "echo", "n": n})).await }
    });
    let results = tokio::time::timeout(BOUND, join_all(calls)).await.unwrap();

    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!({"n": n}));
    }
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_request_ids_are_unique_and_positive() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let server = MockWsServer::responding(move |command| {
        recorded.lock().unwrap().push(command["id"].as_i64().unwrap());
        Ok(Value::Null)
    })
    .await;
    let ws = client(&server);

    let ping = json!({"type": "ping"});
    let calls = (0..25).map(|_| ws.call(&ping));
    for result in join_all(calls).await {
        result.unwrap();
    }

    let ids = seen.lock().unwrap().clone();
    let unique: HashSet<i64> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 25);
    assert_eq!(unique.len(), 25);
    assert!(ids.iter().all(|id| *id > 0));
}

#[tokio::test]
async fn test_command_is_not_mutated() {
    let server = MockWsServer::responding(|_| Ok(json!(true))).await;
    let ws = client(&server);
    let command = json!({"type": "ping"});

    ws.call(&command).await.unwrap();
    ws.call(&command).await.unwrap();

    assert_eq!(command, json!({"type": "ping"}));
}

#[tokio::test]
async fn test_uncorrelated_messages_are_ignored() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        while let Some(command) = conn.recv_json().await {
            conn.send_json(json!({"id": 9999, "type": "result", "success": true, "result": 1}))
                .await;
            conn.send_json(json!({"type": "event", "event": {"event_type": "state_changed"}}))
                .await;
            conn.send_json(json!({"id": 0, "type": "result", "success": true}))
                .await;
            conn.reply(&command["id"], json!("mine")).await;
        }
    })
    .await;
    let ws = client(&server);

    assert_eq!(ws.call(&json!({"type": "a"})).await.unwrap(), json!("mine"));
    assert_eq!(ws.call(&json!({"type": "b"})).await.unwrap(), json!("mine"));
}

#[tokio::test]
async fn test_connection_loss_fails_pending_calls() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        // Read both commands, then hang up without answering
        conn.recv_json().await;
        conn.recv_json().await;
    })
    .await;
    let ws = client(&server);

    let (first, second) = tokio::time::timeout(
        BOUND,
        futures_util::future::join(
            ws.call(&json!({"type": "one"})),
            ws.call(&json!({"type": "two"})),
        ),
    )
    .await
    .unwrap();

    assert!(matches!(first, Err(HaError::ConnectionClosed)));
    assert!(matches!(second, Err(HaError::ConnectionClosed)));
    wait_disconnected(&ws).await;
}

#[tokio::test]
async fn test_reconnects_after_connection_loss() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        if let Some(command) = conn.recv_json().await {
            conn.reply(&command["id"], json!("ok")).await;
        }
    })
    .await;
    let ws = client(&server);

    assert_eq!(ws.call(&json!({"type": "ping"})).await.unwrap(), json!("ok"));
    wait_disconnected(&ws).await;

    assert_eq!(ws.call(&json!({"type": "ping"})).await.unwrap(), json!("ok"));
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_reconnects_after_close() {
    let server = MockWsServer::responding(|_| Ok(json!({"pong": true}))).await;
    let ws = client(&server);

    ws.connect().await.unwrap();
    ws.connect().await.unwrap();
    assert_eq!(server.connections(), 1);

    ws.close().await;
    assert!(!ws.is_connected().await);
    ws.close().await;

    ws.call(&json!({"type": "ping"})).await.unwrap();
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_close_fails_in_flight_calls() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        conn.drain().await;
    })
    .await;
    let ws = Arc::new(client(&server));
    ws.connect().await.unwrap();

    let caller = ws.clone();
    let call = tokio::spawn(async move { caller.call(&json!({"type": "slow"})).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    ws.close().await;

    let result = tokio::time::timeout(BOUND, call).await.unwrap().unwrap();
    assert!(matches!(result, Err(HaError::ConnectionClosed)));
}

#[tokio::test]
async fn test_auth_invalid_fails_and_retries_on_next_call() {
    let server = MockWsServer::start(AuthMode::Reject, |_| async {}).await;
    let ws = client(&server);

    let err = ws.call(&json!({"type": "ping"})).await.unwrap_err();
    assert!(matches!(err, HaError::AuthFailed(_)));
    assert!(err.to_string().contains("failed"));
    assert!(!ws.is_connected().await);

    let err = ws.call(&json!({"type": "ping"})).await.unwrap_err();
    assert!(matches!(err, HaError::AuthFailed(_)));
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let server = MockWsServer::responding(|_| Ok(Value::Null)).await;
    let ws = WsClient::new(&ClientConfig::new(server.base_url(), "wrong")).unwrap();

    let err = ws.connect().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "websocket auth: auth failed: Invalid access token or password"
    );
}

#[tokio::test]
async fn test_unexpected_first_message() {
    let server = MockWsServer::start(AuthMode::Unexpected, |_| async {}).await;
    let ws = client(&server);

    let err = ws.connect().await.unwrap_err();
    assert!(matches!(err, HaError::Handshake(ref m) if m.contains("auth_required")));
}

#[tokio::test]
async fn test_handshake_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Complete the upgrade but never send auth_required
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let config = test_config(&format!("http://{}", addr))
        .with_handshake_timeout(Duration::from_millis(100));
    let ws = WsClient::new(&config).unwrap();

    let started = Instant::now();
    let err = ws.connect().await.unwrap_err();
    assert!(matches!(err, HaError::Handshake(_)));
    assert!(started.elapsed() < BOUND);
}

#[tokio::test]
async fn test_dial_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ws = WsClient::new(&test_config(&format!("http://{}", addr))).unwrap();
    let err = ws.call(&json!({"type": "ping"})).await.unwrap_err();

    assert!(matches!(err, HaError::Dial(_)));
    assert!(err.to_string().starts_with("websocket dial:"));
}

#[tokio::test]
async fn test_cancelled_before_response() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        conn.drain().await;
    })
    .await;
    let ws = client(&server);
    ws.connect().await.unwrap();

    let started = Instant::now();
    let result = ws
        .call_until(&json!({"type": "slow"}), std::future::ready(()))
        .await;

    assert!(matches!(result, Err(HaError::Cancelled)));
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_cancelled_while_waiting() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        conn.drain().await;
    })
    .await;
    let ws = client(&server);

    let started = Instant::now();
    let result = ws
        .call_until(
            &json!({"type": "slow"}),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

    assert!(matches!(result, Err(HaError::Cancelled)));
    assert!(started.elapsed() < BOUND);
}

#[tokio::test]
async fn test_timeout_leaves_session_usable() {
    let server = MockWsServer::start(AuthMode::Accept, |mut conn| async move {
        while let Some(command) = conn.recv_json().await {
            if command["type"] == "ping" {
                conn.reply(&command["id"], json!({"pong": true})).await;
            }
        }
    })
    .await;
    let ws = client(&server);

    let err = ws
        .call_with_timeout(&json!({"type": "slow"}), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, HaError::Timeout(_)));

    let result = ws.call(&json!({"type": "ping"})).await.unwrap();
    assert_eq!(result, json!({"pong": true}));
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_non_object_command_is_rejected() {
    let server = MockWsServer::responding(|_| Ok(Value::Null)).await;
    let ws = client(&server);

    let err = ws.call(&json!(["ping"])).await.unwrap_err();
    assert!(matches!(err, HaError::InvalidCommand));
}

#[tokio::test]
async fn test_call_as_decodes_result() {
    #[derive(serde::Deserialize)]
    struct Pong {
        pong: bool,
    }

    let server = MockWsServer::responding(|_| Ok(json!({"pong": true}))).await;
    let ws = client(&server);

    let pong: Pong = ws.call_as(&json!({"type": "ping"})).await.unwrap();
    assert!(pong.pong);
}
