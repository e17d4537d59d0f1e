mod support;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(ws: &mut Socket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("message before timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Ok(text) = msg.to_text() {
            if !text.is_empty() {
                return serde_json::from_str(text).expect("server sends json");
            }
        }
    }
}

async fn next_of_type(ws: &mut Socket, ty: &str) -> Value {
    loop {
        let value = next_json(ws).await;
        if value["type"] == ty {
            return value;
        }
    }
}

#[tokio::test]
async fn when_a_client_connects_then_it_gets_an_identity_and_the_game_state() {
    let base_url = support::ensure_server();
    let (mut ws, _) = connect_async(format!("{base_url}/ws"))
        .await
        .expect("websocket handshake");

    let identity = next_json(&mut ws).await;
    assert_eq!(identity["type"], "Identity");
    assert!(identity["data"]["player_id"].is_u64());

    let state = next_json(&mut ws).await;
    assert_eq!(state["type"], "GameState");
}

#[tokio::test]
async fn when_the_server_pings_then_a_pong_keeps_the_connection_healthy() {
    let base_url = support::ensure_server();
    let (mut ws, _) = connect_async(format!("{base_url}/ws"))
        .await
        .expect("websocket handshake");

    ws.send(Message::text(
        r#"{"type":"Join","data":{"display_name":"Tester"}}"#,
    ))
    .await
    .expect("join sent");

    let ping = next_of_type(&mut ws, "Ping").await;
    let nonce = ping["data"]["nonce"].as_u64().expect("numeric nonce");
    ws.send(Message::text(format!(
        r#"{{"type":"Pong","data":{{"nonce":{nonce}}}}}"#
    )))
    .await
    .expect("pong sent");

    // The next probe arrives on schedule, so the connection survived the exchange.
    let again = next_of_type(&mut ws, "Ping").await;
    assert_ne!(again["data"]["nonce"], ping["data"]["nonce"]);
}
