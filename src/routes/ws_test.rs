use super::*;
use crate::services::session::test_helpers::{TestClient, connect, test_session};
use crate::state::test_helpers::test_app_state;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite;

type Client = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn join_text(name: &str) -> String {
    json!({"event": "join", "data": {"id": format!("id-{name}"), "name": name, "avatar": "cat"}}).to_string()
}

fn event_text(event: &str, data: serde_json::Value) -> String {
    json!({"event": event, "data": data}).to_string()
}

async fn connected(handle: &SessionHandle) -> TestClient {
    let mut session = handle.lock().await;
    connect(&mut session)
}

// =============================================================================
// room_name
// =============================================================================

#[test]
fn room_name_defaults_to_lobby() {
    assert_eq!(room_name(None), "lobby");
    assert_eq!(room_name(Some("  ")), "lobby");
    assert_eq!(room_name(Some(" den ")), "den");
}

// =============================================================================
// dispatch
// =============================================================================

#[tokio::test]
async fn join_frame_seats_player() {
    let handle = test_session(&["apple"]).into_handle();
    let mut client = connected(&handle).await;

    process_inbound_text(&handle, client.id, &join_text("ann")).await;

    let session = handle.lock().await;
    assert_eq!(session.player_name(client.id), Some("ann"));
    assert_eq!(session.players[&client.id].handle.as_deref(), Some("id-ann"));
    assert_eq!(client.drain_events(), vec!["waitingForPlayers", "playerList"]);
}

#[tokio::test]
async fn malformed_json_is_ignored() {
    let handle = test_session(&["apple"]).into_handle();
    let mut client = connected(&handle).await;

    process_inbound_text(&handle, client.id, "{not json").await;
    process_inbound_text(&handle, client.id, r#"{"data": {}}"#).await;

    assert!(client.drain().is_empty());
    assert_eq!(handle.lock().await.player_count(), 0);
}

#[tokio::test]
async fn unknown_event_is_rejected() {
    let handle = test_session(&["apple"]).into_handle();
    let client = connected(&handle).await;
    let mut session = handle.lock().await;

    let frame = Frame::empty("teleport");
    assert_eq!(
        dispatch(&handle, &mut session, client.id, frame),
        Err(GameError::UnknownEvent("teleport".into()))
    );
}

#[tokio::test]
async fn join_without_name_changes_nothing() {
    let handle = test_session(&["apple"]).into_handle();
    let mut client = connected(&handle).await;

    process_inbound_text(&handle, client.id, &event_text("join", json!({"avatar": "cat"}))).await;

    assert!(client.drain().is_empty());
    assert_eq!(handle.lock().await.player_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn drawing_events_route_to_canvas() {
    let handle = test_session(&["apple"]).into_handle();
    let mut a = connected(&handle).await;
    let mut b = connected(&handle).await;
    process_inbound_text(&handle, a.id, &join_text("ann")).await;
    process_inbound_text(&handle, b.id, &join_text("bob")).await;
    a.drain();
    b.drain();

    process_inbound_text(&handle, a.id, &event_text("startPath", json!({"x": 1, "y": 2}))).await;
    process_inbound_text(&handle, a.id, &event_text("draw", json!({"x": 3, "y": 4}))).await;
    process_inbound_text(&handle, b.id, &event_text("dot", json!({"x": 5, "y": 6}))).await;

    assert_eq!(handle.lock().await.canvas.len(), 2);
    let frames = b.drain();
    let events: Vec<&str> = frames.iter().map(|f| f.event.as_str()).collect();
    assert_eq!(events, vec!["startPath", "draw"]);
    assert_eq!(frames[1].data.get("x"), Some(&json!(3)));
    assert!(a.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn chat_and_force_end_dispatch() {
    let handle = test_session(&["apple"]).into_handle();
    let mut a = connected(&handle).await;
    let mut b = connected(&handle).await;
    process_inbound_text(&handle, a.id, &join_text("ann")).await;
    process_inbound_text(&handle, b.id, &join_text("bob")).await;

    process_inbound_text(&handle, a.id, &event_text("forceRoundEnd", json!({}))).await;
    assert_eq!(handle.lock().await.round.drawer, Some(b.id));
    a.drain();
    b.drain();

    process_inbound_text(&handle, a.id, &event_text("chatMessage", json!({"message": "hello"}))).await;
    let frames = a.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].str_field("message"), Some("hello"));
    assert_eq!(frames[0].data.get("sender_zone"), Some(&json!(1)));
    assert!(b.drain().is_empty(), "drawer must not see zone 1 chat");
}

// =============================================================================
// end to end
// =============================================================================

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, crate::routes::app(state)).await.expect("server runs");
    });
    addr
}

async fn ws_connect(addr: SocketAddr, room: &str) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?room={room}"))
        .await
        .expect("websocket connects");
    ws
}

async fn send_text(ws: &mut Client, text: String) {
    ws.send(tungstenite::Message::Text(text.into())).await.expect("send");
}

/// Read frames until one named `event` arrives.
async fn recv_until(ws: &mut Client, event: &str) -> Frame {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {event}"))
            .expect("stream open")
            .expect("message ok");
        let tungstenite::Message::Text(text) = msg else {
            continue;
        };
        let frame: Frame = serde_json::from_str(&text).expect("server sends frames");
        if frame.event == event {
            return frame;
        }
    }
}

#[tokio::test]
async fn two_players_play_a_round_over_websockets() {
    let state = test_app_state();
    let addr = spawn_server(state.clone()).await;

    let mut ann = ws_connect(addr, "e2e").await;
    send_text(&mut ann, join_text("ann")).await;
    let waiting = recv_until(&mut ann, "waitingForPlayers").await;
    assert_eq!(waiting.str_field("message"), Some("Waiting for one more person..."));

    let mut bob = ws_connect(addr, "e2e").await;
    send_text(&mut bob, join_text("bob")).await;

    let started = recv_until(&mut ann, "roundStarted").await;
    assert_eq!(started.str_field("role"), Some("drawer"));
    let prompt = recv_until(&mut ann, "roundPrompt").await;
    let word = prompt.str_field("prompt").expect("drawer sees the word").to_string();

    let started = recv_until(&mut bob, "roundStarted").await;
    assert_eq!(started.str_field("role"), Some("guesser"));
    let hint = recv_until(&mut bob, "roundPrompt").await;
    assert_eq!(hint.data.get("length"), Some(&json!(word.chars().count())));

    send_text(&mut bob, event_text("chatMessage", json!({"message": word.to_uppercase()}))).await;
    let correct = recv_until(&mut ann, "chatMessage").await;
    assert_eq!(correct.str_field("type"), Some("correct"));
    assert_eq!(correct.str_field("name"), Some("bob"));
    let reveal = recv_until(&mut ann, "chatMessage").await;
    assert_eq!(reveal.str_field("type"), Some("reveal"));
    assert_eq!(reveal.str_field("word"), Some(word.as_str()));

    let next = recv_until(&mut ann, "roundStarted").await;
    assert_eq!(next.str_field("role"), Some("guesser"));

    bob.close(None).await.expect("close");
    recv_until(&mut ann, "lobbyReset").await;
    recv_until(&mut ann, "waitingForPlayers").await;

    ann.close(None).await.expect("close");
    for _ in 0..50 {
        if state.rooms.read().await.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room was not evicted after the last connection closed");
}

#[tokio::test]
async fn rooms_do_not_share_players() {
    let state = test_app_state();
    let addr = spawn_server(state.clone()).await;

    let mut ann = ws_connect(addr, "north").await;
    send_text(&mut ann, join_text("ann")).await;
    recv_until(&mut ann, "waitingForPlayers").await;

    let mut bob = ws_connect(addr, "south").await;
    send_text(&mut bob, join_text("bob")).await;
    let waiting = recv_until(&mut bob, "waitingForPlayers").await;
    assert_eq!(waiting.event, "waitingForPlayers");
    assert_eq!(state.rooms.read().await.len(), 2);
}
