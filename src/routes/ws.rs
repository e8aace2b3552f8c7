//! WebSocket handler: bidirectional frame relay for one room.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers an outbound channel with the
//! room session, and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by event name
//! - Frames queued by the session (broadcasts, timers) → forward to client
//!
//! Services never see the socket. They mutate the session under its lock and
//! queue frames on client channels; this loop is the only writer.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → join `?room=` (default `lobby`) as a connection, not a player
//! 2. Client sends `join` → seated; other events dispatch to services
//! 3. Close → lobby leave path → room evicted if no connections remain
//!
//! ERROR HANDLING
//! ==============
//! Nothing is ever sent back as an error. Malformed JSON is logged at warn,
//! rejected events at debug, and the connection carries on.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{
    EV_CHAT_MESSAGE, EV_CLEAR, EV_END_PATH, EV_FORCE_ROUND_END, EV_JOIN, EV_UNDO, Frame,
};
use crate::services::canvas::{self, DrawKind};
use crate::services::session::{ClientId, GameError, Session, SessionHandle};
use crate::services::{chat, lobby, round};
use crate::state::AppState;

pub const DEFAULT_ROOM: &str = "lobby";

/// Outbound frames buffered per connection before drops begin.
const CLIENT_BUFFER: usize = 256;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub room: Option<String>,
}

/// Room name from the query string; blank or missing means the default room.
fn room_name(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_ROOM)
        .to_string()
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, Query(params): Query<WsParams>, ws: WebSocketUpgrade) -> Response {
    let room = room_name(params.room.as_deref());
    ws.on_upgrade(move |socket| run_ws(socket, state, room))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, room: String) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_BUFFER);

    let handle = state.join_room(&room, client_id, client_tx).await;
    info!(%client_id, %room, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        process_inbound_text(&handle, client_id, text.as_str()).await;
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    {
        let mut session = handle.lock().await;
        session.disconnect(client_id);
        lobby::leave(&handle, &mut session, client_id);
    }
    state.evict_if_empty(&room).await;
    info!(%client_id, %room, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse one inbound text frame and apply it to the session.
///
/// Kept apart from the socket so tests can drive dispatch with plain
/// channels.
async fn process_inbound_text(handle: &SessionHandle, client_id: ClientId, text: &str) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return;
        }
    };

    let mut session = handle.lock().await;
    debug!(room = %session.room, %client_id, event = %frame.event, "ws: recv frame");
    if let Err(e) = dispatch(handle, &mut session, client_id, frame) {
        debug!(room = %session.room, %client_id, error = %e, "ws: event ignored");
    }
}

fn dispatch(handle: &SessionHandle, session: &mut Session, client: ClientId, frame: Frame) -> Result<(), GameError> {
    if let Some(kind) = DrawKind::from_event(&frame.event) {
        return canvas::draw(session, client, kind, frame.data);
    }

    match frame.event.as_str() {
        EV_JOIN => lobby::join(
            handle,
            session,
            client,
            frame.str_field("id").map(str::to_string),
            frame.str_field("name").unwrap_or_default(),
            frame.str_field("avatar").unwrap_or_default(),
        ),
        EV_END_PATH => canvas::end_path(session, client),
        EV_UNDO => canvas::undo(session, client),
        EV_CLEAR => canvas::clear(session, client),
        EV_FORCE_ROUND_END => round::force_round_end(handle, session, client),
        EV_CHAT_MESSAGE => chat::handle_chat(handle, session, client, frame.str_field("message").unwrap_or_default()),
        other => Err(GameError::UnknownEvent(other.to_string())),
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
