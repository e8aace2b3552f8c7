//! Frame: the universal message type for the doodle room.
//!
//! ARCHITECTURE
//! ============
//! Every websocket message in either direction is a Frame: a named event with
//! a flat JSON object payload. Clients send `join`, drawing, and chat frames;
//! the server answers with round, reveal, chat, and canvas frames.
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`. List payloads such as
//!   the scoreboard live under a single key.
//! - Inbound `id` and `ts` are optional; the server fills them in.
//! - The WS handler routes on `event` and hands `data` to the services.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// EVENT NAMES
// =============================================================================

pub const EV_JOIN: &str = "join";
pub const EV_START_PATH: &str = "startPath";
pub const EV_DRAW: &str = "draw";
pub const EV_DOT: &str = "dot";
pub const EV_FILL: &str = "fill";
pub const EV_END_PATH: &str = "endPath";
pub const EV_UNDO: &str = "undo";
pub const EV_CLEAR: &str = "clear";
pub const EV_FORCE_ROUND_END: &str = "forceRoundEnd";
pub const EV_CHAT_MESSAGE: &str = "chatMessage";

pub const EV_WAITING_FOR_PLAYERS: &str = "waitingForPlayers";
/// Scoreboard. Data is `{"players": [{name, avatar, score}, ...]}`: the list
/// sits under `players` because frame data is always an object, not a bare
/// array.
pub const EV_PLAYER_LIST: &str = "playerList";
pub const EV_ROUND_STARTING: &str = "roundStarting";
pub const EV_ROUND_STARTED: &str = "roundStarted";
pub const EV_ROUND_PROMPT: &str = "roundPrompt";
pub const EV_LETTER_REVEAL: &str = "letterReveal";
pub const EV_LOBBY_RESET: &str = "lobbyReset";
/// Whole canvas history in one frame: `{"ops": [{"event", "data"}, ...]}`.
pub const EV_CANVAS_REPLAY: &str = "canvasReplay";

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// The universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    #[serde(default = "now_ms")]
    pub ts: i64,
    pub event: String,
    #[serde(default)]
    pub data: Data,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a frame for the named event.
    pub fn new(event: impl Into<String>, data: Data) -> Self {
        Self { id: Uuid::new_v4(), ts: now_ms(), event: event.into(), data }
    }

    /// Create a frame with an empty payload.
    pub fn empty(event: impl Into<String>) -> Self {
        Self::new(event, Data::new())
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Frame {
    /// String field from the payload, if present.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
