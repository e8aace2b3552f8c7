//! Session state: the single authoritative record for one room.
//!
//! DESIGN
//! ======
//! A `Session` owns everything a game room needs: players and their join
//! order, the drawer cursor, the round singleton, the canvas log, and the
//! outbound channel of every connected client. It is shared as
//! `Arc<Mutex<Session>>`; every inbound event and every timer step locks it
//! for one synchronous step, so steps never interleave. Nothing here sleeps.
//!
//! Outbound delivery is fire-and-forget `try_send` onto per-client channels.
//! Per-client order matches emission order.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::config::RoundTiming;
use crate::frame::{Data, EV_PLAYER_LIST, Frame};
use crate::services::canvas::CanvasLog;
use crate::services::round::compute_max_reveals;

/// Transport connection id. Doubles as the player key.
pub type ClientId = Uuid;

/// Shared, lockable session for one room.
pub type SessionHandle = Arc<Mutex<Session>>;

// =============================================================================
// ERRORS
// =============================================================================

/// Reasons an inbound event was dropped. Never surfaced to clients; the
/// dispatch layer logs them and moves on.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("join requires a name and an avatar")]
    MissingProfile,
    #[error("client has not joined: {0}")]
    NotAPlayer(ClientId),
    #[error("only the drawer may {0}")]
    NotDrawer(&'static str),
    #[error("no round is active")]
    RoundInactive,
    #[error("canvas history is empty")]
    EmptyHistory,
    #[error("empty chat message")]
    EmptyMessage,
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

// =============================================================================
// PLAYER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Client-supplied handle from `join`, if any.
    pub handle: Option<String>,
    pub name: String,
    pub avatar: String,
    pub score: u32,
}

impl Player {
    /// Build a player with a zero score.
    ///
    /// # Errors
    ///
    /// Returns `GameError::MissingProfile` if name or avatar is blank.
    pub fn new(handle: Option<String>, name: &str, avatar: &str) -> Result<Self, GameError> {
        let name = name.trim();
        let avatar = avatar.trim();
        if name.is_empty() || avatar.is_empty() {
            return Err(GameError::MissingProfile);
        }
        Ok(Self { handle, name: name.to_string(), avatar: avatar.to_string(), score: 0 })
    }
}

// =============================================================================
// PLAYER ORDER
// =============================================================================

/// Join order of players. Duplicate-free.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerOrder(Vec<ClientId>);

impl PlayerOrder {
    /// Append an id. Returns false if it was already present.
    pub fn push(&mut self, id: ClientId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Remove an id, returning the index it occupied.
    pub fn remove(&mut self, id: ClientId) -> Option<usize> {
        let idx = self.0.iter().position(|c| *c == id)?;
        self.0.remove(idx);
        Some(idx)
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<ClientId> {
        self.0.get(idx).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.0.iter().copied()
    }
}

// =============================================================================
// ROUND
// =============================================================================

/// Moment the countdown finished. `instant` drives scoring and reveal
/// timers; `epoch_ms` is what clients see as `startTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundStart {
    pub instant: Instant,
    pub epoch_ms: i64,
}

/// How many guess-progress reveals have fired this round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum GuessStage {
    #[default]
    None,
    /// 40% of guessers have the word.
    First,
    /// 70% of guessers have the word.
    Second,
}

/// The session-wide round singleton.
#[derive(Debug, Clone, Default)]
pub struct Round {
    /// Bumped on every round start and lobby reset. Timers compare against it.
    pub generation: u64,
    pub drawer: Option<ClientId>,
    pub prompt: Option<String>,
    pub active: bool,
    pub correct_guessers: HashSet<ClientId>,
    /// `None` while the pre-round countdown runs.
    pub started_at: Option<RoundStart>,
    /// Char positions of the prompt disclosed to guessers.
    pub revealed: BTreeSet<usize>,
    pub max_reveals: usize,
    pub guess_stage: GuessStage,
}

impl Round {
    /// Empty, inactive round.
    #[must_use]
    pub fn idle(generation: u64) -> Self {
        Self { generation, ..Self::default() }
    }

    /// Fresh active round for `drawer` drawing `prompt`.
    #[must_use]
    pub fn begin(generation: u64, drawer: ClientId, prompt: String) -> Self {
        let max_reveals = compute_max_reveals(prompt.chars().count());
        Self {
            generation,
            drawer: Some(drawer),
            prompt: Some(prompt),
            active: true,
            max_reveals,
            ..Self::default()
        }
    }

    /// True if this is still the active round a timer was started for.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    /// The prompt while the round is active.
    #[must_use]
    pub fn live_prompt(&self) -> Option<&str> {
        if self.active { self.prompt.as_deref() } else { None }
    }

    #[must_use]
    pub fn prompt_len(&self) -> usize {
        self.prompt.as_deref().map_or(0, |p| p.chars().count())
    }

    #[must_use]
    pub fn has_guessed(&self, client: ClientId) -> bool {
        self.correct_guessers.contains(&client)
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session {
    pub room: String,
    pub players: HashMap<ClientId, Player>,
    pub order: PlayerOrder,
    /// Cursor into `order` naming the next/current drawer.
    pub drawer_index: usize,
    pub round: Round,
    pub canvas: CanvasLog,
    pub timing: RoundTiming,
    words: Arc<[String]>,
    clients: HashMap<ClientId, mpsc::Sender<Frame>>,
    generation: u64,
}

impl Session {
    #[must_use]
    pub fn new(room: impl Into<String>, words: Arc<[String]>, timing: RoundTiming) -> Self {
        Self {
            room: room.into(),
            players: HashMap::new(),
            order: PlayerOrder::default(),
            drawer_index: 0,
            round: Round::idle(0),
            canvas: CanvasLog::default(),
            timing,
            words,
            clients: HashMap::new(),
            generation: 0,
        }
    }

    /// Wrap into a shareable handle.
    #[must_use]
    pub fn into_handle(self) -> SessionHandle {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Allocate the next round generation.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // -------------------------------------------------------------------------
    // Connections
    // -------------------------------------------------------------------------

    pub fn connect(&mut self, client: ClientId, tx: mpsc::Sender<Frame>) {
        self.clients.insert(client, tx);
    }

    pub fn disconnect(&mut self, client: ClientId) {
        self.clients.remove(&client);
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // -------------------------------------------------------------------------
    // Players
    // -------------------------------------------------------------------------

    /// Register a player. A repeat join from the same connection only
    /// refreshes the profile and returns false.
    pub fn add_player(&mut self, client: ClientId, player: Player) -> bool {
        if let Some(existing) = self.players.get_mut(&client) {
            existing.handle = player.handle;
            existing.name = player.name;
            existing.avatar = player.avatar;
            return false;
        }
        self.players.insert(client, player);
        self.order.push(client);
        true
    }

    /// Remove a player, keeping the drawer cursor pointed at the same
    /// rotation slot and in bounds.
    pub fn remove_player(&mut self, client: ClientId) -> Option<Player> {
        let player = self.players.remove(&client)?;
        if let Some(idx) = self.order.remove(client) {
            if idx < self.drawer_index {
                self.drawer_index -= 1;
            }
            if self.drawer_index >= self.order.len() {
                self.drawer_index = 0;
            }
        }
        self.round.correct_guessers.remove(&client);
        Some(player)
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.order.len()
    }

    /// Everyone but the drawer.
    #[must_use]
    pub fn guesser_count(&self) -> usize {
        self.order.len().saturating_sub(1)
    }

    #[must_use]
    pub fn player_name(&self, client: ClientId) -> Option<&str> {
        self.players.get(&client).map(|p| p.name.as_str())
    }

    #[must_use]
    pub fn is_drawer(&self, client: ClientId) -> bool {
        self.round.drawer == Some(client)
    }

    /// Players in join order, optionally skipping one.
    #[must_use]
    pub fn players_except(&self, skip: Option<ClientId>) -> Vec<ClientId> {
        self.order.iter().filter(|c| Some(*c) != skip).collect()
    }

    /// Scoreboard payload: `{"players": [{name, avatar, score}, ...]}` in join order.
    #[must_use]
    pub fn player_list_data(&self) -> Data {
        let list: Vec<serde_json::Value> = self
            .order
            .iter()
            .filter_map(|c| self.players.get(&c))
            .map(|p| serde_json::json!({"name": p.name, "avatar": p.avatar, "score": p.score}))
            .collect();
        let mut data = Data::new();
        data.insert("players".into(), serde_json::Value::Array(list));
        data
    }

    // -------------------------------------------------------------------------
    // Delivery
    // -------------------------------------------------------------------------

    /// Send a frame to one connection.
    pub fn send_to(&self, client: ClientId, frame: Frame) {
        let Some(tx) = self.clients.get(&client) else {
            return;
        };
        // Best-effort: a full or closed channel drops the frame.
        if let Err(e) = tx.try_send(frame) {
            debug!(room = %self.room, %client, error = %e, "dropped outbound frame");
        }
    }

    /// Send a frame to every connection in the room.
    pub fn broadcast_all(&self, frame: &Frame) {
        self.broadcast_except(None, frame);
    }

    /// Send a frame to every connection except `exclude`.
    pub fn broadcast_except(&self, exclude: Option<ClientId>, frame: &Frame) {
        for client in self.clients.keys() {
            if exclude == Some(*client) {
                continue;
            }
            self.send_to(*client, frame.clone());
        }
    }

    pub fn broadcast_player_list(&self) {
        self.broadcast_all(&Frame::new(EV_PLAYER_LIST, self.player_list_data()));
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
