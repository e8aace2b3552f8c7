//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the word pack store, the active word list resolved at startup,
//! round timing, and a map of live room sessions. A room is created the first
//! time a connection names it and evicted when its last connection closes.
//!
//! Lock order is always `rooms` before a session mutex. Timer tasks only ever
//! take the session mutex.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::info;

use crate::config::RoundTiming;
use crate::frame::Frame;
use crate::services::packs::PackStore;
use crate::services::session::{ClientId, Session, SessionHandle};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, SessionHandle>>>,
    pub packs: Arc<RwLock<PackStore>>,
    /// Prompts every room draws from. Fixed for the life of the process.
    pub words: Arc<[String]>,
    pub timing: RoundTiming,
}

impl AppState {
    #[must_use]
    pub fn new(packs: PackStore, words: Vec<String>, timing: RoundTiming) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            packs: Arc::new(RwLock::new(packs)),
            words: words.into(),
            timing,
        }
    }

    /// Register `client` in `room`, creating the room on first use, and
    /// return its session.
    ///
    /// Lookup and registration happen under the `rooms` write guard, the same
    /// guard `evict_if_empty` holds while it checks for connections, so a
    /// connection can never land on a session that was just evicted.
    pub async fn join_room(&self, room: &str, client: ClientId, tx: mpsc::Sender<Frame>) -> SessionHandle {
        let mut rooms = self.rooms.write().await;
        let handle = rooms
            .entry(room.to_string())
            .or_insert_with(|| {
                info!(%room, "room created");
                Session::new(room, self.words.clone(), self.timing).into_handle()
            })
            .clone();
        handle.lock().await.connect(client, tx);
        handle
    }

    /// Drop `room` if no connection is left in it.
    pub async fn evict_if_empty(&self, room: &str) {
        let mut rooms = self.rooms.write().await;
        let Some(handle) = rooms.get(room) else {
            return;
        };
        if handle.lock().await.client_count() > 0 {
            return;
        }
        rooms.remove(room);
        info!(%room, "room evicted");
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::time::Duration;

    use super::*;

    /// State with a two-word active list and no countdown.
    #[must_use]
    pub fn test_app_state() -> AppState {
        let timing = RoundTiming { round: Duration::from_secs(100), countdown: Duration::ZERO };
        test_app_state_with_timing(timing)
    }

    #[must_use]
    pub fn test_app_state_with_timing(timing: RoundTiming) -> AppState {
        let mut packs = PackStore::new();
        let words = vec!["apple".to_string(), "banana".to_string()];
        packs
            .create("test-pack", words.clone())
            .expect("fresh store accepts a pack");
        AppState::new(packs, words, timing)
    }
}

// =============================================================================
// TESTS
// =============================================================================
