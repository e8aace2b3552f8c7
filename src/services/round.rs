//! Round manager: start, end, rotation, and lobby reset.
//!
//! LIFECYCLE
//! =========
//! 1. `start_new_round` picks the drawer and prompt, resets the round, and
//!    broadcasts `clear` + `roundStarting`.
//! 2. A countdown task sleeps, then stamps `started_at`, tells every player
//!    their role and prompt, and spawns the reveal timer.
//! 3. The round ends when every guesser has the word, the drawer forces it,
//!    or the drawer leaves. The drawer cursor advances and step 1 repeats.
//! 4. When the room drops to one player, `reset_lobby` returns to waiting.
//!
//! Every task captures the round generation it was spawned for and does
//! nothing if the session has moved on by the time it wakes.

use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::frame::{
    EV_CHAT_MESSAGE, EV_CLEAR, EV_LETTER_REVEAL, EV_LOBBY_RESET, EV_ROUND_PROMPT, EV_ROUND_STARTED,
    EV_ROUND_STARTING, Frame, now_ms,
};
use crate::services::reveal::{build_masked_word, manage_time_reveals};
use crate::services::session::{ClientId, GameError, Round, RoundStart, Session, SessionHandle};

/// Upper bound on letters ever disclosed for a prompt of `len` chars.
#[must_use]
pub fn compute_max_reveals(len: usize) -> usize {
    match len {
        0..=4 => 2,
        5 => 3,
        6 | 7 => 4,
        8 => 5,
        9 | 10 => 6,
        _ => 7,
    }
}

/// Begin a round with the player under the drawer cursor.
///
/// No-op (logged) when nobody is seated.
pub fn start_new_round(handle: &SessionHandle, session: &mut Session) {
    if session.order.is_empty() {
        warn!(room = %session.room, "no players available to start round");
        return;
    }
    if session.drawer_index >= session.order.len() {
        session.drawer_index = 0;
    }
    let Some(drawer) = session.order.get(session.drawer_index) else {
        return;
    };
    let Some(prompt) = session.words().choose(&mut rand::rng()).cloned() else {
        warn!(room = %session.room, "word list is empty, cannot start round");
        return;
    };

    let generation = session.next_generation();
    info!(
        room = %session.room,
        generation,
        drawer = session.player_name(drawer).unwrap_or("-"),
        "round initializing"
    );
    session.round = Round::begin(generation, drawer, prompt);
    session.canvas.clear();

    session.broadcast_all(&Frame::empty(EV_CLEAR));
    session.broadcast_all(&Frame::empty(EV_ROUND_STARTING));

    tokio::spawn(run_countdown(handle.clone(), generation, session.timing.countdown));
}

/// Sleep out the countdown, then start the clock for `generation`.
async fn run_countdown(handle: SessionHandle, generation: u64, countdown: Duration) {
    tokio::time::sleep(countdown).await;

    let mut session = handle.lock().await;
    if !session.round.is_current(generation) {
        debug!(room = %session.room, generation, "countdown outlived its round");
        return;
    }

    let start = RoundStart { instant: Instant::now(), epoch_ms: now_ms() };
    session.round.started_at = Some(start);
    for client in session.players_except(None) {
        send_round_state(&session, client);
    }
    info!(room = %session.room, generation, "round started");

    let prompt_len = session.round.prompt_len();
    tokio::spawn(manage_time_reveals(handle.clone(), generation, start.instant, prompt_len));
}

/// Tell one player where the round stands: role and start time, their view
/// of the prompt, and the current mask if letters are already out. During
/// the countdown only `roundStarting` is sent.
pub fn send_round_state(session: &Session, client: ClientId) {
    let round = &session.round;
    let Some(prompt) = round.live_prompt() else {
        return;
    };
    let Some(start) = round.started_at else {
        session.send_to(client, Frame::empty(EV_ROUND_STARTING));
        return;
    };

    let is_drawer = session.is_drawer(client);
    let role = if is_drawer { "drawer" } else { "guesser" };
    session.send_to(
        client,
        Frame::empty(EV_ROUND_STARTED)
            .with_data("role", role)
            .with_data("startTime", start.epoch_ms),
    );

    let prompt_frame = Frame::empty(EV_ROUND_PROMPT).with_data("role", role);
    if is_drawer {
        session.send_to(client, prompt_frame.with_data("prompt", prompt));
        return;
    }
    session.send_to(client, prompt_frame.with_data("length", round.prompt_len()));
    if !round.revealed.is_empty() {
        let mask = build_masked_word(prompt, &round.revealed);
        session.send_to(client, Frame::empty(EV_LETTER_REVEAL).with_data("mask", mask));
    }
}

/// Announce the prompt of the current round to everyone.
pub fn broadcast_prompt_reveal(session: &Session) {
    let Some(prompt) = session.round.prompt.as_deref() else {
        return;
    };
    let frame = Frame::empty(EV_CHAT_MESSAGE)
        .with_data("type", "reveal")
        .with_data("word", prompt)
        .with_data("sender_zone", 2);
    session.broadcast_all(&frame);
}

/// Close the current round, hand the pen to the next player, and start over.
pub fn end_round_and_rotate(handle: &SessionHandle, session: &mut Session) {
    session.round.active = false;
    if !session.order.is_empty() {
        session.drawer_index = (session.drawer_index + 1) % session.order.len();
    }
    info!(room = %session.room, next_drawer_index = session.drawer_index, "round ended");
    broadcast_prompt_reveal(session);
    start_new_round(handle, session);
}

/// Drawer gives up on the current round.
///
/// # Errors
///
/// Returns an error if the sender is not drawing or no round is active.
pub fn force_round_end(handle: &SessionHandle, session: &mut Session, client: ClientId) -> Result<(), GameError> {
    if !session.is_drawer(client) {
        return Err(GameError::NotDrawer("end the round"));
    }
    if !session.round.active {
        return Err(GameError::RoundInactive);
    }
    end_round_and_rotate(handle, session);
    Ok(())
}

/// Back to waiting: no round, cursor at the first player, blank canvas.
pub fn reset_lobby(session: &mut Session) {
    let generation = session.next_generation();
    session.round = Round::idle(generation);
    session.drawer_index = 0;
    session.canvas.clear();
    info!(room = %session.room, "lobby reset");

    session.broadcast_all(&Frame::empty(EV_CLEAR));
    session.broadcast_all(&Frame::empty(EV_LOBBY_RESET));
}

#[cfg(test)]
#[path = "round_test.rs"]
mod tests;
