//! Chat router: guess detection, scoring, and zone-restricted fan-out.
//!
//! DESIGN
//! ======
//! Every chat line is first checked as a guess, then routed by zone:
//! - Zone 1: players still guessing. Their messages reach only other
//!   players still guessing, so a near-miss never tips off the drawer's side
//!   and never reaches someone who already knows the word.
//! - Zone 2: the drawer and correct guessers. Their messages reach only
//!   zone 2, so the word can be discussed without leaking.
//!
//! A correct guess is consumed: it is scored and announced without its text
//! and never routed. Repeating the word after guessing is swallowed.

use tokio::time::Instant;
use tracing::info;

use crate::frame::{EV_CHAT_MESSAGE, Frame};
use crate::services::reveal::apply_guess_ratio_reveal;
use crate::services::round::end_round_and_rotate;
use crate::services::session::{ClientId, GameError, Session, SessionHandle};

const DRAWER_POINTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Still guessing.
    Guessing = 1,
    /// Drawer or already guessed.
    Solved = 2,
}

/// Points for a correct guess with `percent_left` of the round remaining.
#[must_use]
pub fn guess_points(percent_left: f64) -> u32 {
    if percent_left >= 0.80 {
        3
    } else if percent_left >= 0.40 {
        2
    } else {
        1
    }
}

/// Fraction of the round still remaining at `now`. A round whose clock has
/// not started yet counts as untouched.
#[must_use]
pub fn percent_left(session: &Session, now: Instant) -> f64 {
    let Some(start) = session.round.started_at else {
        return 1.0;
    };
    let total = session.timing.round;
    let remaining = total.saturating_sub(now.saturating_duration_since(start.instant));
    remaining.as_secs_f64() / total.as_secs_f64()
}

#[must_use]
pub fn zone_of(session: &Session, client: ClientId) -> Zone {
    if session.is_drawer(client) || session.round.has_guessed(client) {
        Zone::Solved
    } else {
        Zone::Guessing
    }
}

/// Handle one inbound chat line.
///
/// # Errors
///
/// Returns an error if the sender has not joined or the message is blank.
pub fn handle_chat(handle: &SessionHandle, session: &mut Session, client: ClientId, raw: &str) -> Result<(), GameError> {
    let Some(name) = session.player_name(client).map(str::to_string) else {
        return Err(GameError::NotAPlayer(client));
    };
    let message = raw.trim();
    if message.is_empty() {
        return Err(GameError::EmptyMessage);
    }

    let is_guess = !session.is_drawer(client)
        && session
            .round
            .live_prompt()
            .is_some_and(|prompt| prompt.trim().to_lowercase() == message.to_lowercase());

    if is_guess {
        if !session.round.has_guessed(client) {
            record_correct_guess(handle, session, client, &name);
        }
        return Ok(());
    }

    route_message(session, client, &name, message);
    Ok(())
}

fn record_correct_guess(handle: &SessionHandle, session: &mut Session, client: ClientId, name: &str) {
    session.round.correct_guessers.insert(client);

    let points = guess_points(percent_left(session, Instant::now()));
    if let Some(player) = session.players.get_mut(&client) {
        player.score += points;
    }
    if let Some(drawer) = session.round.drawer.and_then(|d| session.players.get_mut(&d)) {
        drawer.score += DRAWER_POINTS;
    }
    info!(room = %session.room, player = name, points, "correct guess");

    let notice = Frame::empty(EV_CHAT_MESSAGE)
        .with_data("type", "correct")
        .with_data("name", name)
        .with_data("sender_zone", Zone::Solved as u8);
    session.broadcast_all(&notice);
    session.broadcast_player_list();

    apply_guess_ratio_reveal(session);

    let guessers = session.guesser_count();
    if guessers > 0 && session.round.correct_guessers.len() >= guessers {
        end_round_and_rotate(handle, session);
    }
}

fn route_message(session: &Session, sender: ClientId, name: &str, message: &str) {
    let sender_zone = zone_of(session, sender);
    let frame = Frame::empty(EV_CHAT_MESSAGE)
        .with_data("name", name)
        .with_data("message", message)
        .with_data("sender_zone", sender_zone as u8);

    for client in session.players_except(None) {
        if zone_of(session, client) == sender_zone {
            session.send_to(client, frame.clone());
        }
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
