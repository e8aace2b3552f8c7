//! Lobby: players joining and leaving a room.
//!
//! DESIGN
//! ======
//! Joining seats a player and either syncs them into the running round or
//! moves the room toward its first round (which starts on the second
//! player). Leaving repairs everything that referenced the player: drawer
//! cursor, guesser set, the round itself when the drawer walks out, and the
//! lobby when the room is down to one player.

use tracing::info;

use crate::frame::{EV_CHAT_MESSAGE, EV_WAITING_FOR_PLAYERS, Frame};
use crate::services::canvas::replay_to;
use crate::services::round::{
    broadcast_prompt_reveal, end_round_and_rotate, reset_lobby, send_round_state, start_new_round,
};
use crate::services::session::{ClientId, GameError, Player, Session, SessionHandle};

const WAITING_MESSAGE: &str = "Waiting for one more person...";

fn send_waiting(session: &Session, client: ClientId) {
    session.send_to(client, Frame::empty(EV_WAITING_FOR_PLAYERS).with_data("message", WAITING_MESSAGE));
}

/// Seat a player.
///
/// # Errors
///
/// Returns `GameError::MissingProfile` if name or avatar is missing.
pub fn join(
    handle: &SessionHandle,
    session: &mut Session,
    client: ClientId,
    id: Option<String>,
    name: &str,
    avatar: &str,
) -> Result<(), GameError> {
    let player = Player::new(id, name, avatar)?;
    let added = session.add_player(client, player);
    info!(room = %session.room, %client, players = session.player_count(), added, "player joined");

    if session.round.active {
        send_round_state(session, client);
        replay_to(session, client);
    } else if session.player_count() == 1 {
        send_waiting(session, client);
    } else if added && session.player_count() == 2 {
        session.drawer_index = 0;
        start_new_round(handle, session);
    }

    session.broadcast_player_list();
    Ok(())
}

/// Unseat a player after their connection closes. Unknown clients are ignored.
pub fn leave(handle: &SessionHandle, session: &mut Session, client: ClientId) {
    let was_drawer = session.is_drawer(client);
    let Some(player) = session.remove_player(client) else {
        return;
    };
    info!(room = %session.room, %client, remaining = session.player_count(), "player left");

    let notice = Frame::empty(EV_CHAT_MESSAGE)
        .with_data("type", "leave")
        .with_data("message", format!("{} left the game.", player.name))
        .with_data("sender_zone", 2);
    session.broadcast_all(&notice);
    session.broadcast_player_list();

    if session.player_count() <= 1 {
        if session.round.active {
            broadcast_prompt_reveal(session);
        }
        reset_lobby(session);
        if let Some(survivor) = session.order.get(0) {
            send_waiting(session, survivor);
        }
        return;
    }

    if !session.round.active {
        return;
    }

    if was_drawer {
        info!(room = %session.room, "drawer left mid-round, advancing");
        broadcast_prompt_reveal(session);
        session.round.active = false;
        // The removal already slid the next player under the cursor.
        start_new_round(handle, session);
        return;
    }

    let guessers = session.guesser_count();
    if session.round.started_at.is_some() && guessers > 0 && session.round.correct_guessers.len() >= guessers {
        end_round_and_rotate(handle, session);
    }
}

#[cfg(test)]
#[path = "lobby_test.rs"]
mod tests;
