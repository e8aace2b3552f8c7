//! Reveal engine: progressive disclosure of the prompt to guessers.
//!
//! DESIGN
//! ======
//! Letters are disclosed by two triggers: a per-round timer that fires at
//! 25%, 50%, and 75% of the round, and guess progress (40% and 70% of
//! guessers correct). Both funnel into `reveal_random_letters`, which enforces
//! the per-round cap from `compute_max_reveals`, so no combination of
//! triggers can leak more than the cap.
//!
//! The timer never holds the session lock while sleeping. On each wake it
//! re-checks that its round is still active and still the same generation;
//! a mismatch means the round ended or was replaced, and the task exits.

use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::frame::{EV_LETTER_REVEAL, Frame};
use crate::services::session::{GuessStage, Session, SessionHandle};

/// Word length from which the timer reveals extra letters.
const LONG_WORD_LEN: usize = 9;

const FIRST_STAGE_RATIO: f64 = 0.4;
const SECOND_STAGE_RATIO: f64 = 0.7;

/// Render the prompt for guessers: non-letters and revealed letters as
/// themselves, everything else as `_`, space-separated.
#[must_use]
pub fn build_masked_word(prompt: &str, revealed: &BTreeSet<usize>) -> String {
    prompt
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            if !ch.is_alphabetic() || revealed.contains(&i) {
                ch.to_string()
            } else {
                "_".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reveal up to `count` random unrevealed letters and push the new mask to
/// every player except the drawer. Returns how many letters were revealed.
pub fn reveal_random_letters(session: &mut Session, count: usize) -> usize {
    let round = &session.round;
    let Some(prompt) = round.live_prompt() else {
        return 0;
    };

    let unrevealed: Vec<usize> = prompt
        .chars()
        .enumerate()
        .filter(|(i, ch)| ch.is_alphabetic() && !round.revealed.contains(i))
        .map(|(i, _)| i)
        .collect();
    let capacity = round.max_reveals.saturating_sub(round.revealed.len());
    let take = count.min(capacity).min(unrevealed.len());
    if take == 0 {
        return 0;
    }

    let chosen: Vec<usize> = unrevealed
        .choose_multiple(&mut rand::rng(), take)
        .copied()
        .collect();
    session.round.revealed.extend(chosen);

    let Some(prompt) = session.round.prompt.as_deref() else {
        return 0;
    };
    let mask = build_masked_word(prompt, &session.round.revealed);
    debug!(room = %session.room, revealed = session.round.revealed.len(), max = session.round.max_reveals, "letters revealed");

    let frame = Frame::empty(EV_LETTER_REVEAL).with_data("mask", mask);
    for client in session.players_except(session.round.drawer) {
        session.send_to(client, frame.clone());
    }
    take
}

/// Letters to reveal at time checkpoint `checkpoint` (0, 1, 2 for 25/50/75%).
#[must_use]
pub fn checkpoint_reveal_count(checkpoint: usize, prompt_len: usize, anyone_guessed: bool) -> usize {
    let long = prompt_len >= LONG_WORD_LEN;
    match checkpoint {
        0 => 1,
        1 => 1 + usize::from(long && !anyone_guessed),
        _ => 1 + usize::from(long),
    }
}

/// Timer task for one round's time-based reveals.
pub async fn manage_time_reveals(handle: SessionHandle, generation: u64, started_at: Instant, prompt_len: usize) {
    let checkpoints = handle.lock().await.timing.reveal_checkpoints();

    for (checkpoint, offset) in checkpoints.into_iter().enumerate() {
        sleep_until(started_at + offset).await;

        let mut session = handle.lock().await;
        if !session.round.is_current(generation) {
            debug!(room = %session.room, generation, "reveal timer stale, exiting");
            return;
        }

        let anyone_guessed = !session.round.correct_guessers.is_empty();
        let count = checkpoint_reveal_count(checkpoint, prompt_len, anyone_guessed);
        let revealed = reveal_random_letters(&mut session, count);
        info!(room = %session.room, checkpoint, revealed, "timed reveal");
    }
}

/// Reveal one letter the first time guess progress crosses 40% and again at
/// 70%. A guess crossing both at once only fires the 70% stage.
pub fn apply_guess_ratio_reveal(session: &mut Session) {
    let guessers = session.guesser_count();
    if guessers == 0 {
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let ratio = session.round.correct_guessers.len() as f64 / guessers as f64;
    let stage = session.round.guess_stage;

    let next = if ratio >= SECOND_STAGE_RATIO && stage < GuessStage::Second {
        GuessStage::Second
    } else if ratio >= FIRST_STAGE_RATIO && stage < GuessStage::First {
        GuessStage::First
    } else {
        return;
    };

    reveal_random_letters(session, 1);
    session.round.guess_stage = next;
}

#[cfg(test)]
#[path = "reveal_test.rs"]
mod tests;
