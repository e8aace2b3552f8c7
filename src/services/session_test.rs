use super::test_helpers::*;
use super::*;

#[test]
fn player_requires_name_and_avatar() {
    assert_eq!(Player::new(None, "", "cat"), Err(GameError::MissingProfile));
    assert_eq!(Player::new(None, "ann", "  "), Err(GameError::MissingProfile));
    let player = Player::new(Some("abc".into()), " ann ", "cat").unwrap();
    assert_eq!(player.name, "ann");
    assert_eq!(player.score, 0);
}

#[test]
fn order_rejects_duplicates() {
    let mut order = PlayerOrder::default();
    let id = Uuid::new_v4();
    assert!(order.push(id));
    assert!(!order.push(id));
    assert_eq!(order.len(), 1);
}

#[test]
fn repeat_join_refreshes_profile_without_duplicating() {
    let mut session = test_session(TEST_WORDS);
    let client = seat_player(&mut session, "ann");
    let renamed = Player::new(None, "annie", "dog").unwrap();
    assert!(!session.add_player(client.id, renamed));
    assert_eq!(session.player_count(), 1);
    assert_eq!(session.player_name(client.id), Some("annie"));
}

#[test]
fn removing_player_before_cursor_keeps_rotation_slot() {
    let mut session = test_session(TEST_WORDS);
    let a = seat_player(&mut session, "a");
    let _b = seat_player(&mut session, "b");
    let c = seat_player(&mut session, "c");
    session.drawer_index = 2;

    session.remove_player(a.id);
    assert_eq!(session.drawer_index, 1);
    assert_eq!(session.order.get(session.drawer_index), Some(c.id));
}

#[test]
fn removing_last_slot_wraps_cursor() {
    let mut session = test_session(TEST_WORDS);
    let _a = seat_player(&mut session, "a");
    let b = seat_player(&mut session, "b");
    session.drawer_index = 1;

    session.remove_player(b.id);
    assert_eq!(session.drawer_index, 0);
}

#[test]
fn removing_player_drops_them_from_correct_guessers() {
    let (mut session, clients) = session_mid_round("apple", 3);
    session.round.correct_guessers.insert(clients[1].id);
    session.remove_player(clients[1].id);
    assert!(session.round.correct_guessers.is_empty());
}

#[test]
fn removing_unknown_player_is_none() {
    let mut session = test_session(TEST_WORDS);
    assert!(session.remove_player(Uuid::new_v4()).is_none());
}

#[test]
fn player_list_is_in_join_order() {
    let mut session = test_session(TEST_WORDS);
    seat_player(&mut session, "zed");
    seat_player(&mut session, "amy");
    let data = session.player_list_data();
    let names: Vec<&str> = data["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["zed", "amy"]);
}

#[test]
fn broadcast_except_skips_sender() {
    let mut session = test_session(TEST_WORDS);
    let mut a = connect(&mut session);
    let mut b = connect(&mut session);

    session.broadcast_except(Some(a.id), &Frame::empty("clear"));
    assert!(a.drain().is_empty());
    assert_eq!(b.drain_events(), vec!["clear"]);
}

#[test]
fn broadcast_reaches_unjoined_connections() {
    let mut session = test_session(TEST_WORDS);
    let mut watcher = connect(&mut session);
    session.broadcast_all(&Frame::empty("lobbyReset"));
    assert_eq!(watcher.drain_events(), vec!["lobbyReset"]);
}

#[test]
fn send_to_disconnected_client_is_silent() {
    let mut session = test_session(TEST_WORDS);
    let mut a = connect(&mut session);
    session.disconnect(a.id);
    session.send_to(a.id, Frame::empty("clear"));
    assert!(a.drain().is_empty());
    assert_eq!(session.client_count(), 0);
}

#[test]
fn round_begin_sets_reveal_cap() {
    let round = Round::begin(7, Uuid::new_v4(), "apple".into());
    assert!(round.active);
    assert_eq!(round.max_reveals, 3);
    assert_eq!(round.prompt_len(), 5);
    assert!(round.is_current(7));
    assert!(!round.is_current(8));
}

#[test]
fn idle_round_is_never_current() {
    let round = Round::idle(3);
    assert!(!round.is_current(3));
    assert!(round.live_prompt().is_none());
}

#[test]
fn generations_increase() {
    let mut session = test_session(TEST_WORDS);
    let first = session.next_generation();
    assert!(session.next_generation() > first);
}

#[test]
fn guess_stage_orders_forward() {
    assert!(GuessStage::None < GuessStage::First);
    assert!(GuessStage::First < GuessStage::Second);
}
