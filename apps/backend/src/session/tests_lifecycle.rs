use crate::config::GameConfig;
use crate::domain::{SessionEvent, SessionState};
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::session::test_helpers::{bombs, current_id, play_out, safe_tile, seated, session, started};

fn drain(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[test]
fn start_needs_two_players() {
    let (mut s, probe) = seated(1, 2);
    let err = s.start().unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::NotEnoughPlayers, _)
    ));
    assert_eq!(s.state(), SessionState::NotStarted);
    assert!(s.board().is_none());
    assert!(!probe.is_running());
}

#[test]
fn start_deals_board_and_runs_countdown() {
    let (s, probe) = started();
    assert_eq!(s.state(), SessionState::Ongoing);
    let board = s.board().unwrap();
    assert_eq!(board.tiles().len(), 36);
    assert_eq!(board.bomb_count(), 3);
    assert!(s.current_player().is_some());
    assert_eq!(s.current_time(), 10);
    assert!(probe.is_running());
    assert!(!s.skip_pending());
    s.check_invariants().unwrap();
}

#[test]
fn start_twice_is_rejected() {
    let (mut s, probe) = started();
    let before = s.snapshot();
    let err = s.start().unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::PhaseMismatch, _)
    ));
    assert_eq!(s.snapshot(), before);
    assert_eq!(probe.starts(), 1);
}

#[test]
fn alternating_bomb_finds_finish_with_a_winner() {
    let (mut s, probe) = started();
    let first = current_id(&s);

    play_out(&mut s);

    assert_eq!(s.state(), SessionState::Finished);
    assert_eq!(s.bombs_found(), 3);
    assert_eq!(s.current_time(), -1);
    assert!(!probe.is_running());

    let winner = s.winner().unwrap();
    assert_eq!(winner.id, first);
    assert_eq!(winner.score, 2);
    let loser = s.players().iter().find(|p| p.id != first).unwrap();
    assert_eq!(loser.score, 1);
    s.check_invariants().unwrap();
}

#[test]
fn safe_tile_passes_the_turn_without_scoring() {
    let (mut s, _probe) = started();
    let first = current_id(&s);
    let (x, y) = safe_tile(&s);

    let outcome = s.select_tile(&first, x, y).unwrap();

    assert!(!outcome.tile.is_bomb);
    assert!(!outcome.finished);
    assert_ne!(current_id(&s), first);
    assert!(s.skip_pending());
    assert!(s.players().iter().all(|p| p.score == 0));
    assert_eq!(s.selected_tiles().len(), 1);
    s.check_invariants().unwrap();
}

#[test]
fn select_rejections_leave_session_untouched() {
    let (mut s, _probe) = started();
    s.admit_spectator("watcher", "Watcher").unwrap();
    let current = current_id(&s);
    let other = s
        .players()
        .iter()
        .find(|p| p.id != current)
        .unwrap()
        .id
        .clone();
    let before = s.snapshot();

    let err = s.select_tile(&other, 0, 0).unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::OutOfTurn, _)));

    let err = s.select_tile("watcher", 0, 0).unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::OutOfTurn, _)));

    let err = s.select_tile("stranger", 0, 0).unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Player, _)));

    let err = s.select_tile(&current, 6, 0).unwrap_err();
    assert!(matches!(err, DomainError::Validation(ValidationKind::OutOfBounds, _)));

    assert_eq!(s.snapshot(), before);
    s.check_invariants().unwrap();
}

#[test]
fn selected_tile_cannot_be_taken_again() {
    let (mut s, _probe) = started();
    let (x, y) = safe_tile(&s);
    let first = current_id(&s);
    s.select_tile(&first, x, y).unwrap();

    let second = current_id(&s);
    let before = s.snapshot();
    let err = s.select_tile(&second, x, y).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::TileAlreadySelected, _)
    ));
    assert_eq!(s.snapshot(), before);
}

#[test]
fn select_before_start_is_rejected() {
    let (mut s, _probe) = seated(2, 2);
    let err = s.select_tile("p0", 0, 0).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::PhaseMismatch, _)
    ));
}

#[test]
fn score_multiplier_applies_to_bomb_finds() {
    let (mut s, _probe) = session(GameConfig {
        score_multiplier: 5,
        ..GameConfig::default()
    });
    s.admit_player("a", "A").unwrap();
    s.admit_player("b", "B").unwrap();
    s.start().unwrap();
    let actor = current_id(&s);
    let (x, y) = bombs(&s)[0];

    let outcome = s.select_tile(&actor, x, y).unwrap();

    assert!(outcome.tile.is_bomb);
    assert_eq!(s.find_member(&actor).unwrap().score, 5);
    assert_eq!(s.bombs_found(), 1);
}

#[test]
fn oversized_bomb_count_is_rejected() {
    let (mut s, _probe) = seated(1, 2);
    let before = *s.config();

    for n in [40, 36, 0] {
        let err = s.set_number_of_bombs(n).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::InvalidBombCount, _)
        ));
    }
    assert_eq!(*s.config(), before);
}

#[test]
fn bomb_count_divisible_by_max_players_is_rejected() {
    let (mut s, _probe) = seated(1, 2);
    let err = s.set_number_of_bombs(4).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidBombCount, _)
    ));
    s.set_number_of_bombs(5).unwrap();
    assert_eq!(s.config().bomb_count, 5);
}

#[test]
fn board_size_must_hold_the_bombs() {
    let (mut s, _probe) = seated(1, 2);

    let err = s.set_board_size(0, 5).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidBoardSize, _)
    ));
    let err = s.set_board_size(3, 1).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidBoardSize, _)
    ));
    assert_eq!((s.config().width, s.config().height), (6, 6));

    s.set_board_size(8, 4).unwrap();
    assert_eq!((s.config().width, s.config().height), (8, 4));
    assert_eq!(s.snapshot().board_width, 8);
}

#[test]
fn oversized_board_is_refused_and_start_still_works() {
    let (mut s, _probe) = seated(2, 2);
    let before = *s.config();

    for (w, h) in [(1usize << 32, 1usize << 32), (100_000, 100_000), (101, 100)] {
        let err = s.set_board_size(w, h).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::InvalidBoardSize, _)
        ));
    }
    assert_eq!(*s.config(), before);

    s.set_board_size(100, 100).unwrap();
    s.start().unwrap();
    assert_eq!(s.board().unwrap().tiles().len(), 10_000);
}

#[test]
fn new_board_uses_updated_size() {
    let (mut s, _probe) = seated(2, 2);
    s.set_board_size(4, 3).unwrap();
    s.start().unwrap();
    let board = s.board().unwrap();
    assert_eq!((board.width(), board.height()), (4, 3));
    assert_eq!(board.tiles().len(), 12);
}

#[test]
fn max_players_recomputes_lobby_state() {
    let (mut s, _probe) = seated(2, 2);
    assert_eq!(s.state(), SessionState::Ready);

    s.set_max_players(3).unwrap();
    assert_eq!(s.state(), SessionState::NotStarted);

    let err = s.set_max_players(1).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidMaxPlayers, _)
    ));

    s.admit_player("p2", "Player 2").unwrap();
    let err = s.set_max_players(2).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidMaxPlayers, _)
    ));
    assert_eq!(s.state(), SessionState::Ready);
}

#[test]
fn configuration_is_locked_during_play() {
    let (mut s, _probe) = started();
    let before = *s.config();

    for result in [
        s.set_number_of_bombs(5),
        s.set_board_size(7, 7),
        s.set_max_players(3),
        s.set_wait_time(5),
    ] {
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationKind::PhaseMismatch, _))
        ));
    }
    assert_eq!(*s.config(), before);
}

#[test]
fn wait_time_must_be_positive() {
    let (mut s, _probe) = seated(2, 2);
    let err = s.set_wait_time(0).unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::InvalidWaitTime, _)
    ));
    s.set_wait_time(4).unwrap();
    s.start().unwrap();
    assert_eq!(s.current_time(), 4);
}

#[test]
fn pause_and_resume_drive_the_timer() {
    let (mut s, probe) = started();

    s.pause().unwrap();
    assert_eq!(s.state(), SessionState::Paused);
    assert!(!probe.is_running());

    // Pausing again is refused but harmless.
    assert!(s.pause().is_err());
    assert_eq!(s.state(), SessionState::Paused);

    assert_eq!(s.toggle_pause().unwrap(), SessionState::Ongoing);
    assert!(probe.is_running());
    assert!(s.resume().is_err());

    assert_eq!(s.toggle_pause().unwrap(), SessionState::Paused);
    s.check_invariants().unwrap();
}

#[test]
fn toggle_pause_outside_play_is_rejected() {
    let (mut s, _probe) = seated(2, 2);
    assert!(matches!(
        s.toggle_pause(),
        Err(DomainError::Validation(ValidationKind::PhaseMismatch, _))
    ));
}

#[test]
fn play_again_lets_the_winner_start() {
    let (mut s, probe) = started();
    play_out(&mut s);
    let winner = s.winner().unwrap().id.clone();

    assert_eq!(s.play_again().unwrap(), SessionState::Ongoing);

    assert_eq!(current_id(&s), winner);
    assert!(s.players().iter().all(|p| p.score == 0));
    assert!(s.selected_tiles().is_empty());
    assert_eq!(s.bombs_found(), 0);
    assert_eq!(s.current_time(), 10);
    assert!(probe.is_running());
    s.check_invariants().unwrap();
}

#[test]
fn play_again_with_a_lone_player_returns_to_lobby() {
    let (mut s, _probe) = started();
    play_out(&mut s);
    s.remove_member("p1").unwrap();
    assert_eq!(s.state(), SessionState::Finished);

    assert_eq!(s.play_again().unwrap(), SessionState::NotStarted);
    assert!(s.board().is_none());
    assert!(s.current_player().is_none());
    s.check_invariants().unwrap();
}

#[test]
fn play_again_requires_finished() {
    let (mut s, _probe) = started();
    assert!(s.play_again().is_err());
    assert_eq!(s.state(), SessionState::Ongoing);
}

#[test]
fn reset_board_follows_the_start_path() {
    let (mut s, probe) = seated(2, 3);
    assert_eq!(s.reset_board().unwrap(), SessionState::Ongoing);
    assert!(s.board().is_some());
    assert!(probe.is_running());

    let err = s.reset_board().unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation(ValidationKind::PhaseMismatch, _)
    ));

    play_out(&mut s);
    assert_eq!(s.reset_board().unwrap(), SessionState::Ongoing);
    assert!(s.players().iter().all(|p| p.score == 0));
    s.check_invariants().unwrap();
}

#[test]
fn reset_board_without_enough_players_stays_in_lobby() {
    let (mut s, probe) = seated(1, 2);
    assert_eq!(s.reset_board().unwrap(), SessionState::NotStarted);
    assert!(s.board().is_none());
    assert!(!probe.is_running());
}

#[test]
fn snapshot_hides_unselected_bombs() {
    let (mut s, _probe) = started();
    let actor = current_id(&s);
    let (x, y) = bombs(&s)[0];
    s.select_tile(&actor, x, y).unwrap();

    let snapshot = s.snapshot();
    assert_eq!(snapshot.selected_tiles.len(), 1);
    assert_eq!(snapshot.selected_tiles[0].is_bomb, Some(true));
    assert_eq!(snapshot.number_of_bombs_found, 1);

    let board = s.public_board();
    assert_eq!(board.len(), 36);
    assert_eq!(board.iter().filter(|t| t.is_bomb.is_some()).count(), 1);
}

#[test]
fn start_announces_state_turn_and_countdown() {
    let (mut s, _probe) = seated(2, 2);
    let mut rx = s.subscribe();

    s.start().unwrap();
    let events = drain(&mut rx);
    let current = current_id(&s);

    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::StateChanged {
            from: SessionState::Ready,
            to: SessionState::Ongoing,
            ..
        }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::NextPlayer { player, .. } if player.id == current)));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Tick { remaining: 10, .. })));
}

#[test]
fn finishing_announces_the_winner() {
    let (mut s, _probe) = started();
    let mut rx = s.subscribe();
    play_out(&mut s);
    let winner = s.winner().unwrap().id.clone();

    let events = drain(&mut rx);
    let winners: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Winner { player, .. } => Some(player.id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(winners, vec![winner]);
}

#[test]
fn rejected_operations_emit_nothing() {
    let (mut s, _probe) = started();
    let mut rx = s.subscribe();
    let _ = s.start();
    let _ = s.select_tile("nobody", 0, 0);
    assert!(drain(&mut rx).is_empty());
}
