use std::sync::Arc;
use std::time::Duration;

use crate::config::GameConfig;
use crate::domain::SessionState;
use crate::session::test_helpers::{current_id, safe_tile, session, started};
use crate::session::{spawn_session, TickOutcome};
use crate::timer::{ManualTimerFactory, Tick};

#[test]
fn countdown_hitting_zero_passes_the_turn() {
    let (mut s, probe) = session(GameConfig {
        wait_time_secs: 3,
        ..GameConfig::default()
    });
    s.admit_player("a", "A").unwrap();
    s.admit_player("b", "B").unwrap();
    s.start().unwrap();
    let first = current_id(&s);

    assert_eq!(s.tick().unwrap(), TickOutcome::Counted { remaining: 2 });
    assert_eq!(s.tick().unwrap(), TickOutcome::Counted { remaining: 1 });
    assert_eq!(s.current_time(), 1);
    let resets = probe.resets();

    let outcome = s.tick().unwrap();

    let second = current_id(&s);
    assert_ne!(second, first);
    assert_eq!(outcome, TickOutcome::TurnAdvanced { player_id: second });
    assert_eq!(s.current_time(), 3);
    assert!(!s.skip_pending());
    assert_eq!(probe.resets(), resets + 1);
    s.check_invariants().unwrap();
}

#[test]
fn tick_after_a_move_is_skipped_once() {
    let (mut s, _probe) = started();
    let actor = current_id(&s);
    let (x, y) = safe_tile(&s);
    s.select_tile(&actor, x, y).unwrap();
    assert_eq!(s.current_time(), 10);

    assert_eq!(s.tick().unwrap(), TickOutcome::Skipped);
    assert_eq!(s.current_time(), 10);
    assert_eq!(s.tick().unwrap(), TickOutcome::Counted { remaining: 9 });
}

#[test]
fn ticks_outside_play_are_ignored() {
    let (mut s, _probe) = started();
    s.pause().unwrap();
    let before = s.current_time();
    assert_eq!(s.tick().unwrap(), TickOutcome::Ignored);
    assert_eq!(s.current_time(), before);

    let (mut lobby, _probe) = session(GameConfig::default());
    assert_eq!(lobby.tick().unwrap(), TickOutcome::Ignored);
    assert_eq!(lobby.current_time(), -1);
}

#[test]
fn ticks_from_an_old_generation_are_dropped() {
    let (mut s, probe) = started();
    let stale = probe.current_tick();
    let actor = current_id(&s);
    let (x, y) = safe_tile(&s);
    s.select_tile(&actor, x, y).unwrap();

    assert_eq!(s.handle_timer_tick(stale).unwrap(), TickOutcome::Stale);
    assert_eq!(s.current_time(), 10);

    let fresh = probe.current_tick();
    assert_eq!(s.handle_timer_tick(fresh).unwrap(), TickOutcome::Skipped);
}

#[test]
fn nothing_is_counted_after_stop() {
    let (mut s, probe) = started();
    let tick = probe.current_tick();
    s.pause().unwrap();
    assert_eq!(s.handle_timer_tick(tick).unwrap(), TickOutcome::Stale);
    assert_eq!(
        s.handle_timer_tick(probe.current_tick()).unwrap(),
        TickOutcome::Stale
    );
    assert_eq!(s.current_time(), 10);
}

#[test]
fn shared_session_receives_timer_ticks() {
    let timers = ManualTimerFactory::new(Duration::from_millis(250));
    let shared = spawn_session("SHARED1", GameConfig::default(), &timers, Some(11)).unwrap();
    {
        let mut s = shared.lock();
        s.admit_player("a", "A").unwrap();
        s.admit_player("b", "B").unwrap();
        s.start().unwrap();
    }
    let probe = timers.last_probe().unwrap();
    assert_eq!(probe.interval(), Some(Duration::from_millis(250)));

    assert!(probe.fire());
    assert!(probe.fire());
    assert_eq!(shared.lock().current_time(), 8);

    {
        let mut s = shared.lock();
        s.remove_member("a").unwrap();
        s.remove_member("b").unwrap();
        assert_eq!(s.state(), SessionState::Empty);
    }
    assert!(!probe.fire());
    assert!(!probe.fire_tick(Tick { generation: 0 }));
}

#[test]
fn dropped_session_ends_delivery() {
    let timers = ManualTimerFactory::default();
    let shared = spawn_session("DROPPED", GameConfig::default(), &timers, None).unwrap();
    let probe = timers.last_probe().unwrap();
    assert_eq!(Arc::strong_count(&shared), 1);

    drop(shared);
    assert!(!probe.fire_tick(probe.current_tick()));
}

#[test]
fn invalid_config_is_refused_up_front() {
    let timers = ManualTimerFactory::default();
    let result = spawn_session(
        "BADCONF",
        GameConfig {
            bomb_count: 36,
            ..GameConfig::default()
        },
        &timers,
        None,
    );
    assert!(result.is_err());
    assert!(timers.probes().is_empty());
}
