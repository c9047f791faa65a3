#![allow(dead_code)]

pub mod proptest_prelude;

use std::sync::Arc;
use std::time::Duration;

use findmines::config::{GameConfig, ServerConfig};
use findmines::domain::SessionState;
use findmines::timer::ManualTimerFactory;
use findmines::{AppState, GameGateway, GameRegistry, GameSession};

// Logging is auto-installed for every test binary
#[ctor::ctor]
fn init_logging() {
    findmines_test_support::logging::init();
}

/// Registry on hand-driven timers; the factory exposes one probe per session.
pub fn manual_registry(defaults: GameConfig) -> (Arc<GameRegistry>, Arc<ManualTimerFactory>) {
    let timers = Arc::new(ManualTimerFactory::new(Duration::from_secs(1)));
    let registry = Arc::new(GameRegistry::new(defaults, timers.clone()));
    (registry, timers)
}

pub fn manual_gateway() -> (GameGateway, Arc<ManualTimerFactory>) {
    let (registry, timers) = manual_registry(GameConfig::default());
    (GameGateway::new(registry), timers)
}

pub fn test_app_state() -> AppState {
    let timers = Arc::new(ManualTimerFactory::default());
    AppState::new(ServerConfig::default(), timers)
}

/// Current player selects unselected bombs until the match is over.
pub fn play_out(session: &mut GameSession) {
    while session.state() == SessionState::Ongoing {
        let (x, y) = session
            .board()
            .expect("board")
            .tiles()
            .iter()
            .find(|t| t.is_bomb && !t.is_selected)
            .map(|t| (t.x, t.y))
            .expect("an unselected bomb remains");
        let actor = session.current_player().expect("current player").id.clone();
        session.select_tile(&actor, x, y).expect("select bomb");
    }
}

pub fn safe_tile(session: &GameSession) -> (usize, usize) {
    session
        .board()
        .expect("board")
        .tiles()
        .iter()
        .find(|t| !t.is_bomb && !t.is_selected)
        .map(|t| (t.x, t.y))
        .expect("a safe tile remains")
}
