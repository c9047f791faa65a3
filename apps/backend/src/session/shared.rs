use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::warn;

use crate::config::GameConfig;
use crate::domain::{GameId, SessionState};
use crate::errors::domain::DomainError;
use crate::timer::{Tick, TickSink, TimerFactory};

use super::GameSession;

/// A session behind its lock. Player operations and timer ticks both go
/// through this mutex, so they never interleave.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Delivers timer ticks into the owning session. Holds a weak reference so a
/// dropped session ends its timer task.
struct SessionTickSink {
    session: Weak<Mutex<GameSession>>,
}

impl TickSink for SessionTickSink {
    fn deliver(&self, tick: Tick) -> bool {
        let Some(session) = self.session.upgrade() else {
            return false;
        };
        let mut guard = session.lock();
        if guard.state() == SessionState::Empty {
            return false;
        }
        if let Err(err) = guard.handle_timer_tick(tick) {
            warn!(game_id = %guard.id(), error = %err, "Timer tick failed");
        }
        true
    }
}

/// Build a shared session whose timer feeds ticks back into it.
pub fn spawn_session(
    id: impl Into<GameId>,
    config: GameConfig,
    timers: &dyn TimerFactory,
    seed: Option<u64>,
) -> Result<SharedSession, DomainError> {
    config.validate()?;
    let id = id.into();
    let interval = timers.interval();
    Ok(Arc::new_cyclic(|weak: &Weak<Mutex<GameSession>>| {
        let sink: Arc<dyn TickSink> = Arc::new(SessionTickSink {
            session: weak.clone(),
        });
        let timer = timers.build(sink);
        Mutex::new(GameSession::from_parts(id, config, timer, interval, seed))
    }))
}
