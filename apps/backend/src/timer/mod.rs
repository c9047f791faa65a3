//! Per-turn countdown.
//!
//! A timer never calls into session state directly. It emits [`Tick`]
//! messages through a [`TickSink`], which delivers them inside the owning
//! session's lock. Every `stop`/`reset` starts a new generation; ticks from an
//! older generation are dropped by the session, so nothing is observed after
//! `stop()` returns.

use std::sync::Arc;
use std::time::Duration;

pub mod interval;
pub mod manual;

pub use interval::{IntervalTimer, IntervalTimerFactory};
pub use manual::{ManualTimer, ManualTimerFactory, ManualTimerProbe};

/// One countdown step, stamped with the generation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Where a running timer sends its ticks.
pub trait TickSink: Send + Sync + 'static {
    /// Deliver one tick. Returns `false` once the receiver is gone, which
    /// ends the timer task.
    fn deliver(&self, tick: Tick) -> bool;
}

/// Resettable periodic countdown owned by a session.
pub trait TurnTimer: Send {
    /// Begin ticking every `interval`. No-op returning `false` if already
    /// running.
    fn start(&mut self, interval: Duration) -> bool;

    /// Cancel future ticks. Idempotent.
    fn stop(&mut self);

    /// Stop, then start again with `interval` or the last interval used.
    fn reset(&mut self, interval: Option<Duration>);

    fn is_running(&self) -> bool;

    /// Whether `tick` belongs to the current, still running generation.
    fn is_current(&self, tick: Tick) -> bool;
}

/// Builds the timer for a new session once its tick sink exists.
pub trait TimerFactory: Send + Sync + 'static {
    fn build(&self, sink: Arc<dyn TickSink>) -> Box<dyn TurnTimer>;

    /// Cadence sessions pass to `start`.
    fn interval(&self) -> Duration;
}
