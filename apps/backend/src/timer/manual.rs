//! Hand-driven timer for tests and simulations.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Tick, TickSink, TimerFactory, TurnTimer};

#[derive(Debug, Default, Clone)]
struct ManualState {
    running: bool,
    interval: Option<Duration>,
    generation: u64,
    starts: u32,
    stops: u32,
    resets: u32,
}

/// Shared view into a [`ManualTimer`] after it has been boxed into a session.
#[derive(Clone)]
pub struct ManualTimerProbe {
    state: Arc<Mutex<ManualState>>,
    sink: Option<Arc<dyn TickSink>>,
}

impl ManualTimerProbe {
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn interval(&self) -> Option<Duration> {
        self.state.lock().interval
    }

    pub fn starts(&self) -> u32 {
        self.state.lock().starts
    }

    pub fn stops(&self) -> u32 {
        self.state.lock().stops
    }

    pub fn resets(&self) -> u32 {
        self.state.lock().resets
    }

    /// Tick stamped with the current generation.
    pub fn current_tick(&self) -> Tick {
        Tick {
            generation: self.state.lock().generation,
        }
    }

    /// Push one tick through the sink, as the wall clock would.
    /// Returns `false` if the timer is stopped or has no sink.
    pub fn fire(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        let tick = self.current_tick();
        self.sink.as_ref().is_some_and(|sink| sink.deliver(tick))
    }

    /// Deliver an arbitrary (possibly stale) tick.
    pub fn fire_tick(&self, tick: Tick) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.deliver(tick))
    }
}

/// Timer that only records calls; ticks are produced by [`ManualTimerProbe`].
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
    sink: Option<Arc<dyn TickSink>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState::default())),
            sink: None,
        }
    }

    pub fn with_sink(sink: Arc<dyn TickSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    pub fn probe(&self) -> ManualTimerProbe {
        ManualTimerProbe {
            state: Arc::clone(&self.state),
            sink: self.sink.clone(),
        }
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnTimer for ManualTimer {
    fn start(&mut self, interval: Duration) -> bool {
        let mut state = self.state.lock();
        if state.running {
            return false;
        }
        state.running = true;
        state.interval = Some(interval);
        state.generation += 1;
        state.starts += 1;
        true
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        if state.running {
            state.stops += 1;
        }
        state.running = false;
        state.generation += 1;
    }

    fn reset(&mut self, interval: Option<Duration>) {
        let previous = self.state.lock().interval;
        self.stop();
        self.state.lock().resets += 1;
        self.start(interval.or(previous).unwrap_or(Duration::from_secs(1)));
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn is_current(&self, tick: Tick) -> bool {
        let state = self.state.lock();
        state.running && state.generation == tick.generation
    }
}

/// Factory handing out [`ManualTimer`]s and keeping their probes, newest last.
pub struct ManualTimerFactory {
    interval: Duration,
    probes: Mutex<Vec<ManualTimerProbe>>,
}

impl ManualTimerFactory {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn last_probe(&self) -> Option<ManualTimerProbe> {
        self.probes.lock().last().cloned()
    }

    pub fn probes(&self) -> Vec<ManualTimerProbe> {
        self.probes.lock().clone()
    }
}

impl Default for ManualTimerFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TimerFactory for ManualTimerFactory {
    fn build(&self, sink: Arc<dyn TickSink>) -> Box<dyn TurnTimer> {
        let timer = ManualTimer::with_sink(sink);
        self.probes.lock().push(timer.probe());
        Box::new(timer)
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
