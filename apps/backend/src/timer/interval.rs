use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

use super::{Tick, TickSink, TimerFactory, TurnTimer};

/// Wall-clock timer backed by a tokio task.
///
/// Must be started from within a tokio runtime.
pub struct IntervalTimer {
    sink: Arc<dyn TickSink>,
    interval: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTimer {
    pub fn new(sink: Arc<dyn TickSink>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            generation: 0,
            handle: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn spawn(&mut self) {
        let sink = Arc::clone(&self.sink);
        let period = self.interval;
        let generation = self.generation;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !sink.deliver(Tick { generation }) {
                    trace!(generation, "tick sink dropped; timer task exiting");
                    break;
                }
            }
        }));
    }
}

impl TurnTimer for IntervalTimer {
    fn start(&mut self, interval: Duration) -> bool {
        if self.is_running() {
            return false;
        }
        self.interval = interval;
        self.generation = self.generation.wrapping_add(1);
        self.spawn();
        true
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        // A tick already queued on the session lock carries the old number.
        self.generation = self.generation.wrapping_add(1);
    }

    fn reset(&mut self, interval: Option<Duration>) {
        self.stop();
        self.start(interval.unwrap_or(self.interval));
    }

    fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn is_current(&self, tick: Tick) -> bool {
        self.handle.is_some() && tick.generation == self.generation
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Production factory: one tokio-driven timer per session.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimerFactory {
    interval: Duration,
}

impl IntervalTimerFactory {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl TimerFactory for IntervalTimerFactory {
    fn build(&self, sink: Arc<dyn TickSink>) -> Box<dyn TurnTimer> {
        Box::new(IntervalTimer::new(sink, self.interval))
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
