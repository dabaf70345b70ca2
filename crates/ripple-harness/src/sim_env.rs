//! Virtual-clock environment.

use std::{
    ops::Sub,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use ripple_core::Environment;
use tokio::sync::watch;

/// Instant on the virtual clock (nanoseconds since simulation start).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(u64);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(rhs.0))
    }
}

/// Auto-advancing virtual clock.
///
/// Every `sleep` completes immediately and advances the clock by the
/// requested duration, so backoff waits and timeout races resolve
/// deterministically and a full retry-exhaustion cycle runs in
/// microseconds of real time. Elapsed virtual time remains observable for
/// assertions.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    clock: Arc<AtomicU64>,
}

impl SimEnv {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.clock.load(Ordering::SeqCst))
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.clock.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let clock = Arc::clone(&self.clock);
        async move {
            clock.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        }
    }
}

/// Manually-stepped virtual clock.
///
/// Unlike [`SimEnv`], sleeps here stay pending until [`advance`] moves the
/// clock past their deadline. A test can hold a backoff wait open,
/// interleave commands against it, and release it on its own schedule.
///
/// [`advance`]: SteppedEnv::advance
#[derive(Debug, Clone)]
pub struct SteppedEnv {
    clock: Arc<AtomicU64>,
    tick: watch::Sender<()>,
}

impl Default for SteppedEnv {
    fn default() -> Self {
        Self { clock: Arc::default(), tick: watch::Sender::new(()) }
    }
}

impl SteppedEnv {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.clock.load(Ordering::SeqCst))
    }

    /// Advance the clock, releasing every sleep whose deadline has passed.
    pub fn advance(&self, duration: Duration) {
        self.clock.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
        let _ = self.tick.send(());
    }
}

impl Environment for SteppedEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.clock.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let clock = Arc::clone(&self.clock);
        // Subscribing before the first deadline check makes later sends
        // observable through `changed`; an advance can never slip between
        // the check and the wait.
        let mut tick = self.tick.subscribe();
        async move {
            let deadline =
                clock.load(Ordering::SeqCst).saturating_add(duration.as_nanos() as u64);
            while clock.load(Ordering::SeqCst) < deadline {
                if tick.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}
