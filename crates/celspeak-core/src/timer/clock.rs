//! Clock source: the only timing primitive the session depends on.
//!
//! A subscription delivers one tick per elapsed period, tagged with the
//! generation it was created for, until it is cancelled. Subscribing again
//! cancels the previous subscription first, so at most one is ever alive.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use super::session::Generation;

/// Callback invoked on every tick with the subscription's generation.
pub type TickCallback = Arc<dyn Fn(Generation) + Send + Sync>;

pub trait ClockSource: Send {
    /// Start ticking for `generation`, replacing any live subscription.
    fn subscribe(&mut self, generation: Generation);

    /// Stop ticking. No tick is delivered after this returns.
    fn unsubscribe(&mut self);

    /// Generation of the live subscription, if any.
    fn active(&self) -> Option<Generation>;
}

/// Tokio-backed clock. Each subscription is a spawned interval task that is
/// aborted on unsubscribe.
pub struct TokioClock {
    period: Duration,
    on_tick: TickCallback,
    handle: Handle,
    task: Option<(Generation, JoinHandle<()>)>,
}

impl TokioClock {
    /// Create a clock bound to the current tokio runtime.
    ///
    /// # Errors
    /// Returns an error when called outside a tokio runtime.
    pub fn new(
        period: Duration,
        on_tick: TickCallback,
    ) -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self {
            period: period.max(Duration::from_millis(1)),
            on_tick,
            handle: Handle::try_current()?,
            task: None,
        })
    }
}

impl ClockSource for TokioClock {
    fn subscribe(&mut self, generation: Generation) {
        self.unsubscribe();
        let period = self.period;
        let on_tick = Arc::clone(&self.on_tick);
        let task = self.handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                on_tick(generation);
            }
        });
        tracing::debug!(target: "celspeak::clock", "subscribed generation {generation}");
        self.task = Some((generation, task));
    }

    fn unsubscribe(&mut self) {
        if let Some((generation, task)) = self.task.take() {
            task.abort();
            tracing::debug!(target: "celspeak::clock", "unsubscribed generation {generation}");
        }
    }

    fn active(&self) -> Option<Generation> {
        self.task.as_ref().map(|(generation, _)| *generation)
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    active: Option<Generation>,
    subscribes: usize,
    unsubscribes: usize,
}

/// Clock that never ticks on its own. Tests drive ticks by hand and inspect
/// which generation is subscribed.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut ManualState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn subscribe_count(&self) -> usize {
        self.with(|s| s.subscribes)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.with(|s| s.unsubscribes)
    }
}

impl ClockSource for ManualClock {
    fn subscribe(&mut self, generation: Generation) {
        self.with(|s| {
            s.active = Some(generation);
            s.subscribes += 1;
        });
    }

    fn unsubscribe(&mut self) {
        self.with(|s| {
            if s.active.take().is_some() {
                s.unsubscribes += 1;
            }
        });
    }

    fn active(&self) -> Option<Generation> {
        self.with(|s| s.active)
    }
}
