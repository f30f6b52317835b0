//! Software timers backed by Tokio tasks.
//!
//! Each [`Timer`] slot owns at most one pending task. Arming a slot that is
//! already armed replaces the pending schedule, and cancelling is idempotent.
//!
//! A firing carries the generation it was scheduled under. A firing that
//! races a cancel or a re-arm can still reach the sink; the consumer drops it
//! by checking [`TimerService::is_current`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use swinggate_core::TimerId;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::types::TimerMode;

/// One expiry of a timer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFiring {
    pub id: TimerId,
    pub generation: u64,
}

/// Receiver of timer firings. Called from the timer task.
pub type TimerSink = Arc<dyn Fn(TimerFiring) + Send + Sync>;

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    armed: bool,
}

/// A single exclusive timer slot.
pub struct Timer {
    id: TimerId,
    sink: TimerSink,
    state: Arc<Mutex<SlotState>>,
    task: Option<AbortHandle>,
}

impl Timer {
    pub fn new(id: TimerId, sink: TimerSink) -> Self {
        Self {
            id,
            sink,
            state: Arc::new(Mutex::new(SlotState::default())),
            task: None,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Schedule the slot, replacing any pending schedule.
    ///
    /// One-shot timers fire once after `period`. Periodic timers fire every
    /// `period` until cancelled. Must be called from within a Tokio runtime.
    pub fn arm(&mut self, mode: TimerMode, period: Duration) {
        self.abort_task();
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.armed = true;
            state.generation
        };

        debug!(timer = ?self.id, ?mode, period_ms = period.as_millis() as u64, generation, "Timer armed");

        let firing = TimerFiring {
            id: self.id,
            generation,
        };
        let state = self.state.clone();
        let sink = self.sink.clone();

        let handle = match mode {
            TimerMode::OneShot => tokio::spawn(async move {
                tokio::time::sleep(period).await;
                {
                    let mut state = lock(&state);
                    if state.generation != generation {
                        return;
                    }
                    state.armed = false;
                }
                trace!(timer = ?firing.id, generation, "Timer fired");
                sink(firing);
            }),
            TimerMode::Periodic => tokio::spawn(async move {
                let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticks.tick().await;
                    if lock(&state).generation != generation {
                        return;
                    }
                    trace!(timer = ?firing.id, generation, "Timer tick");
                    sink(firing);
                }
            }),
        };
        self.task = Some(handle.abort_handle());
    }

    /// Cancel any pending schedule. Safe to call when not armed.
    pub fn cancel(&mut self) {
        self.abort_task();
        let mut state = lock(&self.state);
        if state.armed {
            trace!(timer = ?self.id, "Timer cancelled");
        }
        state.generation += 1;
        state.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.state).armed
    }

    /// Returns `true` if `firing` belongs to the current schedule of this slot.
    pub fn is_current(&self, firing: &TimerFiring) -> bool {
        // A one-shot clears `armed` right before firing, so only the
        // generation decides.
        firing.id == self.id && lock(&self.state).generation == firing.generation
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.abort_task();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("generation", &state.generation)
            .field("armed", &state.armed)
            .finish()
    }
}

/// The fixed set of timer slots used by the gate controller.
///
/// All slots deliver their firings to one shared sink.
#[derive(Debug)]
pub struct TimerService {
    slots: Vec<Timer>,
}

impl TimerService {
    pub fn new(sink: impl Fn(TimerFiring) + Send + Sync + 'static) -> Self {
        let sink: TimerSink = Arc::new(sink);
        Self {
            slots: TimerId::ALL
                .iter()
                .map(|id| Timer::new(*id, sink.clone()))
                .collect(),
        }
    }

    pub fn arm(&mut self, id: TimerId, mode: TimerMode, period: Duration) {
        if let Some(slot) = self.slot_mut(id) {
            slot.arm(mode, period);
        }
    }

    pub fn cancel(&mut self, id: TimerId) {
        if let Some(slot) = self.slot_mut(id) {
            slot.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            slot.cancel();
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slot(id).is_some_and(Timer::is_armed)
    }

    pub fn is_current(&self, firing: &TimerFiring) -> bool {
        self.slot(firing.id)
            .is_some_and(|slot| slot.is_current(firing))
    }

    fn slot(&self, id: TimerId) -> Option<&Timer> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    fn slot_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }
}

fn lock(state: &Mutex<SlotState>) -> MutexGuard<'_, SlotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
