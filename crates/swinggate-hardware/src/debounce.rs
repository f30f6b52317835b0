//! Debounced digital input.
//!
//! A [`DebouncedInput`] turns the burst of raw edges produced by a bouncing
//! contact into a single call of its handler. Each raw edge goes through:
//!
//! 1. a short settle delay (default 5 ms),
//! 2. a re-sample of the line, dropping the edge if the line is no longer
//!    asserted,
//! 3. a window check against the last accepted edge, using wraparound-safe
//!    millisecond arithmetic,
//! 4. the handler call, only if the input is still enabled.
//!
//! The first edge after construction or after [`enable`](DebouncedInput::enable)
//! is always accepted.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use swinggate_core::InputId;
//! use swinggate_hardware::clock::ManualClock;
//! use swinggate_hardware::debounce::DebouncedInput;
//! use swinggate_hardware::mock::MockInput;
//!
//! let (line, handle) = MockInput::new(InputId::OpenButton);
//! handle.set_level(true);
//!
//! let presses = Arc::new(AtomicUsize::new(0));
//! let counter = presses.clone();
//! let clock = ManualClock::new();
//! let button = DebouncedInput::new(line, move || { counter.fetch_add(1, Ordering::SeqCst); }, 500)
//!     .with_clock(clock.clone());
//!
//! assert!(button.accept_edge());
//! clock.advance(100);
//! assert!(!button.accept_edge()); // bounce inside the window
//! clock.advance(500);
//! assert!(button.accept_edge());
//! assert_eq!(presses.load(Ordering::SeqCst), 2);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use swinggate_core::InputId;
use swinggate_core::constants::INPUT_SETTLE_MS;
use tracing::{debug, trace};

use crate::Result;
use crate::clock::TokioClock;
use crate::traits::{InputLine, MonotonicClock};

/// Zero-argument callback invoked for every accepted edge.
pub type EdgeHandler = Arc<dyn Fn() + Send + Sync>;

/// Digital input filtered by a minimum time between accepted edges.
pub struct DebouncedInput<L, C = TokioClock> {
    line: L,
    clock: C,
    handler: EdgeHandler,
    window_ms: u32,
    settle: Duration,
    enabled: AtomicBool,

    /// `None` stands for "infinitely long ago".
    last_accepted: Mutex<Option<u32>>,
}

impl<L: InputLine> DebouncedInput<L, TokioClock> {
    /// Bind `handler` to `line` with a debounce window in milliseconds.
    ///
    /// The input starts enabled.
    pub fn new(line: L, handler: impl Fn() + Send + Sync + 'static, window_ms: u32) -> Self {
        Self {
            line,
            clock: TokioClock::new(),
            handler: Arc::new(handler),
            window_ms,
            settle: Duration::from_millis(INPUT_SETTLE_MS),
            enabled: AtomicBool::new(true),
            last_accepted: Mutex::new(None),
        }
    }
}

impl<L: InputLine, C: MonotonicClock> DebouncedInput<L, C> {
    /// Replace the clock used for the window check.
    pub fn with_clock<C2: MonotonicClock>(self, clock: C2) -> DebouncedInput<L, C2> {
        DebouncedInput {
            line: self.line,
            clock,
            handler: self.handler,
            window_ms: self.window_ms,
            settle: self.settle,
            enabled: self.enabled,
            last_accepted: self.last_accepted,
        }
    }

    /// Set the delay before a raw edge is re-sampled. Zero skips the re-sample delay.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn id(&self) -> InputId {
        self.line.id()
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    /// Current level of the underlying line.
    pub fn is_asserted(&self) -> bool {
        self.line.is_asserted()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Start delivering edges to the handler.
    ///
    /// Re-enabling a disabled input forgets the last accepted edge, so the
    /// next edge is accepted regardless of the window.
    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            *self.lock_last() = None;
            debug!(input = %self.id(), "Input enabled");
        }
    }

    /// Stop delivering edges. Edges still in their settle delay are dropped.
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            debug!(input = %self.id(), "Input disabled");
        }
    }

    /// Full edge pipeline: settle, re-sample, window check, handler.
    ///
    /// Returns `true` if the handler was invoked.
    pub async fn handle_edge(&self) -> bool {
        if !self.is_enabled() {
            trace!(input = %self.id(), "Edge ignored, input disabled");
            return false;
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        if !self.line.is_asserted() {
            trace!(input = %self.id(), "Edge rejected, line released during settle");
            return false;
        }

        self.accept_edge()
    }

    /// Window check and handler call, without the settle delay.
    ///
    /// Returns `true` if the handler was invoked.
    pub fn accept_edge(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let now = self.clock.now_ms();
        {
            let mut last = self.lock_last();
            if let Some(previous) = *last {
                let elapsed = now.wrapping_sub(previous);
                if elapsed <= self.window_ms {
                    trace!(input = %self.id(), elapsed, window = self.window_ms, "Edge debounced");
                    return false;
                }
            }
            *last = Some(now);
        }

        // disable() may have raced the window check
        if !self.is_enabled() {
            return false;
        }

        trace!(input = %self.id(), "Edge accepted");
        (self.handler)();
        true
    }

    /// Feed every raw edge of the line through [`handle_edge`](Self::handle_edge)
    /// until the line reports an error.
    ///
    /// # Errors
    ///
    /// Returns the line's error, typically a disconnect.
    pub async fn watch(&self) -> Result<()> {
        loop {
            self.line.next_edge().await?;
            self.handle_edge().await;
        }
    }

    fn lock_last(&self) -> std::sync::MutexGuard<'_, Option<u32>> {
        self.last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: InputLine, C> std::fmt::Debug for DebouncedInput<L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedInput")
            .field("id", &self.line.id())
            .field("window_ms", &self.window_ms)
            .field("enabled", &self.enabled.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mock::{MockInput, MockInputHandle};
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_input(
        window_ms: u32,
        clock: ManualClock,
    ) -> (
        DebouncedInput<MockInput, ManualClock>,
        MockInputHandle,
        Arc<AtomicUsize>,
    ) {
        let (line, handle) = MockInput::new(InputId::BreakBeam);
        handle.set_level(true);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let input = DebouncedInput::new(
            line,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            window_ms,
        )
        .with_clock(clock);
        (input, handle, count)
    }

    #[test]
    fn test_first_edge_always_accepted() {
        // A clock reading of zero must not be mistaken for a recent edge.
        let (input, _handle, count) = counting_input(3000, ManualClock::new());
        assert!(input.accept_edge());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_edge_exactly_at_window_is_dropped() {
        let clock = ManualClock::new();
        let (input, _handle, count) = counting_input(800, clock.clone());

        assert!(input.accept_edge());
        clock.advance(800);
        assert!(!input.accept_edge());
        clock.advance(1);
        assert!(input.accept_edge());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_edges_do_not_extend_window() {
        let clock = ManualClock::new();
        let (input, _handle, count) = counting_input(500, clock.clone());

        assert!(input.accept_edge());
        for _ in 0..4 {
            clock.advance(100);
            assert!(!input.accept_edge());
        }
        clock.advance(101);
        assert!(input.accept_edge());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_window_survives_clock_wraparound() {
        let clock = ManualClock::starting_at(u32::MAX - 100);
        let (input, _handle, count) = counting_input(500, clock.clone());

        assert!(input.accept_edge());
        clock.advance(300); // wrapped past zero
        assert!(!input.accept_edge());
        clock.advance(300);
        assert!(input.accept_edge());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disabled_input_never_fires() {
        let clock = ManualClock::new();
        let (input, _handle, count) = counting_input(100, clock.clone());

        input.disable();
        assert!(!input.is_enabled());
        for _ in 0..5 {
            clock.advance(1_000);
            assert!(!input.accept_edge());
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_enable_resets_window() {
        let clock = ManualClock::new();
        let (input, _handle, count) = counting_input(3000, clock.clone());

        assert!(input.accept_edge());
        input.disable();
        clock.advance(10);
        input.enable();
        assert!(input.accept_edge());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_enable_while_enabled_keeps_window() {
        let clock = ManualClock::new();
        let (input, _handle, _count) = counting_input(3000, clock.clone());

        assert!(input.accept_edge());
        input.enable();
        clock.advance(10);
        assert!(!input.accept_edge());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_edge_rejects_released_line() {
        let (input, handle, count) = counting_input(100, ManualClock::new());

        handle.set_level(false);
        assert!(!input.handle_edge().await);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        handle.set_level(true);
        assert!(input.handle_edge().await);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_during_settle_drops_pending_edge() {
        let (input, _handle, count) = counting_input(100, ManualClock::new());
        let input = Arc::new(input.with_settle(Duration::from_millis(5)));

        let pending = {
            let input = input.clone();
            tokio::spawn(async move { input.handle_edge().await })
        };
        tokio::task::yield_now().await;
        input.disable();

        assert!(!pending.await.unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_collapses_bounce_burst() {
        let (line, handle) = MockInput::new(InputId::OpenButton);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let input = Arc::new(DebouncedInput::new(
            line,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            500,
        ));

        let watcher = {
            let input = input.clone();
            tokio::spawn(async move { input.watch().await })
        };

        handle.bounce(6);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        handle.assert_line();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        watcher.abort();
    }

    proptest! {
        /// Edges spaced closer than the window yield at most one handler call.
        #[test]
        fn prop_burst_inside_window_fires_once(
            window in 1u32..5_000,
            gaps in proptest::collection::vec(0u32..5_000, 1..40),
            start in any::<u32>(),
        ) {
            let clock = ManualClock::starting_at(start);
            let (input, _handle, count) = counting_input(window, clock.clone());

            let mut since_first = 0u64;
            input.accept_edge();
            for gap in gaps {
                let gap = gap % window;
                since_first += u64::from(gap);
                if since_first > u64::from(window) {
                    break;
                }
                clock.advance(gap);
                input.accept_edge();
            }
            prop_assert_eq!(count.load(Ordering::SeqCst), 1);
        }
    }
}
