//! Mock digital output line.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::traits::OutputLine;
use crate::{HardwareError, Result};

#[derive(Debug, Default)]
struct OutputState {
    level: bool,
    history: Vec<(Instant, bool)>,
    failing: bool,
}

/// Output line that records every level it is driven to.
///
/// # Examples
///
/// ```
/// use swinggate_hardware::mock::MockOutput;
/// use swinggate_hardware::traits::OutputLine;
///
/// # #[tokio::main] async fn main() -> swinggate_hardware::Result<()> {
/// let (mut lamp, handle) = MockOutput::new("lamp");
/// lamp.set_level(true).await?;
/// assert!(handle.level());
/// assert_eq!(handle.levels(), vec![true]);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct MockOutput {
    name: String,
    state: Arc<Mutex<OutputState>>,
}

/// Test-side view of a [`MockOutput`].
#[derive(Debug, Clone)]
pub struct MockOutputHandle {
    name: String,
    state: Arc<Mutex<OutputState>>,
}

impl MockOutput {
    /// Create a low output line and its observing handle.
    pub fn new(name: impl Into<String>) -> (Self, MockOutputHandle) {
        let name = name.into();
        let state = Arc::new(Mutex::new(OutputState::default()));
        (
            Self {
                name: name.clone(),
                state: state.clone(),
            },
            MockOutputHandle { name, state },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OutputLine for MockOutput {
    async fn set_level(&mut self, high: bool) -> Result<()> {
        let mut state = lock(&self.state);
        if state.failing {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        state.level = high;
        state.history.push((Instant::now(), high));
        Ok(())
    }

    fn level(&self) -> bool {
        lock(&self.state).level
    }
}

impl MockOutputHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Level the line was last driven to.
    pub fn level(&self) -> bool {
        lock(&self.state).level
    }

    /// Every level written, with the time it was written.
    pub fn history(&self) -> Vec<(Instant, bool)> {
        lock(&self.state).history.clone()
    }

    /// Every level written, without timestamps.
    pub fn levels(&self) -> Vec<bool> {
        lock(&self.state)
            .history
            .iter()
            .map(|(_, level)| *level)
            .collect()
    }

    /// Number of rising writes recorded so far.
    pub fn rising_count(&self) -> usize {
        let state = lock(&self.state);
        let mut previous = false;
        let mut count = 0;
        for (_, level) in &state.history {
            if *level && !previous {
                count += 1;
            }
            previous = *level;
        }
        count
    }

    pub fn clear_history(&self) {
        lock(&self.state).history.clear();
    }

    /// Make subsequent writes fail with `HardwareError::Disconnected`.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }
}

fn lock(state: &Mutex<OutputState>) -> MutexGuard<'_, OutputState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
