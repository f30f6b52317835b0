//! Mock status display of a reader station.
//!
//! Models a small monochrome panel: a fixed number of text rows of fixed
//! width. Text is ASCII only (0x20-0x7E), as the panel font has no other
//! glyphs. Rows longer than the panel are clipped, as the panel would.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::traits::StatusDisplay;
use crate::{HardwareError, Result};

/// Rows of a 128x64 panel with an 8 pixel font.
pub const DEFAULT_ROWS: usize = 6;

/// Columns of a 128 pixel wide panel with a 6 pixel font.
pub const DEFAULT_COLUMNS: usize = 21;

#[derive(Debug, Default)]
struct Screen {
    current: Vec<String>,
    frames: Vec<Vec<String>>,
}

/// In-memory [`StatusDisplay`].
///
/// # Examples
///
/// ```
/// use swinggate_hardware::mock::MockDisplay;
/// use swinggate_hardware::traits::StatusDisplay;
///
/// let (mut display, handle) = MockDisplay::new();
/// display.show(&["Please scan", "your card."]).unwrap();
///
/// assert_eq!(handle.lines(), vec!["Please scan", "your card."]);
/// assert!(handle.contains("scan"));
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    rows: usize,
    columns: usize,
    screen: Arc<Mutex<Screen>>,
}

/// Observer of what a [`MockDisplay`] has shown.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    screen: Arc<Mutex<Screen>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        Self::with_size(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }

    pub fn with_size(rows: usize, columns: usize) -> (Self, MockDisplayHandle) {
        let screen = Arc::new(Mutex::new(Screen::default()));
        (
            Self {
                rows,
                columns,
                screen: screen.clone(),
            },
            MockDisplayHandle { screen },
        )
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl StatusDisplay for MockDisplay {
    fn show(&mut self, lines: &[&str]) -> Result<()> {
        if lines.len() > self.rows {
            return Err(HardwareError::invalid_data(format!(
                "{} lines do not fit on a {}-row display",
                lines.len(),
                self.rows
            )));
        }

        if let Some(line) = lines
            .iter()
            .find(|line| !line.bytes().all(|b| (0x20..=0x7E).contains(&b)))
        {
            return Err(HardwareError::invalid_data(format!(
                "Display text must be printable ASCII: {line:?}"
            )));
        }

        let rendered: Vec<String> = lines
            .iter()
            .map(|line| line.chars().take(self.columns).collect())
            .collect();

        trace!(lines = ?rendered, "Display updated");

        let mut screen = lock(&self.screen);
        screen.current = rendered.clone();
        screen.frames.push(rendered);
        Ok(())
    }
}

impl MockDisplayHandle {
    /// Rows currently on screen.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.screen).current.clone()
    }

    /// Every screen shown so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<String>> {
        lock(&self.screen).frames.clone()
    }

    /// Returns `true` if any row currently on screen contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        lock(&self.screen)
            .current
            .iter()
            .any(|line| line.contains(text))
    }

    /// Returns `true` if any screen shown so far had a row containing `text`.
    pub fn has_shown(&self, text: &str) -> bool {
        lock(&self.screen)
            .frames
            .iter()
            .flatten()
            .any(|line| line.contains(text))
    }
}

fn lock(screen: &Mutex<Screen>) -> MutexGuard<'_, Screen> {
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}
