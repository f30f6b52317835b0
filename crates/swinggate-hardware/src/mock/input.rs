//! Mock digital input line.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use swinggate_core::InputId;
use tokio::sync::{Mutex, mpsc};

use crate::traits::InputLine;
use crate::{HardwareError, Result};

/// Input line driven from a test through its [`MockInputHandle`].
///
/// Raw edges are queued, so a burst injected with
/// [`bounce`](MockInputHandle::bounce) is delivered edge by edge like a
/// bouncing contact. Dropping every handle disconnects the line.
#[derive(Debug)]
pub struct MockInput {
    id: InputId,
    level: Arc<AtomicBool>,
    edges: Mutex<mpsc::UnboundedReceiver<()>>,
}

/// Test-side control of a [`MockInput`].
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    id: InputId,
    level: Arc<AtomicBool>,
    edges: mpsc::UnboundedSender<()>,
}

impl MockInput {
    /// Create a released input line and its control handle.
    pub fn new(id: InputId) -> (Self, MockInputHandle) {
        let level = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id,
                level: level.clone(),
                edges: Mutex::new(rx),
            },
            MockInputHandle {
                id,
                level,
                edges: tx,
            },
        )
    }
}

impl InputLine for MockInput {
    fn id(&self) -> InputId {
        self.id
    }

    fn is_asserted(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    async fn next_edge(&self) -> Result<()> {
        self.edges
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.id.to_string()))
    }
}

impl MockInputHandle {
    pub fn id(&self) -> InputId {
        self.id
    }

    /// Assert the line and raise one edge.
    pub fn assert_line(&self) {
        self.bounce(1);
    }

    /// Assert the line and raise `edges` raw edges at once.
    pub fn bounce(&self, edges: usize) {
        self.level.store(true, Ordering::SeqCst);
        for _ in 0..edges {
            let _ = self.edges.send(());
        }
    }

    /// Release the line. Releasing never raises an edge.
    pub fn release(&self) {
        self.level.store(false, Ordering::SeqCst);
    }

    /// Change the level without raising an edge.
    ///
    /// Models a sensor that is already triggered when it gets sampled.
    pub fn set_level(&self, asserted: bool) {
        self.level.store(asserted, Ordering::SeqCst);
    }

    pub fn is_asserted(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}
