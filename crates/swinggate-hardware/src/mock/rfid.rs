//! Mock RFID reader implementation for testing and development.
//!
//! Cards are tapped onto the reader through a [`MockRfidHandle`]. A tapped
//! card stays in the field until its UID has been read once, which is how a
//! badge held briefly against a real reader behaves.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use swinggate_core::CardUid;
use tracing::trace;

use crate::traits::RfidReader;
use crate::{HardwareError, Result};

#[derive(Debug, Default)]
struct Field {
    cards: VecDeque<CardUid>,
    fail_next_read: bool,
    reads: usize,
}

/// Mock RFID chip driver.
///
/// # Examples
///
/// ```
/// use swinggate_core::CardUid;
/// use swinggate_hardware::mock::MockRfid;
/// use swinggate_hardware::traits::RfidReader;
///
/// # #[tokio::main] async fn main() -> swinggate_hardware::Result<()> {
/// let (mut reader, handle) = MockRfid::new();
/// assert!(!reader.request_card().await?);
///
/// let uid = CardUid::new(vec![0x04, 0xAB, 0xCD, 0xEF])?;
/// handle.tap(uid.clone());
///
/// assert!(reader.request_card().await?);
/// assert_eq!(reader.read_uid().await?, uid);
/// assert!(!reader.request_card().await?);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    name: String,
    field: Arc<Mutex<Field>>,
}

/// Handle for tapping cards onto a [`MockRfid`].
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    name: String,
    field: Arc<Mutex<Field>>,
}

impl MockRfid {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock RFID Reader")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, MockRfidHandle) {
        let name = name.into();
        let field = Arc::new(Mutex::new(Field::default()));
        (
            Self {
                name: name.clone(),
                field: field.clone(),
            },
            MockRfidHandle { name, field },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RfidReader for MockRfid {
    async fn request_card(&mut self) -> Result<bool> {
        Ok(!lock(&self.field).cards.is_empty())
    }

    async fn read_uid(&mut self) -> Result<CardUid> {
        let mut field = lock(&self.field);
        if std::mem::take(&mut field.fail_next_read) {
            return Err(HardwareError::card_read("anti-collision failed"));
        }
        let uid = field
            .cards
            .pop_front()
            .ok_or_else(|| HardwareError::card_read("no card in field"))?;
        field.reads += 1;
        trace!(reader = %self.name, %uid, "Card read");
        Ok(uid)
    }
}

impl MockRfidHandle {
    /// Put a card in the field until it has been read once.
    pub fn tap(&self, uid: CardUid) {
        lock(&self.field).cards.push_back(uid);
    }

    /// Make the next `read_uid` fail even if a card is present.
    pub fn fail_next_read(&self) {
        lock(&self.field).fail_next_read = true;
    }

    /// Remove every card from the field.
    pub fn clear(&self) {
        lock(&self.field).cards.clear();
    }

    /// Returns `true` if a card is waiting to be read.
    pub fn is_card_present(&self) -> bool {
        !lock(&self.field).cards.is_empty()
    }

    /// Number of successful UID reads.
    pub fn read_count(&self) -> usize {
        lock(&self.field).reads
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn lock(field: &Mutex<Field>) -> MutexGuard<'_, Field> {
    field.lock().unwrap_or_else(PoisonError::into_inner)
}
