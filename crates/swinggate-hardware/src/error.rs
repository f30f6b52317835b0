//! Error types for hardware operations.
//!
//! This module defines error types specific to the gate hardware and the
//! peripherals of the reader stations: GPIO lines, the RFID chip and the
//! status display.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Card reading error.
    #[error("Card read error: {message}")]
    CardReadError { message: String },

    /// Radio frame addressed to a peer that was never registered.
    #[error("Unknown radio peer: {peer}")]
    UnknownPeer { peer: swinggate_core::MacAddress },

    /// Domain type rejected the device data.
    #[error(transparent)]
    Core(#[from] swinggate_core::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new card read error.
    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    /// Create a new unknown peer error.
    pub fn unknown_peer(peer: swinggate_core::MacAddress) -> Self {
        Self::UnknownPeer { peer }
    }
}
