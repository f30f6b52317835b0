use swinggate_core::MacAddress;
use swinggate_hardware::HardwareError;
use thiserror::Error;

/// Errors raised by the relay nodes.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Radio error: {0}")]
    Radio(#[from] HardwareError),

    #[error(transparent)]
    Core(#[from] swinggate_core::Error),

    /// A node was configured without the peers it needs.
    #[error("No route: {0}")]
    NoRoute(String),

    #[error("Frame from unknown peer {peer} dropped")]
    UnknownSender { peer: MacAddress },
}

impl RelayError {
    pub fn no_route(message: impl Into<String>) -> Self {
        Self::NoRoute(message.into())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
