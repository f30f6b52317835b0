//! Command codes of the relay protocol.
//!
//! The command code is the first byte of every frame.
//!
//! ```
//! use swinggate_protocol::CommandCode;
//!
//! let code = CommandCode::from_byte(0xA1).unwrap();
//! assert_eq!(code, CommandCode::CardScan);
//! assert_eq!(code.as_byte(), 0xA1);
//! assert!(CommandCode::from_byte(0x7F).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use swinggate_core::{Error, Result, constants::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandCode {
    /// Open the gate. Sent by the admin node (or an inside reader) to the
    /// controller.
    OpenRequest,
    /// A reader scanned a card; the UID follows.
    CardScan,
    /// Admin decision: the scanned card may pass.
    AccessGranted,
    /// Admin decision: the scanned card may not pass.
    AccessDenied,
}

impl CommandCode {
    pub const ALL: [CommandCode; 4] = [
        CommandCode::OpenRequest,
        CommandCode::CardScan,
        CommandCode::AccessGranted,
        CommandCode::AccessDenied,
    ];

    /// Parse a command code byte.
    ///
    /// # Errors
    /// Returns `Error::UnknownCommandCode` for any other byte.
    pub fn from_byte(code: u8) -> Result<Self> {
        match code {
            CODE_OPEN_REQUEST => Ok(Self::OpenRequest),
            CODE_CARD_SCAN => Ok(Self::CardScan),
            CODE_ACCESS_GRANTED => Ok(Self::AccessGranted),
            CODE_ACCESS_DENIED => Ok(Self::AccessDenied),
            _ => Err(Error::UnknownCommandCode { code }),
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            Self::OpenRequest => CODE_OPEN_REQUEST,
            Self::CardScan => CODE_CARD_SCAN,
            Self::AccessGranted => CODE_ACCESS_GRANTED,
            Self::AccessDenied => CODE_ACCESS_DENIED,
        }
    }

    /// Returns `true` if the frame carries a payload after the code byte.
    pub fn has_payload(self) -> bool {
        matches!(self, Self::CardScan)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::OpenRequest => "open request",
            Self::CardScan => "card scan",
            Self::AccessGranted => "access granted",
            Self::AccessDenied => "access denied",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", self.name(), self.as_byte())
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_byte(code)
    }
}
