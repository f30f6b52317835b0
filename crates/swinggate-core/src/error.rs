use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Relay frame errors
    #[error("Empty relay frame")]
    EmptyFrame,

    #[error("Unknown command code: {code:#04x}")]
    UnknownCommandCode { code: u8 },

    #[error("Invalid frame length for {command}: expected {expected}, got {actual}")]
    InvalidFrameLength {
        command: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    // Controller errors
    #[error("Unknown leaf status value: {value}")]
    UnknownLeafStatus { value: u8 },

    #[error("Invalid leaf index: {0}")]
    InvalidLeaf(u8),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
