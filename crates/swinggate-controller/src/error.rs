use thiserror::Error;

/// Errors surfaced by the gate runtime.
///
/// Hardware faults never reach the handle: the event loop logs them and keeps
/// serving, so the only thing a caller can observe is the loop being gone.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The event loop has exited; the handle can no longer reach it.
    #[error("Gate controller is not running")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_message() {
        assert_eq!(
            ControllerError::Stopped.to_string(),
            "Gate controller is not running"
        );
    }
}
