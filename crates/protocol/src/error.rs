//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Command code has no assigned meaning
    #[error("Unassigned command code: {0:#04x}")]
    UnassignedCommand(u8),

    /// Data stage shorter than the response envelope
    #[error("Short response: expected {expected} bytes, got {actual}")]
    ShortResponse { expected: usize, actual: usize },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::ShortResponse {
            expected: 4,
            actual: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Short response"));
        assert!(msg.contains("expected 4"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn test_unassigned_command_error() {
        let err = ProtocolError::UnassignedCommand(0x07);
        assert_eq!(format!("{}", err), "Unassigned command code: 0x07");
    }
}
