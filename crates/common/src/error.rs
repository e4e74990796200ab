//! Common error types

use protocol::{ErrorCode, UsbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No USB device matches the vendor/product pair
    #[error("cannot find USB device {vendor_id:04x}:{product_id:04x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The control transfer itself failed
    #[error("USB error: {0}")]
    Transport(UsbError),

    /// The device answered a different command than the one sent
    #[error("invalid response cmd: {actual:#04x} (expected {expected:#04x})")]
    ProtocolMismatch { expected: u8, actual: u8 },

    /// The device reported a non-OK error code
    #[error("{message}")]
    Device { code: ErrorCode, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a device error with the message mapped from `code`
    pub fn device(code: ErrorCode) -> Self {
        Error::Device {
            code,
            message: code.message().into_owned(),
        }
    }
}

// Not `#[from]`: that would also expose the UsbError as `source()` and
// anyhow's alternate formatting would print it twice.
impl From<UsbError> for Error {
    fn from(err: UsbError) -> Self {
        Error::Transport(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_messages() {
        assert_eq!(
            Error::device(ErrorCode::UnknownCommand).to_string(),
            "unknown command"
        );
        assert_eq!(
            Error::device(ErrorCode::InvalidArgument).to_string(),
            "invalid relay number"
        );
        assert_eq!(
            Error::device(ErrorCode::from(0x2a)).to_string(),
            "unknown error code: 42"
        );
    }

    #[test]
    fn test_protocol_mismatch_names_both_codes() {
        let msg = Error::ProtocolMismatch {
            expected: 0x02,
            actual: 0x05,
        }
        .to_string();
        assert!(msg.contains("0x02"));
        assert!(msg.contains("0x05"));
    }

    #[test]
    fn test_transport_error_from_usb_error() {
        let err: Error = UsbError::Timeout.into();
        assert!(matches!(err, Error::Transport(UsbError::Timeout)));
        assert_eq!(err.to_string(), "USB error: operation timed out");
    }

    #[test]
    fn test_device_not_found_display() {
        let err = Error::DeviceNotFound {
            vendor_id: 0x2306,
            product_id: 0x1107,
        };
        assert_eq!(err.to_string(), "cannot find USB device 2306:1107");
    }
}
