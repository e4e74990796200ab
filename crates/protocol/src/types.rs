//! Outlet wire types
//!
//! This module defines the command codes, error codes and the fixed 4-byte
//! response envelope exchanged with the outlet device over the default
//! control pipe.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// USB Vendor ID of the outlet device
pub const VENDOR_ID: u16 = 0x2306;

/// USB Product ID of the outlet device
pub const PRODUCT_ID: u16 = 0x1107;

/// Direction bit of bmRequestType (device to host)
pub const REQUEST_DIR_IN: u8 = 0x80;

/// Type bits of bmRequestType (vendor)
pub const REQUEST_TYPE_VENDOR: u8 = 0x40;

/// Recipient bits of bmRequestType (device)
pub const REQUEST_RECIPIENT_DEVICE: u8 = 0x00;

/// bmRequestType used for every outlet command: IN | VENDOR | DEVICE
pub const REQUEST_TYPE: u8 = REQUEST_DIR_IN | REQUEST_TYPE_VENDOR | REQUEST_RECIPIENT_DEVICE;

/// Length of the data stage of every response
pub const RESPONSE_LEN: usize = 4;

/// Outlet command codes (bRequest)
///
/// Codes at or above [`Command::MAX`] are unassigned and the device answers
/// them with [`ErrorCode::UnknownCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Reserved, never handled by the device
    None = 0x00,
    /// Number of outlets
    Count = 0x01,
    /// Read the status bit of an outlet's group
    StatusGet = 0x02,
    /// Set the status bit of an outlet's group
    StatusSet = 0x03,
    /// Flip the status bit of an outlet's group
    StatusToggle = 0x04,
    /// Read the group id of an outlet
    GroupGet = 0x05,
    /// Move an outlet to another group
    GroupSet = 0x06,
}

impl Command {
    /// First unassigned command code (sentinel, not a usable command)
    pub const MAX: u8 = 0x07;

    /// All assigned commands in code order
    pub const ALL: [Command; 7] = [
        Command::None,
        Command::Count,
        Command::StatusGet,
        Command::StatusSet,
        Command::StatusToggle,
        Command::GroupGet,
        Command::GroupSet,
    ];

    /// Wire code of the command
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Protocol name of the command, as used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Command::None => "OUTLET_CMD_INVAL",
            Command::Count => "OUTLET_CMD_COUNT",
            Command::StatusGet => "OUTLET_CMD_STATUS_GET",
            Command::StatusSet => "OUTLET_CMD_STATUS_SET",
            Command::StatusToggle => "OUTLET_CMD_STATUS_TOGGLE",
            Command::GroupGet => "OUTLET_CMD_GROUP_GET",
            Command::GroupSet => "OUTLET_CMD_GROUP_SET",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Command::ALL
            .get(code as usize)
            .copied()
            .ok_or(ProtocolError::UnassignedCommand(code))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error code reported in byte 1 of the response
///
/// Codes are identified by their wire value: `Other(n)` with a known `n`
/// compares equal to, and behaves like, the named variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Command succeeded
    Ok,
    /// The device does not know the command code
    UnknownCommand,
    /// The outlet (or parameter) is out of range
    InvalidArgument,
    /// A code this client does not know about
    Other(u8),
}

impl ErrorCode {
    /// Wire value of the error code
    pub const fn code(self) -> u8 {
        match self {
            ErrorCode::Ok => 0x00,
            ErrorCode::UnknownCommand => 0x01,
            ErrorCode::InvalidArgument => 0x02,
            ErrorCode::Other(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self.code() == 0x00
    }

    /// Human-readable message for the code
    ///
    /// Unknown codes get a generic message embedding the raw value.
    pub fn message(self) -> Cow<'static, str> {
        match ErrorCode::from(self.code()) {
            ErrorCode::Ok => Cow::Borrowed("ok"),
            ErrorCode::UnknownCommand => Cow::Borrowed("unknown command"),
            ErrorCode::InvalidArgument => Cow::Borrowed("invalid relay number"),
            ErrorCode::Other(code) => Cow::Owned(format!("unknown error code: {}", code)),
        }
    }
}

impl From<u8> for ErrorCode {
    fn from(code: u8) -> Self {
        match code {
            0x00 => ErrorCode::Ok,
            0x01 => ErrorCode::UnknownCommand,
            0x02 => ErrorCode::InvalidArgument,
            other => ErrorCode::Other(other),
        }
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for ErrorCode {}

impl Hash for ErrorCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// A single outlet request (client -> device)
///
/// Maps onto the SETUP packet: `bRequest = command`, `wValue = outlet`,
/// `wIndex = param`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    /// Outlet index, 0 when not applicable
    pub outlet: u16,
    /// Status bit for STATUS_SET, group id for GROUP_SET, 0 otherwise
    pub param: u16,
}

impl Request {
    pub const fn new(command: Command, outlet: u16, param: u16) -> Self {
        Self {
            command,
            outlet,
            param,
        }
    }

    pub const fn count() -> Self {
        Self::new(Command::Count, 0, 0)
    }

    pub const fn status_get(outlet: u16) -> Self {
        Self::new(Command::StatusGet, outlet, 0)
    }

    pub const fn status_set(outlet: u16, on: bool) -> Self {
        Self::new(Command::StatusSet, outlet, on as u16)
    }

    pub const fn status_toggle(outlet: u16) -> Self {
        Self::new(Command::StatusToggle, outlet, 0)
    }

    pub const fn group_get(outlet: u16) -> Self {
        Self::new(Command::GroupGet, outlet, 0)
    }

    pub const fn group_set(outlet: u16, group: u8) -> Self {
        Self::new(Command::GroupSet, outlet, group as u16)
    }
}

/// Response envelope (device -> client)
///
/// Layout: `[echoed command, error code, arg, reserved]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Command code echoed by the device
    pub command: u8,
    pub error: ErrorCode,
    /// Single-byte result payload
    pub arg: u8,
    pub reserved: u8,
}

impl Response {
    /// Successful response carrying `arg`
    pub const fn ok(command: u8, arg: u8) -> Self {
        Self {
            command,
            error: ErrorCode::Ok,
            arg,
            reserved: 0,
        }
    }

    /// Failed response carrying `error`
    pub const fn error(command: u8, error: ErrorCode) -> Self {
        Self {
            command,
            error,
            arg: 0,
            reserved: 0,
        }
    }

    pub fn from_bytes(bytes: [u8; RESPONSE_LEN]) -> Self {
        let [command, error, arg, reserved] = bytes;
        Self {
            command,
            error: ErrorCode::from(error),
            arg,
            reserved,
        }
    }

    /// Decode the data stage of a control transfer
    ///
    /// Bytes beyond [`RESPONSE_LEN`] are ignored.
    pub fn from_slice(data: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: [u8; RESPONSE_LEN] = data
            .get(..RESPONSE_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(ProtocolError::ShortResponse {
                expected: RESPONSE_LEN,
                actual: data.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; RESPONSE_LEN] {
        [self.command, self.error.code(), self.arg, self.reserved]
    }
}

/// USB transport error types
///
/// Maps to libusb error codes. See rusb::Error for details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UsbError {
    /// Transfer timed out
    Timeout,
    /// Endpoint stalled (protocol error)
    Pipe,
    /// Device was disconnected
    NoDevice,
    /// Device or endpoint not found
    NotFound,
    /// Device is busy
    Busy,
    /// Buffer overflow
    Overflow,
    /// I/O error
    Io,
    /// Invalid parameter
    InvalidParam,
    /// Access denied (permissions)
    Access,
    /// Device returned fewer bytes than the envelope needs
    ShortRead { expected: usize, actual: usize },
    /// Other error with message
    Other { message: String },
}

impl fmt::Display for UsbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbError::Timeout => f.write_str("operation timed out"),
            UsbError::Pipe => f.write_str("pipe error (endpoint stalled)"),
            UsbError::NoDevice => f.write_str("no such device (it may have been disconnected)"),
            UsbError::NotFound => f.write_str("entity not found"),
            UsbError::Busy => f.write_str("resource busy"),
            UsbError::Overflow => f.write_str("overflow"),
            UsbError::Io => f.write_str("input/output error"),
            UsbError::InvalidParam => f.write_str("invalid parameter"),
            UsbError::Access => f.write_str("access denied (insufficient permissions)"),
            UsbError::ShortRead { expected, actual } => {
                write!(f, "short read: expected {} bytes, got {}", expected, actual)
            }
            UsbError::Other { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for UsbError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_type_is_vendor_in_device() {
        assert_eq!(REQUEST_TYPE, 0xC0);
    }

    #[test]
    fn test_command_codes() {
        for (i, cmd) in Command::ALL.iter().enumerate() {
            assert_eq!(cmd.code() as usize, i);
        }
        assert_eq!(Command::GroupSet.code() + 1, Command::MAX);
    }

    #[test]
    fn test_command_try_from_unassigned() {
        assert!(matches!(
            Command::try_from(Command::MAX),
            Err(ProtocolError::UnassignedCommand(0x07))
        ));
        assert!(Command::try_from(0xff).is_err());
        assert_eq!(Command::try_from(0x04).unwrap(), Command::StatusToggle);
    }

    #[test]
    fn test_error_code_messages() {
        assert_eq!(ErrorCode::UnknownCommand.message(), "unknown command");
        assert_eq!(ErrorCode::InvalidArgument.message(), "invalid relay number");
        assert_eq!(ErrorCode::from(9).message(), "unknown error code: 9");
    }

    #[test]
    fn test_error_code_identity_is_wire_value() {
        assert_eq!(ErrorCode::Other(0), ErrorCode::Ok);
        assert!(ErrorCode::Other(0).is_ok());
        assert_eq!(ErrorCode::Other(2), ErrorCode::InvalidArgument);
        assert_eq!(ErrorCode::Other(2).message(), "invalid relay number");
        assert_ne!(ErrorCode::Other(3), ErrorCode::Ok);

        let resp = Response::error(0x02, ErrorCode::Other(0));
        let decoded = Response::from_bytes(resp.to_bytes());
        assert_eq!(decoded, resp);
        assert!(decoded.error.is_ok());

        let set: std::collections::HashSet<_> =
            [ErrorCode::Ok, ErrorCode::Other(0), ErrorCode::Other(9)].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_response_from_slice() {
        let resp = Response::from_slice(&[0x05, 0x00, 0x7b, 0x00]).unwrap();
        assert_eq!(resp.command, Command::GroupGet.code());
        assert!(resp.error.is_ok());
        assert_eq!(resp.arg, 123);

        let err = Response::from_slice(&[0x05, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ShortResponse {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_status_set_param() {
        assert_eq!(Request::status_set(2, true).param, 1);
        assert_eq!(Request::status_set(2, false).param, 0);
        assert_eq!(Request::group_set(1, 200).param, 200);
    }
}
