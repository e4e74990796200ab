//! USB transfer execution
//!
//! This module issues the vendor control transfers of the outlet protocol
//! using rusb and maps rusb errors to protocol errors.

use protocol::{ProtocolError, REQUEST_TYPE, RESPONSE_LEN, Response, UsbError};
use rusb::{DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for USB transfers (5 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Execute one outlet command as an IN control transfer
///
/// Sends `bRequest = command`, `wValue = outlet`, `wIndex = param` on the
/// default control pipe and reads back exactly [`RESPONSE_LEN`] bytes.
pub fn execute_outlet_transfer<T: UsbContext>(
    handle: &DeviceHandle<T>,
    command: u8,
    outlet: u16,
    param: u16,
    timeout: Duration,
) -> Result<[u8; RESPONSE_LEN], UsbError> {
    debug!(
        "Control transfer: request_type={:#x}, request={:#x}, value={:#x}, index={:#x}, len={}",
        REQUEST_TYPE, command, outlet, param, RESPONSE_LEN
    );

    let mut buffer = [0u8; RESPONSE_LEN];
    let len = handle
        .read_control(REQUEST_TYPE, command, outlet, param, &mut buffer, timeout)
        .map_err(|e| {
            warn!("Control transfer failed: {}", e);
            map_rusb_error(e)
        })?;

    decode_data_stage(&buffer[..len.min(RESPONSE_LEN)])
}

/// Decode the data stage into the response envelope
///
/// A data stage shorter than [`RESPONSE_LEN`] is a transport failure.
fn decode_data_stage(data: &[u8]) -> Result<[u8; RESPONSE_LEN], UsbError> {
    Response::from_slice(data)
        .map(Response::to_bytes)
        .map_err(|e| {
            warn!("Control transfer returned {} of {} bytes", data.len(), RESPONSE_LEN);
            map_protocol_error(e)
        })
}

fn map_protocol_error(err: ProtocolError) -> UsbError {
    match err {
        ProtocolError::ShortResponse { expected, actual } => {
            UsbError::ShortRead { expected, actual }
        }
        other => UsbError::Other {
            message: other.to_string(),
        },
    }
}

/// Map rusb::Error to protocol::UsbError
pub fn map_rusb_error(err: rusb::Error) -> UsbError {
    match err {
        rusb::Error::Timeout => UsbError::Timeout,
        rusb::Error::Pipe => UsbError::Pipe,
        rusb::Error::NoDevice => UsbError::NoDevice,
        rusb::Error::NotFound => UsbError::NotFound,
        rusb::Error::Busy => UsbError::Busy,
        rusb::Error::Overflow => UsbError::Overflow,
        rusb::Error::Io => UsbError::Io,
        rusb::Error::InvalidParam => UsbError::InvalidParam,
        rusb::Error::Access => UsbError::Access,
        _ => UsbError::Other {
            message: err.to_string(),
        },
    }
}
