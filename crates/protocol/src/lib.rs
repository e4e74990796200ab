//! Protocol library for outletctl
//!
//! This crate defines the vendor command protocol spoken by the USB outlet
//! device: command codes, error codes and the 4-byte response envelope.
//!
//! # Example
//!
//! ```
//! use protocol::{Command, ErrorCode, Request, Response};
//!
//! let req = Request::group_get(2);
//! assert_eq!(req.command.code(), 0x05);
//!
//! let resp = Response::from_slice(&[0x05, 0x00, 0x02, 0x00]).unwrap();
//! assert_eq!(resp.command, Command::GroupGet.code());
//! assert_eq!(resp.error, ErrorCode::Ok);
//! assert_eq!(resp.arg, 2);
//! ```

pub mod error;
pub mod types;

pub use error::{ProtocolError, Result};
pub use types::{
    Command, ErrorCode, PRODUCT_ID, REQUEST_DIR_IN, REQUEST_RECIPIENT_DEVICE, REQUEST_TYPE,
    REQUEST_TYPE_VENDOR, RESPONSE_LEN, Request, Response, UsbError, VENDOR_ID,
};
