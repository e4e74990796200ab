//! USB subsystem
//!
//! Device discovery and the control-transfer transport for the outlet
//! protocol. All transfers are synchronous and go through the default
//! control pipe; no interface is claimed.

pub mod device;
pub mod transfers;

pub use device::{DeviceSummary, UsbOutlet, list_devices};
