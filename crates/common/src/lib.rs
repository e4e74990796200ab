//! Common utilities for outletctl
//!
//! This crate provides the outlet controller and everything it needs that is
//! independent of the USB stack: the transport seam, the error taxonomy,
//! logging setup and in-memory transports for tests.

pub mod controller;
pub mod error;
pub mod logging;
pub mod test_utils;
pub mod transport;

pub use controller::{OutletControl, OutletState};
pub use error::{Error, Result};
pub use logging::setup_logging;
pub use transport::Transport;
