//! Outlet controller
//!
//! Encodes each logical outlet operation into one transport exchange,
//! validates the response envelope and maps device error codes to
//! [`Error`] variants. Every call is a live round trip; nothing is cached.
//!
//! Outlets that share a group id share one status on the device side, so
//! [`OutletControl::turn_on`], [`OutletControl::turn_off`] and
//! [`OutletControl::toggle`] affect every outlet of the addressed outlet's
//! group.

use crate::error::{Error, Result};
use crate::transport::Transport;
use protocol::{Command, REQUEST_TYPE, RESPONSE_LEN, Request, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Snapshot of one outlet, as read from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletState {
    pub outlet: u16,
    pub on: bool,
    pub group: u8,
}

impl fmt::Display for OutletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.on { "on" } else { "off" };
        write!(f, "{}: {:<3} (group: {})", self.outlet, status, self.group)
    }
}

/// Controller for a single outlet device
///
/// Owns its transport for its whole lifetime; dropping the controller
/// drops the transport and releases the device handle.
pub struct OutletControl<T> {
    transport: T,
}

impl<T: Transport> OutletControl<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Number of outlets on the device
    pub fn get_count(&mut self) -> Result<u8> {
        info!("{}", Command::Count);
        self.send(Request::count())
    }

    /// Status of the outlet's group
    pub fn is_on(&mut self, outlet: u16) -> Result<bool> {
        info!("{}: outlet={}", Command::StatusGet, outlet);
        Ok(self.send(Request::status_get(outlet))? != 0)
    }

    pub fn turn_on(&mut self, outlet: u16) -> Result<()> {
        self.set_status(outlet, true)
    }

    pub fn turn_off(&mut self, outlet: u16) -> Result<()> {
        self.set_status(outlet, false)
    }

    /// Set the status of every outlet in `outlet`'s group
    pub fn set_status(&mut self, outlet: u16, on: bool) -> Result<()> {
        info!("{}: outlet={} status={}", Command::StatusSet, outlet, on as u8);
        self.send(Request::status_set(outlet, on))?;
        Ok(())
    }

    /// Flip the status of every outlet in `outlet`'s group
    ///
    /// Returns the device's arg byte, whose meaning is firmware-defined.
    pub fn toggle(&mut self, outlet: u16) -> Result<u8> {
        info!("{}: outlet={}", Command::StatusToggle, outlet);
        self.send(Request::status_toggle(outlet))
    }

    pub fn get_group(&mut self, outlet: u16) -> Result<u8> {
        info!("{}: outlet={}", Command::GroupGet, outlet);
        self.send(Request::group_get(outlet))
    }

    /// Move `outlet` into `group`
    ///
    /// Range checking of `group` is left to the device.
    pub fn set_group(&mut self, outlet: u16, group: u8) -> Result<()> {
        info!("{}: outlet={} group={}", Command::GroupSet, outlet, group);
        self.send(Request::group_set(outlet, group))?;
        Ok(())
    }

    /// Read status and group of every outlet
    pub fn outlets(&mut self) -> Result<Vec<OutletState>> {
        let count = self.get_count()?;
        (0..u16::from(count))
            .map(|outlet| -> Result<OutletState> {
                Ok(OutletState {
                    outlet,
                    on: self.is_on(outlet)?,
                    group: self.get_group(outlet)?,
                })
            })
            .collect()
    }

    /// Send a typed request and return the response arg
    pub fn send(&mut self, request: Request) -> Result<u8> {
        self.send_raw(request.command.code(), request.outlet, request.param)
    }

    /// Send any command byte, assigned or not, and return the response arg
    ///
    /// Fails with [`Error::ProtocolMismatch`] if the echoed command differs
    /// from `command`, and with [`Error::Device`] if the device reports an
    /// error code. No retries are attempted.
    pub fn send_raw(&mut self, command: u8, outlet: u16, param: u16) -> Result<u8> {
        debug!(
            "ctrl request: bmRequestType={:#04x} bRequest={:#04x} wValue={} wIndex={} wLength={}",
            REQUEST_TYPE, command, outlet, param, RESPONSE_LEN
        );

        let response = Response::from_bytes(self.transport.exchange(command, outlet, param)?);

        debug!(
            "ctrl response: cmd={:#04x} err={:#04x} arg={}",
            response.command,
            response.error.code(),
            response.arg
        );

        if response.command != command {
            return Err(Error::ProtocolMismatch {
                expected: command,
                actual: response.command,
            });
        }

        if !response.error.is_ok() {
            return Err(Error::device(response.error));
        }

        Ok(response.arg)
    }
}
