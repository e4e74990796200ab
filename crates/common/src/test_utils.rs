//! Test utilities for outletctl
//!
//! Provides in-memory transports for testing the controller without
//! hardware.
//!
//! # Example
//!
//! ```
//! use common::OutletControl;
//! use common::test_utils::SimulatedOutlets;
//!
//! let mut ctl = OutletControl::new(SimulatedOutlets::default());
//! assert_eq!(ctl.get_count().unwrap(), 4);
//! ctl.turn_on(1).unwrap();
//! assert!(ctl.is_on(1).unwrap());
//! ```

use crate::transport::Transport;
use protocol::{Command, ErrorCode, RESPONSE_LEN, Response, UsbError};
use std::collections::VecDeque;

/// Number of outlets on the stock device
pub const DEFAULT_OUTLET_COUNT: u8 = 4;

/// A request as seen by a test transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedRequest {
    pub command: u8,
    pub outlet: u16,
    pub param: u16,
}

/// In-memory model of the outlet firmware
///
/// Reproduces the device-side rules:
/// - every outlet starts off, in a group of its own (group id = index);
/// - only the low byte of `wValue`/`wIndex` is looked at;
/// - setting or toggling the status of an outlet applies to its whole group;
/// - an outlet moved into a group that already has members adopts that
///   group's status, otherwise it keeps its own;
/// - unassigned commands answer UNKNOWN_COMMAND, bad outlets answer
///   INVALID_ARGUMENT.
#[derive(Debug, Clone)]
pub struct SimulatedOutlets {
    status: Vec<bool>,
    groups: Vec<u8>,
    requests: Vec<RecordedRequest>,
    faults: VecDeque<UsbError>,
}

impl Default for SimulatedOutlets {
    fn default() -> Self {
        Self::new(DEFAULT_OUTLET_COUNT)
    }
}

impl SimulatedOutlets {
    pub fn new(count: u8) -> Self {
        Self {
            status: vec![false; count as usize],
            groups: (0..count).collect(),
            requests: Vec::new(),
            faults: VecDeque::new(),
        }
    }

    /// Fail the next exchange with `error` instead of answering
    pub fn inject_fault(&mut self, error: UsbError) {
        self.faults.push_back(error);
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    /// Direct view of the relay outputs, bypassing the protocol
    pub fn relay_status(&self) -> &[bool] {
        &self.status
    }

    /// Direct view of the group table, bypassing the protocol
    pub fn relay_groups(&self) -> &[u8] {
        &self.groups
    }

    fn check(&self, relay: usize) -> Result<(), ErrorCode> {
        if relay < self.status.len() {
            Ok(())
        } else {
            Err(ErrorCode::InvalidArgument)
        }
    }

    fn status_get(&self, relay: usize) -> Result<u8, ErrorCode> {
        self.check(relay)?;
        Ok(self.status[relay] as u8)
    }

    fn status_set(&mut self, relay: usize, on: bool) -> Result<u8, ErrorCode> {
        self.check(relay)?;
        let group = self.groups[relay];
        for (status, _) in self
            .status
            .iter_mut()
            .zip(&self.groups)
            .filter(|(_, g)| **g == group)
        {
            *status = on;
        }
        Ok(0)
    }

    fn status_toggle(&mut self, relay: usize) -> Result<u8, ErrorCode> {
        let on = self.status_get(relay)? == 0;
        self.status_set(relay, on)?;
        Ok(on as u8)
    }

    fn group_get(&self, relay: usize) -> Result<u8, ErrorCode> {
        self.check(relay)?;
        Ok(self.groups[relay])
    }

    fn group_set(&mut self, relay: usize, group: u8) -> Result<u8, ErrorCode> {
        self.check(relay)?;
        let on = self
            .groups
            .iter()
            .enumerate()
            .find(|(r, g)| *r != relay && **g == group)
            .map_or(self.status[relay], |(r, _)| self.status[r]);
        self.groups[relay] = group;
        self.status_set(relay, on)
    }

    fn dispatch(&mut self, command: u8, relay: usize, param: u8) -> Response {
        let result = match Command::try_from(command) {
            Ok(Command::Count) => Ok(self.status.len() as u8),
            Ok(Command::StatusGet) => self.status_get(relay),
            Ok(Command::StatusSet) => self.status_set(relay, param != 0),
            Ok(Command::StatusToggle) => self.status_toggle(relay),
            Ok(Command::GroupGet) => self.group_get(relay),
            Ok(Command::GroupSet) => self.group_set(relay, param),
            Ok(Command::None) | Err(_) => Err(ErrorCode::UnknownCommand),
        };

        match result {
            Ok(arg) => Response::ok(command, arg),
            Err(code) => Response::error(command, code),
        }
    }
}

impl Transport for SimulatedOutlets {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> Result<[u8; RESPONSE_LEN], UsbError> {
        self.requests.push(RecordedRequest {
            command,
            outlet,
            param,
        });

        if let Some(fault) = self.faults.pop_front() {
            return Err(fault);
        }

        let relay = usize::from(outlet & 0xff);
        let param = (param & 0xff) as u8;
        Ok(self.dispatch(command, relay, param).to_bytes())
    }
}

/// Transport that replays canned responses in order
///
/// Runs dry with a `UsbError::Other` once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Result<[u8; RESPONSE_LEN], UsbError>>,
    requests: Vec<RecordedRequest>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&mut self, response: Response) {
        self.script.push_back(Ok(response.to_bytes()));
    }

    pub fn push_raw(&mut self, bytes: [u8; RESPONSE_LEN]) {
        self.script.push_back(Ok(bytes));
    }

    pub fn push_failure(&mut self, error: UsbError) {
        self.script.push_back(Err(error));
    }

    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }

    /// Number of scripted answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Transport for ScriptedTransport {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> Result<[u8; RESPONSE_LEN], UsbError> {
        self.requests.push(RecordedRequest {
            command,
            outlet,
            param,
        });
        self.script.pop_front().unwrap_or_else(|| {
            Err(UsbError::Other {
                message: "script exhausted".to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_defaults() {
        let sim = SimulatedOutlets::default();
        assert_eq!(sim.relay_status(), &[false; 4]);
        assert_eq!(sim.relay_groups(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_simulator_masks_outlet_low_byte() {
        let mut sim = SimulatedOutlets::default();
        let resp = Response::from_bytes(sim.exchange(0x03, 0x0101, 1).unwrap());
        assert!(resp.error.is_ok());
        assert_eq!(sim.relay_status(), &[false, true, false, false]);
    }

    #[test]
    fn test_simulator_unknown_command() {
        let mut sim = SimulatedOutlets::default();
        for code in [0x00, 0x07, 0xff] {
            let resp = Response::from_bytes(sim.exchange(code, 0, 0).unwrap());
            assert_eq!(resp.command, code);
            assert_eq!(resp.error, ErrorCode::UnknownCommand);
        }
    }

    #[test]
    fn test_simulator_join_populated_group_adopts_status() {
        let mut sim = SimulatedOutlets::default();
        sim.exchange(0x03, 1, 1).unwrap();
        sim.exchange(0x06, 3, 1).unwrap();
        assert_eq!(sim.relay_status(), &[false, true, false, true]);
    }

    #[test]
    fn test_simulator_fault_injection() {
        let mut sim = SimulatedOutlets::default();
        sim.inject_fault(UsbError::NoDevice);
        assert_eq!(sim.exchange(0x01, 0, 0), Err(UsbError::NoDevice));
        assert!(sim.exchange(0x01, 0, 0).is_ok());
        assert_eq!(sim.requests().len(), 2);
    }

    #[test]
    fn test_scripted_transport_runs_dry() {
        let mut transport = ScriptedTransport::new();
        transport.push_raw([0x01, 0x00, 0x04, 0x00]);
        assert_eq!(transport.exchange(0x01, 0, 0), Ok([0x01, 0x00, 0x04, 0x00]));
        assert!(matches!(
            transport.exchange(0x01, 0, 0),
            Err(UsbError::Other { .. })
        ));
    }
}
