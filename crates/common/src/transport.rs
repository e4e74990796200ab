//! Transport seam between the outlet controller and the USB stack

use protocol::{RESPONSE_LEN, UsbError};

/// A single synchronous request/response exchange with the outlet device
///
/// Implementations issue one IN/VENDOR/DEVICE control transfer with
/// `bRequest = command`, `wValue = outlet`, `wIndex = param` and return the
/// 4-byte data stage. Any USB failure, including a short read, is reported
/// as a [`UsbError`].
pub trait Transport {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> Result<[u8; RESPONSE_LEN], UsbError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> Result<[u8; RESPONSE_LEN], UsbError> {
        (**self).exchange(command, outlet, param)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> Result<[u8; RESPONSE_LEN], UsbError> {
        (**self).exchange(command, outlet, param)
    }
}
