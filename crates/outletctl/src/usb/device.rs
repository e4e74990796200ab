//! USB outlet device
//!
//! Discovery of outlet devices by vendor/product id and the rusb-backed
//! [`Transport`] used by the controller.

use crate::usb::transfers::{execute_outlet_transfer, map_rusb_error};
use common::{Error, Result, Transport};
use protocol::{RESPONSE_LEN, UsbError};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, UsbContext};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Descriptor summary of a matching device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub bus_number: u8,
    pub device_address: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

/// Enumerate devices matching `vendor_id:product_id`, in bus order
fn find_devices<T: UsbContext>(
    context: &T,
    vendor_id: u16,
    product_id: u16,
) -> Result<Vec<(Device<T>, DeviceDescriptor)>> {
    let devices = context.devices().map_err(map_rusb_error)?;

    let matches: Vec<_> = devices
        .iter()
        .filter_map(|device| match device.device_descriptor() {
            Ok(desc) => Some((device, desc)),
            Err(e) => {
                debug!(
                    "Skipping device bus={} addr={}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                );
                None
            }
        })
        .filter(|(_, desc)| desc.vendor_id() == vendor_id && desc.product_id() == product_id)
        .collect();

    debug!(
        "Found {} device(s) matching {:04x}:{:04x}",
        matches.len(),
        vendor_id,
        product_id
    );
    Ok(matches)
}

/// List every connected outlet device
///
/// String descriptors are read when the device can be opened and left
/// empty otherwise.
pub fn list_devices(vendor_id: u16, product_id: u16) -> Result<Vec<DeviceSummary>> {
    let context = Context::new().map_err(map_rusb_error)?;

    Ok(find_devices(&context, vendor_id, product_id)?
        .into_iter()
        .map(|(device, desc)| {
            let (manufacturer, product, serial_number) = device
                .open()
                .map(|handle| read_string_descriptors(&handle, &desc))
                .unwrap_or((None, None, None));

            DeviceSummary {
                bus_number: device.bus_number(),
                device_address: device.address(),
                vendor_id: desc.vendor_id(),
                product_id: desc.product_id(),
                manufacturer,
                product,
                serial_number,
            }
        })
        .collect())
}

/// Open USB outlet device
///
/// Holds the only device handle; the handle is closed when this value is
/// dropped.
pub struct UsbOutlet {
    handle: DeviceHandle<Context>,
    timeout: Duration,
    bus_number: u8,
    device_address: u8,
}

impl UsbOutlet {
    /// Open the first device matching `vendor_id:product_id`
    ///
    /// Every control transfer on the returned handle uses `timeout`.
    pub fn open_with_timeout(vendor_id: u16, product_id: u16, timeout: Duration) -> Result<Self> {
        debug!("probing usb devices");
        let context = Context::new().map_err(map_rusb_error)?;
        let mut matches = find_devices(&context, vendor_id, product_id)?;

        if matches.len() > 1 {
            warn!(
                "{} devices match {:04x}:{:04x}, using the first one",
                matches.len(),
                vendor_id,
                product_id
            );
        }

        if matches.is_empty() {
            return Err(Error::DeviceNotFound {
                vendor_id,
                product_id,
            });
        }
        let (device, _) = matches.swap_remove(0);

        let handle = device.open().map_err(|e| {
            warn!("Failed to open device: {}", e);
            map_rusb_error(e)
        })?;

        info!(
            "found device: {:04x}:{:04x} bus={} addr={}",
            vendor_id,
            product_id,
            device.bus_number(),
            device.address()
        );

        Ok(Self {
            handle,
            timeout,
            bus_number: device.bus_number(),
            device_address: device.address(),
        })
    }

    pub fn bus_number(&self) -> u8 {
        self.bus_number
    }

    pub fn device_address(&self) -> u8 {
        self.device_address
    }
}

impl Transport for UsbOutlet {
    fn exchange(
        &mut self,
        command: u8,
        outlet: u16,
        param: u16,
    ) -> std::result::Result<[u8; RESPONSE_LEN], UsbError> {
        execute_outlet_transfer(&self.handle, command, outlet, param, self.timeout)
    }
}

impl Drop for UsbOutlet {
    fn drop(&mut self) {
        debug!(
            "Closing device bus={} addr={}",
            self.bus_number, self.device_address
        );
    }
}

/// Read string descriptors from device
fn read_string_descriptors<T: UsbContext>(
    handle: &DeviceHandle<T>,
    descriptor: &DeviceDescriptor,
) -> (Option<String>, Option<String>, Option<String>) {
    let manufacturer = descriptor
        .manufacturer_string_index()
        .and_then(|idx| handle.read_string_descriptor_ascii(idx).ok());

    let product = descriptor
        .product_string_index()
        .and_then(|idx| handle.read_string_descriptor_ascii(idx).ok());

    let serial_number = descriptor
        .serial_number_string_index()
        .and_then(|idx| handle.read_string_descriptor_ascii(idx).ok());

    (manufacturer, product, serial_number)
}
