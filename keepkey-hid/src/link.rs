//! HID link to KeepKey and HID-mode Trezor One devices

use std::ffi::CString;

use hidapi::{HidApi, HidDevice};
use log::debug;

use crate::error::{Error, Result};
use crate::framing::{Reassembler, encode_reports};
use crate::types::{
    KEEPKEY_HID_PRODUCT_ID, KEEPKEY_VENDOR_ID, MessageType, READ_TIMEOUT_MS, REPORT_SIZE,
    WIRE_INTERFACE,
};

/// Typed message channel to a device
pub trait Link {
    fn send(&mut self, msg_type: u16, payload: &[u8]) -> Result<()>;
    fn receive(&mut self) -> Result<(u16, Vec<u8>)>;
}

/// A HID wire device found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub path: CString,
    pub serial_number: Option<String>,
    pub product: Option<String>,
}

/// List attached KeepKeys speaking the HID wire protocol
pub fn list_devices(api: &HidApi) -> Vec<DeviceHandle> {
    list_wire_devices(api, &[(KEEPKEY_VENDOR_ID, KEEPKEY_HID_PRODUCT_ID)])
}

/// List HID devices matching one of `ids` (vendor, product) on the wire interface
///
/// Trezor One firmware before 1.7 speaks the same wire protocol, so callers
/// can pass its ids here too.
pub fn list_wire_devices(api: &HidApi, ids: &[(u16, u16)]) -> Vec<DeviceHandle> {
    api.device_list()
        .filter(|info| {
            is_wire_device(
                ids,
                info.vendor_id(),
                info.product_id(),
                info.interface_number(),
            )
        })
        .map(|info| DeviceHandle {
            path: info.path().to_owned(),
            serial_number: info.serial_number().map(str::to_owned),
            product: info.product_string().map(str::to_owned),
        })
        .collect()
}

// hidapi reports -1 when the platform does not expose interface numbers
fn is_wire_device(ids: &[(u16, u16)], vendor_id: u16, product_id: u16, interface: i32) -> bool {
    ids.contains(&(vendor_id, product_id)) && (interface == WIRE_INTERFACE || interface == -1)
}

/// Wire link over a HID device; the device is closed on drop
pub struct HidLink {
    device: HidDevice,
}

impl HidLink {
    pub fn open(api: &HidApi, handle: &DeviceHandle) -> Result<Self> {
        debug!("Opening HID device at {:?}", handle.path);
        let device = api.open_path(&handle.path)?;
        Ok(Self { device })
    }
}

impl Link for HidLink {
    fn send(&mut self, msg_type: u16, payload: &[u8]) -> Result<()> {
        if msg_type == MessageType::PassphraseAck.id() {
            debug!("Sending passphrase ack ({} bytes)", payload.len());
        } else {
            debug!("Sending message type {msg_type}: {}", hex::encode(payload));
        }
        for report in encode_reports(msg_type, payload)? {
            // report id 0
            let mut buf = [0u8; REPORT_SIZE + 1];
            buf[1..].copy_from_slice(&report);
            self.device.write(&buf)?;
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<(u16, Vec<u8>)> {
        let mut reassembler = Reassembler::new();
        let mut buf = [0u8; REPORT_SIZE];
        loop {
            let n = self.device.read_timeout(&mut buf, READ_TIMEOUT_MS)?;
            if n == 0 {
                return Err(Error::Timeout);
            }
            if let Some((msg_type, payload)) = reassembler.push(&buf[..n])? {
                debug!("Received message type {msg_type}: {}", hex::encode(&payload));
                return Ok((msg_type, payload));
            }
        }
    }
}
