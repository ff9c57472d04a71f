//! Trezor family loader

use crate::device::ClientWrapper;
use crate::error::Result;
use crate::factory::{FamilySpec, Loader};

/// Loads Trezor devices over WebUSB, and Trezor Ones running pre-1.7 firmware over HID
#[derive(Debug, Clone)]
pub struct TrezorLoader {
    spec: FamilySpec,
}

impl Default for TrezorLoader {
    fn default() -> Self {
        Self {
            spec: FamilySpec::trezor(),
        }
    }
}

impl TrezorLoader {
    pub fn with_spec(spec: FamilySpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FamilySpec {
        &self.spec
    }
}

impl Loader for TrezorLoader {
    #[cfg(feature = "trezor")]
    fn load(&self) -> Result<Vec<ClientWrapper>> {
        let transport = binding::TrezorTransport::new(&self.spec.name)?;
        crate::factory::load_client(&self.spec, &transport)
    }

    #[cfg(not(feature = "trezor"))]
    fn load(&self) -> Result<Vec<ClientWrapper>> {
        Err(crate::error::Error::FamilyUnavailable {
            family: self.spec.name.clone(),
            reason: "built without the `trezor` feature".to_string(),
        })
    }
}

#[cfg(feature = "trezor")]
mod binding {
    use keepkey_hid::{DeviceHandle, HidApi, HidLink, list_wire_devices};
    use tracing::{debug, warn};
    use trezor_client::AvailableDevice;
    use trezor_client::transport::webusb::WebUsbTransport;
    use trezor_client::{Trezor, TrezorMessage, TrezorResponse, protos};

    use crate::device::{Connection, Features, PassphraseHandler, Transport};
    use crate::error::{Error, Result};
    use crate::wire::{WireConnection, map_error};

    /// Trezor One (vendor, product) ids on firmware before 1.7, which only speaks HID
    const TREZOR_ONE_HID: (u16, u16) = (0x534c, 0x0001);

    pub enum TrezorHandle {
        WebUsb(AvailableDevice),
        Hid(DeviceHandle),
    }

    pub struct TrezorTransport {
        family: String,
        webusb: bool,
        hid: Option<HidApi>,
    }

    impl TrezorTransport {
        /// Fails with `FamilyUnavailable` when neither libusb nor hidapi can be opened
        pub fn new(family: &str) -> Result<Self> {
            let usb = rusb::Context::new().map(drop).map_err(|e| format!("USB context: {e}"));
            let hid = HidApi::new().map_err(|e| format!("hidapi: {e}"));

            match (usb, hid) {
                (Err(usb), Err(hid)) => Err(Error::FamilyUnavailable {
                    family: family.to_string(),
                    reason: format!("{usb}; {hid}"),
                }),
                (usb, hid) => {
                    if let Err(reason) = &usb {
                        warn!("{family} WebUSB discovery disabled: {reason}");
                    }
                    if let Err(reason) = &hid {
                        warn!("{family} HID discovery disabled: {reason}");
                    }
                    Ok(Self {
                        family: family.to_string(),
                        webusb: usb.is_ok(),
                        hid: hid.ok(),
                    })
                }
            }
        }

        fn transport_error(&self, e: impl std::fmt::Display) -> Error {
            Error::Transport {
                family: self.family.clone(),
                message: e.to_string(),
            }
        }

        fn connect_webusb(&self, device: AvailableDevice) -> Result<Box<dyn Connection>> {
            let mut client = device.connect().map_err(|e| self.transport_error(e))?;
            client
                .init_device(None)
                .map_err(|e| device_error(&self.family, e))?;
            let features = client
                .features()
                .map(convert_features)
                .ok_or_else(|| device_error(&self.family, "no features after initialization"))?;

            Ok(Box::new(TrezorConnection {
                family: self.family.clone(),
                client,
                features,
                passphrase_handler: None,
            }))
        }

        fn connect_hid(&self, device: DeviceHandle) -> Result<Box<dyn Connection>> {
            let api = self
                .hid
                .as_ref()
                .ok_or_else(|| self.transport_error("hidapi is not initialized"))?;
            let link = HidLink::open(api, &device).map_err(|e| map_error(&self.family, e))?;
            Ok(Box::new(WireConnection::open(&self.family, link)?))
        }
    }

    impl Transport for TrezorTransport {
        type Handle = TrezorHandle;

        fn enumerate(&self) -> Result<Vec<TrezorHandle>> {
            let mut devices = Vec::new();
            if self.webusb {
                let found =
                    WebUsbTransport::find_devices(false).map_err(|e| self.transport_error(e))?;
                devices.extend(found.into_iter().map(TrezorHandle::WebUsb));
            }
            if let Some(api) = &self.hid {
                let found = list_wire_devices(api, &[TREZOR_ONE_HID]);
                devices.extend(found.into_iter().map(TrezorHandle::Hid));
            }
            debug!("found {} {} device(s)", devices.len(), self.family);
            Ok(devices)
        }

        fn connect(&self, handle: TrezorHandle) -> Result<Box<dyn Connection>> {
            match handle {
                TrezorHandle::WebUsb(device) => self.connect_webusb(device),
                TrezorHandle::Hid(device) => self.connect_hid(device),
            }
        }
    }

    struct TrezorConnection {
        family: String,
        client: Trezor,
        features: Features,
        passphrase_handler: Option<PassphraseHandler>,
    }

    impl Connection for TrezorConnection {
        fn set_passphrase_handler(&mut self, handler: PassphraseHandler) {
            self.passphrase_handler = Some(handler);
        }

        fn features(&self) -> &Features {
            &self.features
        }

        fn ping(&mut self, message: &str) -> Result<()> {
            let response = self
                .client
                .ping(message)
                .map_err(|e| device_error(&self.family, e))?;
            resolve(&self.family, &mut self.passphrase_handler, response)
        }
    }

    /// Drive interaction requests until the call yields its result
    fn resolve<T, R: TrezorMessage>(
        family: &str,
        passphrase_handler: &mut Option<PassphraseHandler>,
        response: TrezorResponse<'_, T, R>,
    ) -> Result<T> {
        match response {
            TrezorResponse::Ok(value) => Ok(value),
            TrezorResponse::Failure(failure) => Err(device_error(family, failure.message())),
            TrezorResponse::ButtonRequest(request) => {
                debug!("waiting for button confirmation on {family}");
                let next = request.ack().map_err(|e| device_error(family, e))?;
                resolve(family, passphrase_handler, next)
            }
            TrezorResponse::PinMatrixRequest(_) => Err(Error::PinRequired {
                family: family.to_string(),
            }),
            TrezorResponse::PassphraseRequest(request) => {
                let ack = passphrase_handler
                    .as_mut()
                    .map(|handler| handler())
                    .unwrap_or_default();
                let next = request
                    .ack_passphrase(ack.passphrase)
                    .map_err(|e| device_error(family, e))?;
                resolve(family, passphrase_handler, next)
            }
        }
    }

    fn convert_features(features: &protos::Features) -> Features {
        Features {
            device_id: features.device_id().to_string(),
            label: features.label().to_string(),
            vendor: features.vendor().to_string(),
            major_version: features.major_version(),
            minor_version: features.minor_version(),
            patch_version: features.patch_version(),
            revision: features.revision().to_vec(),
        }
    }

    fn device_error(family: &str, e: impl std::fmt::Display) -> Error {
        Error::Device {
            family: family.to_string(),
            message: e.to_string(),
        }
    }

}
