//! KeepKey family loader

use crate::device::ClientWrapper;
use crate::error::Result;
use crate::factory::{FamilySpec, Loader};

/// Loads KeepKey devices over HID
#[derive(Debug, Clone)]
pub struct KeepKeyLoader {
    spec: FamilySpec,
}

impl Default for KeepKeyLoader {
    fn default() -> Self {
        Self {
            spec: FamilySpec::keepkey(),
        }
    }
}

impl KeepKeyLoader {
    pub fn with_spec(spec: FamilySpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FamilySpec {
        &self.spec
    }
}

impl Loader for KeepKeyLoader {
    #[cfg(feature = "keepkey")]
    fn load(&self) -> Result<Vec<ClientWrapper>> {
        let transport = binding::KeepKeyTransport::new(&self.spec.name)?;
        crate::factory::load_client(&self.spec, &transport)
    }

    #[cfg(not(feature = "keepkey"))]
    fn load(&self) -> Result<Vec<ClientWrapper>> {
        Err(crate::error::Error::FamilyUnavailable {
            family: self.spec.name.clone(),
            reason: "built without the `keepkey` feature".to_string(),
        })
    }
}

#[cfg(feature = "keepkey")]
mod binding {
    use keepkey_hid::{DeviceHandle, HidApi, HidLink, list_devices};
    use tracing::debug;

    use crate::device::{Connection, Transport};
    use crate::error::{Error, Result};
    use crate::wire::{WireConnection, map_error};

    pub struct KeepKeyTransport {
        family: String,
        api: HidApi,
    }

    impl KeepKeyTransport {
        /// Fails with `FamilyUnavailable` when hidapi cannot be initialized
        pub fn new(family: &str) -> Result<Self> {
            let api = HidApi::new().map_err(|e| Error::FamilyUnavailable {
                family: family.to_string(),
                reason: format!("hidapi: {e}"),
            })?;
            Ok(Self {
                family: family.to_string(),
                api,
            })
        }
    }

    impl Transport for KeepKeyTransport {
        type Handle = DeviceHandle;

        fn enumerate(&self) -> Result<Vec<DeviceHandle>> {
            let devices = list_devices(&self.api);
            debug!("found {} {} device(s)", devices.len(), self.family);
            Ok(devices)
        }

        fn connect(&self, handle: DeviceHandle) -> Result<Box<dyn Connection>> {
            let link = HidLink::open(&self.api, &handle).map_err(|e| map_error(&self.family, e))?;
            Ok(Box::new(WireConnection::open(&self.family, link)?))
        }
    }
}
