//! Device discovery across families
//!
//! Each family loader enumerates its attached devices, rejects firmware that
//! is too old and wraps every accepted connection. [`load`] then insists on
//! exactly one device overall.

use semver::VersionReq;
use tracing::{debug, info, warn};

use crate::device::{ClientWrapper, PassphraseAck, Transport};
use crate::error::{Error, Result};
use crate::identity::IdentityType;
use crate::keepkey::KeepKeyLoader;
use crate::trezor::TrezorLoader;

pub const TREZOR_NAME: &str = "Trezor";
pub const TREZOR_REQUIRED_VERSION: &str = ">=1.3.4";
pub const KEEPKEY_NAME: &str = "KeepKey";
pub const KEEPKEY_REQUIRED_VERSION: &str = ">=1.0.4";

/// What a family loader checks devices against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySpec {
    pub name: String,
    pub identity_type: IdentityType,
    pub required_version: VersionReq,
}

impl FamilySpec {
    pub fn new(
        name: impl Into<String>,
        identity_type: IdentityType,
        required_version: &str,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            identity_type,
            required_version: VersionReq::parse(required_version)?,
        })
    }

    pub fn trezor() -> Self {
        Self::builtin(TREZOR_NAME, IdentityType::Trezor, 1, 3, 4)
    }

    pub fn keepkey() -> Self {
        Self::builtin(KEEPKEY_NAME, IdentityType::KeepKey, 1, 0, 4)
    }

    fn builtin(
        name: &str,
        identity_type: IdentityType,
        major: u64,
        minor: u64,
        patch: u64,
    ) -> Self {
        let minimum = semver::Comparator {
            op: semver::Op::GreaterEq,
            major,
            minor: Some(minor),
            patch: Some(patch),
            pre: semver::Prerelease::EMPTY,
        };
        Self {
            name: name.to_string(),
            identity_type,
            required_version: VersionReq {
                comparators: vec![minimum],
            },
        }
    }
}

/// Connect to every device `transport` finds and check its firmware
///
/// Fails on the first device whose firmware does not satisfy
/// `spec.required_version`; devices after it are never opened, and the
/// connections opened so far are released when the partial list drops.
pub fn load_client<T: Transport>(spec: &FamilySpec, transport: &T) -> Result<Vec<ClientWrapper>> {
    let mut clients = Vec::new();

    for handle in transport.enumerate()? {
        let mut connection = transport.connect(handle)?;
        connection.set_passphrase_handler(Box::new(PassphraseAck::empty));

        let features = connection.features();
        debug!("connected to {} {}", spec.name, features.device_id);
        debug!("label    : {}", features.label);
        debug!("vendor   : {}", features.vendor);
        let current = features.version();
        debug!("version  : {current}");
        debug!("revision : {}", hex::encode(&features.revision));

        if !spec.required_version.matches(&current) {
            warn!(
                "{} firmware {current} does not satisfy {}",
                spec.name, spec.required_version
            );
            return Err(Error::FirmwareTooOld {
                family: spec.name.clone(),
                required: spec.required_version.clone(),
                current,
            });
        }

        clients.push(ClientWrapper::new(
            connection,
            spec.identity_type,
            spec.name.clone(),
        ));
    }

    Ok(clients)
}

/// Produces the validated devices of one family
pub trait Loader {
    fn load(&self) -> Result<Vec<ClientWrapper>>;
}

impl<F> Loader for F
where
    F: Fn() -> Result<Vec<ClientWrapper>>,
{
    fn load(&self) -> Result<Vec<ClientWrapper>> {
        self()
    }
}

/// Built-in loaders, in selection order
pub fn default_loaders() -> Vec<Box<dyn Loader>> {
    vec![
        Box::new(TrezorLoader::default()),
        Box::new(KeepKeyLoader::default()),
    ]
}

/// Run `loaders` in order and concatenate their devices
///
/// A family that is unavailable contributes no devices; any other loader
/// error ends discovery.
pub fn discover(loaders: &[Box<dyn Loader>]) -> Result<Vec<ClientWrapper>> {
    let mut devices = Vec::new();
    for loader in loaders {
        match loader.load() {
            Ok(found) => devices.extend(found),
            Err(Error::FamilyUnavailable { family, reason }) => {
                debug!("skipping {family}: {reason}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(devices)
}

/// Select the single attached device found by `loaders`
pub fn load_with(loaders: &[Box<dyn Loader>]) -> Result<ClientWrapper> {
    let devices = discover(loaders)?;
    let count = devices.len();

    let mut devices = devices.into_iter();
    match (devices.next(), devices.next()) {
        (Some(device), None) => {
            info!(
                "using {} {}",
                device.device_name(),
                device.connection().features().device_id
            );
            Ok(device)
        }
        _ => Err(Error::DeviceCount { count }),
    }
}

/// Select the single attached device across the built-in families
pub fn load() -> Result<ClientWrapper> {
    load_with(&default_loaders())
}
