use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::IdentityType;

/// Metadata a device reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub device_id: String,
    pub label: String,
    pub vendor: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub patch_version: u32,
    #[serde(with = "hex::serde")]
    pub revision: Vec<u8>,
}

impl Features {
    /// Firmware version
    pub fn version(&self) -> Version {
        Version::new(
            self.major_version.into(),
            self.minor_version.into(),
            self.patch_version.into(),
        )
    }
}

/// Answer to a device's passphrase request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassphraseAck {
    pub passphrase: String,
}

impl PassphraseAck {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    /// Declines the passphrase feature
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Called whenever the device asks for a passphrase
pub type PassphraseHandler = Box<dyn FnMut() -> PassphraseAck>;

/// An open connection to one signing device
pub trait Connection {
    /// Replace the responder used for passphrase requests
    fn set_passphrase_handler(&mut self, handler: PassphraseHandler);

    /// Metadata read during the connection handshake
    fn features(&self) -> &Features;

    /// Round-trip a message through the device
    fn ping(&mut self, message: &str) -> Result<()>;
}

/// Device-family discovery and connection
pub trait Transport {
    type Handle;

    /// List attached devices, in a stable order
    fn enumerate(&self) -> Result<Vec<Self::Handle>>;

    fn connect(&self, handle: Self::Handle) -> Result<Box<dyn Connection>>;
}

/// A validated device ready for use
///
/// Dropping the wrapper closes the underlying connection.
pub struct ClientWrapper {
    connection: Box<dyn Connection>,
    identity_type: IdentityType,
    device_name: String,
}

impl ClientWrapper {
    pub fn new(
        connection: Box<dyn Connection>,
        identity_type: IdentityType,
        device_name: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            identity_type,
            device_name: device_name.into(),
        }
    }

    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    pub fn identity_type(&self) -> IdentityType {
        self.identity_type
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn into_parts(self) -> (Box<dyn Connection>, IdentityType, String) {
        (self.connection, self.identity_type, self.device_name)
    }

    pub fn device_info(&self) -> DeviceInfo {
        let features = self.connection.features();
        DeviceInfo {
            device_type: self.device_name.clone(),
            version: features.version().to_string(),
            label: features.label.clone(),
            device_id: features.device_id.clone(),
            revision: hex::encode(&features.revision),
        }
    }
}

impl std::fmt::Debug for ClientWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientWrapper")
            .field("device_name", &self.device_name)
            .field("identity_type", &self.identity_type)
            .field("features", self.connection.features())
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    pub version: String,
    pub label: String,
    pub device_id: String,
    pub revision: String,
}
