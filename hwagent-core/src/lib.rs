//! Discovery and firmware gating for hardware signing devices
//!
//! [`load`] enumerates every supported device family, rejects devices whose
//! firmware is older than the family minimum, and returns the single
//! attached device. Families compiled out or without a usable USB backend
//! are skipped.
//!
//! ```no_run
//! # fn main() -> hwagent_core::Result<()> {
//! let device = hwagent_core::load()?;
//! println!("{}", device.device_name());
//! # Ok(())
//! # }
//! ```

pub mod device;
pub mod error;
pub mod factory;
pub mod identity;
pub mod keepkey;
pub mod trezor;
#[cfg(any(feature = "trezor", feature = "keepkey"))]
mod wire;

pub use device::{
    ClientWrapper, Connection, DeviceInfo, Features, PassphraseAck, PassphraseHandler, Transport,
};
pub use error::{Error, Result};
pub use factory::{
    FamilySpec, KEEPKEY_NAME, KEEPKEY_REQUIRED_VERSION, Loader, TREZOR_NAME,
    TREZOR_REQUIRED_VERSION, default_loaders, discover, load, load_client, load_with,
};
pub use identity::{Identity, IdentityType};
pub use keepkey::KeepKeyLoader;
pub use trezor::TrezorLoader;

// Re-export version types used in errors and specs
pub use semver::{Version, VersionReq};
