//! Minimal HID client for KeepKey hardware wallets
//!
//! This crate covers what device discovery needs: listing attached
//! KeepKeys (and HID-mode Trezor Ones, which speak the same protocol), the
//! Initialize handshake, reading `Features`, pinging, and
//! answering the interaction requests (button, passphrase) the device may
//! interject during a call.
//!
//! # Examples
//!
//! ```no_run
//! use keepkey_hid::{HidApi, KeepKeyClient, PassphraseAck, list_devices};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HidApi::new()?;
//! for handle in list_devices(&api) {
//!     let mut client = KeepKeyClient::connect(&api, &handle)?;
//!     client.set_passphrase_callback(Box::new(|| PassphraseAck::new("")));
//!     println!("KeepKey {}", client.features().version_string());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod framing;
mod link;
pub mod messages;
mod types;

pub use client::{KeepKeyClient, PassphraseCallback, WireClient};
pub use error::{Error, Result};
pub use framing::{Reassembler, Report, encode_reports};
pub use link::{DeviceHandle, HidLink, Link, list_devices, list_wire_devices};
pub use messages::{Features, PassphraseAck};
pub use types::{KEEPKEY_HID_PRODUCT_ID, KEEPKEY_VENDOR_ID, MessageType, REPORT_SIZE};

pub use hidapi::HidApi;
