//! Error types for hwagent-core

use semver::{Version, VersionReq};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please upgrade your {family} firmware to {required} version (current: {current})")]
    FirmwareTooOld {
        family: String,
        required: VersionReq,
        current: Version,
    },

    #[error("{count} devices found")]
    DeviceCount { count: usize },

    #[error("{family} support is unavailable: {reason}")]
    FamilyUnavailable { family: String, reason: String },

    #[error("{family} transport error: {message}")]
    Transport { family: String, message: String },

    #[error("{family} device error: {message}")]
    Device { family: String, message: String },

    #[error("{family} device is waiting for PIN entry")]
    PinRequired { family: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid version requirement: {0}")]
    VersionReq(#[from] semver::Error),

    #[cfg(any(feature = "trezor", feature = "keepkey"))]
    #[error("HID wire error: {0}")]
    Wire(#[from] keepkey_hid::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
