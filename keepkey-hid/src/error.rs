//! Error types for keepkey-hid

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Timeout waiting for device response")]
    Timeout,

    #[error("Malformed HID report")]
    MalformedReport,

    #[error("Message of {0} bytes exceeds the transport limit")]
    MessageTooLarge(usize),

    #[error("Unexpected message type {0} from device")]
    UnexpectedMessage(u16),

    #[error("Device error: code={code}, message={message}")]
    Device { code: i32, message: String },

    #[error("Device is waiting for PIN entry")]
    PinRequired,
}

pub type Result<T> = std::result::Result<T, Error>;
