//! Common types and constants used throughout keepkey-hid

/// KeepKey USB vendor id
pub const KEEPKEY_VENDOR_ID: u16 = 0x2b24;

/// Product id of KeepKey firmware exposing the HID interface
pub const KEEPKEY_HID_PRODUCT_ID: u16 = 0x0001;

/// Interface carrying the normal wire link (interface 1 is the debug link)
pub const WIRE_INTERFACE: i32 = 0;

/// Size of one HID report, excluding the report id
pub const REPORT_SIZE: usize = 64;

/// Wait for a report this long; covers the on-device button confirmation
pub const READ_TIMEOUT_MS: i32 = 120_000;

/// Upper bound on a single message, far above anything the firmware sends
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Wire message type ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageType {
    Initialize = 0,
    Ping = 1,
    Success = 2,
    Failure = 3,
    Features = 17,
    PinMatrixRequest = 18,
    ButtonRequest = 26,
    ButtonAck = 27,
    PassphraseRequest = 41,
    PassphraseAck = 42,
}

impl MessageType {
    pub fn from_u16(value: u16) -> Option<Self> {
        let ty = match value {
            0 => Self::Initialize,
            1 => Self::Ping,
            2 => Self::Success,
            3 => Self::Failure,
            17 => Self::Features,
            18 => Self::PinMatrixRequest,
            26 => Self::ButtonRequest,
            27 => Self::ButtonAck,
            41 => Self::PassphraseRequest,
            42 => Self::PassphraseAck,
            _ => return None,
        };
        Some(ty)
    }

    pub fn id(self) -> u16 {
        self as u16
    }
}
