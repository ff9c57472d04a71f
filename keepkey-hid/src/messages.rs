//! Protobuf messages exchanged with KeepKey
//!
//! Only the subset needed for the handshake, pings and the interaction
//! requests the device may interject is defined here. Unknown fields are
//! skipped on decode.

use crate::types::MessageType;

/// Message with a fixed wire type id
pub trait WireMessage: prost::Message + Default {
    const TYPE: MessageType;
}

macro_rules! wire_type {
    ($name:ident) => {
        impl WireMessage for $name {
            const TYPE: MessageType = MessageType::$name;
        }
    };
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Initialize {}
wire_type!(Initialize);

#[derive(Clone, PartialEq, prost::Message)]
pub struct Features {
    #[prost(string, optional, tag = "1")]
    pub vendor: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub major_version: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub minor_version: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    pub patch_version: Option<u32>,
    #[prost(bool, optional, tag = "5")]
    pub bootloader_mode: Option<bool>,
    #[prost(string, optional, tag = "6")]
    pub device_id: Option<String>,
    #[prost(bool, optional, tag = "7")]
    pub pin_protection: Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub passphrase_protection: Option<bool>,
    #[prost(string, optional, tag = "10")]
    pub label: Option<String>,
    #[prost(bool, optional, tag = "12")]
    pub initialized: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "13")]
    pub revision: Option<Vec<u8>>,
    #[prost(string, optional, tag = "21")]
    pub model: Option<String>,
}
wire_type!(Features);

impl Features {
    /// Firmware version as `major.minor.patch`
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}",
            self.major_version.unwrap_or_default(),
            self.minor_version.unwrap_or_default(),
            self.patch_version.unwrap_or_default()
        )
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Ping {
    #[prost(string, optional, tag = "1")]
    pub message: Option<String>,
    #[prost(bool, optional, tag = "2")]
    pub button_protection: Option<bool>,
    #[prost(bool, optional, tag = "3")]
    pub pin_protection: Option<bool>,
    #[prost(bool, optional, tag = "4")]
    pub passphrase_protection: Option<bool>,
}
wire_type!(Ping);

#[derive(Clone, PartialEq, prost::Message)]
pub struct Success {
    #[prost(string, optional, tag = "1")]
    pub message: Option<String>,
}
wire_type!(Success);

#[derive(Clone, PartialEq, prost::Message)]
pub struct Failure {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub message: Option<String>,
}
wire_type!(Failure);

#[derive(Clone, PartialEq, prost::Message)]
pub struct ButtonRequest {
    #[prost(int32, optional, tag = "1")]
    pub code: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub data: Option<String>,
}
wire_type!(ButtonRequest);

#[derive(Clone, PartialEq, prost::Message)]
pub struct ButtonAck {}
wire_type!(ButtonAck);

#[derive(Clone, PartialEq, prost::Message)]
pub struct PinMatrixRequest {
    #[prost(int32, optional, tag = "1")]
    pub r#type: Option<i32>,
}
wire_type!(PinMatrixRequest);

#[derive(Clone, PartialEq, prost::Message)]
pub struct PassphraseRequest {}
wire_type!(PassphraseRequest);

#[derive(Clone, PartialEq, prost::Message)]
pub struct PassphraseAck {
    #[prost(string, required, tag = "1")]
    pub passphrase: String,
}
wire_type!(PassphraseAck);

impl PassphraseAck {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }
}
