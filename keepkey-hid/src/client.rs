//! High-level KeepKey client API

use hidapi::HidApi;
use log::{debug, info};
use prost::Message;

use crate::error::{Error, Result};
use crate::link::{DeviceHandle, HidLink, Link};
use crate::messages::{
    ButtonAck, Failure, Features, Initialize, PassphraseAck, Ping, Success, WireMessage,
};
use crate::types::MessageType;

/// Answers the device's passphrase request
pub type PassphraseCallback = Box<dyn FnMut() -> PassphraseAck>;

/// Client for one device speaking the KeepKey wire protocol
///
/// Trezor One firmware before 1.7 uses the same protocol over HID.
pub struct WireClient<L: Link = HidLink> {
    link: L,
    features: Features,
    passphrase_callback: Option<PassphraseCallback>,
}

/// Client for a KeepKey attached over HID
pub type KeepKeyClient = WireClient<HidLink>;

impl WireClient<HidLink> {
    /// Open the device behind `handle` and run the Initialize handshake
    pub fn connect(api: &HidApi, handle: &DeviceHandle) -> Result<Self> {
        info!("Connecting to HID device {:?}", handle.serial_number);
        let link = HidLink::open(api, handle)?;
        Self::with_link(link)
    }
}

impl<L: Link> WireClient<L> {
    /// Run the Initialize handshake over an already opened link
    pub fn with_link(mut link: L) -> Result<Self> {
        link.send(Initialize::TYPE.id(), &Initialize {}.encode_to_vec())?;
        let (msg_type, payload) = link.receive()?;
        let features = match MessageType::from_u16(msg_type) {
            Some(MessageType::Features) => Features::decode(payload.as_slice())?,
            Some(MessageType::Failure) => return Err(failure(&payload)?),
            _ => return Err(Error::UnexpectedMessage(msg_type)),
        };
        debug!("Device features: {features:?}");

        Ok(Self {
            link,
            features,
            passphrase_callback: None,
        })
    }

    /// Features reported during the handshake
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Install the handler consulted on every passphrase request
    pub fn set_passphrase_callback(&mut self, callback: PassphraseCallback) {
        self.passphrase_callback = Some(callback);
    }

    /// Round-trip a ping; with `passphrase_protection` the device asks for the passphrase first
    pub fn ping(&mut self, message: &str, passphrase_protection: bool) -> Result<String> {
        let request = Ping {
            message: Some(message.to_string()),
            passphrase_protection: Some(passphrase_protection),
            ..Default::default()
        };
        let success: Success = self.call(&request)?;
        Ok(success.message.unwrap_or_default())
    }

    /// Send a request and drive interaction requests until the expected response arrives
    pub fn call<Req: WireMessage, Resp: WireMessage>(&mut self, request: &Req) -> Result<Resp> {
        self.link.send(Req::TYPE.id(), &request.encode_to_vec())?;

        loop {
            let (msg_type, payload) = self.link.receive()?;
            if msg_type == Resp::TYPE.id() {
                return Ok(Resp::decode(payload.as_slice())?);
            }

            match MessageType::from_u16(msg_type) {
                Some(MessageType::Failure) => return Err(failure(&payload)?),
                Some(MessageType::ButtonRequest) => {
                    debug!("Waiting for button confirmation on device");
                    self.link.send(ButtonAck::TYPE.id(), &ButtonAck {}.encode_to_vec())?;
                }
                Some(MessageType::PassphraseRequest) => {
                    let ack = match self.passphrase_callback.as_mut() {
                        Some(callback) => callback(),
                        None => PassphraseAck::new(""),
                    };
                    self.link.send(PassphraseAck::TYPE.id(), &ack.encode_to_vec())?;
                }
                Some(MessageType::PinMatrixRequest) => return Err(Error::PinRequired),
                _ => return Err(Error::UnexpectedMessage(msg_type)),
            }
        }
    }
}

fn failure(payload: &[u8]) -> Result<Error> {
    let failure = Failure::decode(payload)?;
    Ok(Error::Device {
        code: failure.code.unwrap_or_default(),
        message: failure.message.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted device responses and records what the host sent
    #[derive(Default)]
    struct ScriptedLink {
        responses: VecDeque<(u16, Vec<u8>)>,
        sent: Vec<(u16, Vec<u8>)>,
    }

    impl ScriptedLink {
        fn reply<M: WireMessage>(mut self, message: M) -> Self {
            self.responses.push_back((M::TYPE.id(), message.encode_to_vec()));
            self
        }
    }

    impl Link for ScriptedLink {
        fn send(&mut self, msg_type: u16, payload: &[u8]) -> Result<()> {
            self.sent.push((msg_type, payload.to_vec()));
            Ok(())
        }

        fn receive(&mut self) -> Result<(u16, Vec<u8>)> {
            self.responses.pop_front().ok_or(Error::Timeout)
        }
    }

    fn features() -> Features {
        Features {
            vendor: Some("keepkey.com".to_string()),
            major_version: Some(7),
            minor_version: Some(10),
            patch_version: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_handshake_caches_features() -> anyhow::Result<()> {
        let link = ScriptedLink::default().reply(features());
        let client = WireClient::with_link(link)?;
        assert_eq!(client.features().version_string(), "7.10.0");
        assert_eq!(client.link.sent[0].0, MessageType::Initialize.id());
        Ok(())
    }

    #[test]
    fn test_handshake_failure_is_reported() {
        let link = ScriptedLink::default().reply(Failure {
            code: Some(99),
            message: Some("Firmware error".to_string()),
        });
        match WireClient::with_link(link) {
            Err(Error::Device { code, message }) => {
                assert_eq!(code, 99);
                assert_eq!(message, "Firmware error");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("handshake should fail"),
        }
    }

    #[test]
    fn test_passphrase_request_uses_callback() -> anyhow::Result<()> {
        let link = ScriptedLink::default()
            .reply(features())
            .reply(crate::messages::PassphraseRequest {})
            .reply(crate::messages::ButtonRequest::default())
            .reply(Success {
                message: Some("pong".to_string()),
            });
        let mut client = WireClient::with_link(link)?;
        client.set_passphrase_callback(Box::new(|| PassphraseAck::new("hunter2")));

        assert_eq!(client.ping("pong", true)?, "pong");

        let sent: Vec<u16> = client.link.sent.iter().map(|(ty, _)| *ty).collect();
        assert_eq!(
            sent,
            vec![
                MessageType::Initialize.id(),
                MessageType::Ping.id(),
                MessageType::PassphraseAck.id(),
                MessageType::ButtonAck.id(),
            ]
        );
        let ack = PassphraseAck::decode(client.link.sent[2].1.as_slice())?;
        assert_eq!(ack.passphrase, "hunter2");
        Ok(())
    }

    #[test]
    fn test_pin_request_is_an_error() -> anyhow::Result<()> {
        let link = ScriptedLink::default()
            .reply(features())
            .reply(crate::messages::PinMatrixRequest { r#type: Some(1) });
        let mut client = WireClient::with_link(link)?;
        assert!(matches!(client.ping("x", false), Err(Error::PinRequired)));
        Ok(())
    }

    #[test]
    fn test_unexpected_message_is_an_error() -> anyhow::Result<()> {
        let link = ScriptedLink::default().reply(features()).reply(features());
        let mut client = WireClient::with_link(link)?;
        assert!(matches!(
            client.ping("x", false),
            Err(Error::UnexpectedMessage(17))
        ));
        Ok(())
    }
}
