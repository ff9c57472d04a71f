//! Connection over the HID wire protocol shared by KeepKey and Trezor One

use keepkey_hid::{Link, WireClient};

use crate::device::{Connection, Features, PassphraseHandler};
use crate::error::{Error, Result};

/// A handshaken wire client tagged with the family it was found as
pub(crate) struct WireConnection<L: Link> {
    family: String,
    client: WireClient<L>,
    features: Features,
}

impl<L: Link> WireConnection<L> {
    /// Run the Initialize handshake over `link`
    pub(crate) fn open(family: &str, link: L) -> Result<Self> {
        let client = WireClient::with_link(link).map_err(|e| map_error(family, e))?;
        let features = convert_features(client.features());
        Ok(Self {
            family: family.to_string(),
            client,
            features,
        })
    }
}

impl<L: Link> Connection for WireConnection<L> {
    fn set_passphrase_handler(&mut self, mut handler: PassphraseHandler) {
        self.client.set_passphrase_callback(Box::new(move || {
            keepkey_hid::PassphraseAck::new(handler().passphrase)
        }));
    }

    fn features(&self) -> &Features {
        &self.features
    }

    fn ping(&mut self, message: &str) -> Result<()> {
        self.client
            .ping(message, false)
            .map_err(|e| map_error(&self.family, e))?;
        Ok(())
    }
}

fn convert_features(features: &keepkey_hid::Features) -> Features {
    Features {
        device_id: features.device_id.clone().unwrap_or_default(),
        label: features.label.clone().unwrap_or_default(),
        vendor: features.vendor.clone().unwrap_or_default(),
        major_version: features.major_version.unwrap_or_default(),
        minor_version: features.minor_version.unwrap_or_default(),
        patch_version: features.patch_version.unwrap_or_default(),
        revision: features.revision.clone().unwrap_or_default(),
    }
}

pub(crate) fn map_error(family: &str, e: keepkey_hid::Error) -> Error {
    match e {
        keepkey_hid::Error::PinRequired => Error::PinRequired {
            family: family.to_string(),
        },
        keepkey_hid::Error::Device { code, message } => Error::Device {
            family: family.to_string(),
            message: format!("{message} (code {code})"),
        },
        other => Error::Wire(other),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use keepkey_hid::MessageType;
    use keepkey_hid::messages::{self, WireMessage};
    use prost::Message;

    use super::*;
    use crate::device::Transport;
    use crate::factory::{FamilySpec, load_client};

    type SentLog = Rc<RefCell<Vec<(u16, Vec<u8>)>>>;

    /// Replays scripted device responses and records what the host sent
    #[derive(Default)]
    struct ScriptedLink {
        responses: VecDeque<(u16, Vec<u8>)>,
        sent: SentLog,
    }

    impl ScriptedLink {
        fn reply<M: WireMessage>(mut self, message: M) -> Self {
            self.responses.push_back((M::TYPE.id(), message.encode_to_vec()));
            self
        }
    }

    impl Link for ScriptedLink {
        fn send(&mut self, msg_type: u16, payload: &[u8]) -> keepkey_hid::Result<()> {
            self.sent.borrow_mut().push((msg_type, payload.to_vec()));
            Ok(())
        }

        fn receive(&mut self) -> keepkey_hid::Result<(u16, Vec<u8>)> {
            self.responses.pop_front().ok_or(keepkey_hid::Error::Timeout)
        }
    }

    /// Hands out one scripted link per attached device
    struct ScriptedTransport {
        family: String,
        links: RefCell<Vec<ScriptedLink>>,
    }

    impl ScriptedTransport {
        fn new(family: &str, links: Vec<ScriptedLink>) -> Self {
            Self {
                family: family.to_string(),
                links: RefCell::new(links),
            }
        }
    }

    impl Transport for ScriptedTransport {
        type Handle = usize;

        fn enumerate(&self) -> Result<Vec<usize>> {
            Ok((0..self.links.borrow().len()).collect())
        }

        fn connect(&self, _handle: usize) -> Result<Box<dyn Connection>> {
            let link = self.links.borrow_mut().remove(0);
            Ok(Box::new(WireConnection::open(&self.family, link)?))
        }
    }

    fn trezor_one(major: u32, minor: u32, patch: u32) -> messages::Features {
        messages::Features {
            vendor: Some("bitcointrezor.com".to_string()),
            major_version: Some(major),
            minor_version: Some(minor),
            patch_version: Some(patch),
            device_id: Some("D1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_hid_trezor_with_old_firmware_is_rejected() {
        let link = ScriptedLink::default().reply(trezor_one(1, 3, 3));
        let transport = ScriptedTransport::new("Trezor", vec![link]);

        match load_client(&FamilySpec::trezor(), &transport) {
            Err(Error::FirmwareTooOld { family, current, .. }) => {
                assert_eq!(family, "Trezor");
                assert_eq!(current.to_string(), "1.3.3");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("1.3.3 must not be accepted"),
        }
    }

    #[test]
    fn test_hid_trezor_at_minimum_is_selected() -> anyhow::Result<()> {
        let link = ScriptedLink::default().reply(trezor_one(1, 3, 4));
        let transport = ScriptedTransport::new("Trezor", vec![link]);

        let clients = load_client(&FamilySpec::trezor(), &transport)?;
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].connection().features().device_id, "D1");
        assert_eq!(clients[0].connection().features().vendor, "bitcointrezor.com");
        Ok(())
    }

    #[test]
    fn test_passphrase_request_gets_empty_answer() -> anyhow::Result<()> {
        let link = ScriptedLink::default()
            .reply(trezor_one(1, 4, 0))
            .reply(messages::PassphraseRequest {})
            .reply(messages::Success {
                message: Some("hello".to_string()),
            });
        let sent = Rc::clone(&link.sent);
        let transport = ScriptedTransport::new("Trezor", vec![link]);

        // load_client installs the empty-passphrase handler
        let mut clients = load_client(&FamilySpec::trezor(), &transport)?;
        clients[0].connection_mut().ping("hello")?;

        let sent = sent.borrow();
        let types: Vec<u16> = sent.iter().map(|(ty, _)| *ty).collect();
        assert_eq!(
            types,
            vec![
                MessageType::Initialize.id(),
                MessageType::Ping.id(),
                MessageType::PassphraseAck.id(),
            ]
        );
        let ack = messages::PassphraseAck::decode(sent[2].1.as_slice())?;
        assert_eq!(ack.passphrase, "");
        Ok(())
    }

    #[test]
    fn test_custom_passphrase_handler_is_adapted() -> anyhow::Result<()> {
        let link = ScriptedLink::default()
            .reply(trezor_one(1, 4, 0))
            .reply(messages::PassphraseRequest {})
            .reply(messages::Success::default());
        let sent = Rc::clone(&link.sent);

        let mut connection = WireConnection::open("KeepKey", link)?;
        connection.set_passphrase_handler(Box::new(|| crate::device::PassphraseAck::new("abc")));
        connection.ping("x")?;

        let ack = messages::PassphraseAck::decode(sent.borrow()[2].1.as_slice())?;
        assert_eq!(ack.passphrase, "abc");
        Ok(())
    }

    #[test]
    fn test_device_failure_keeps_family() {
        let link = ScriptedLink::default().reply(messages::Failure {
            code: Some(9),
            message: Some("Firmware error".to_string()),
        });
        match WireConnection::open("KeepKey", link) {
            Err(Error::Device { family, message }) => {
                assert_eq!(family, "KeepKey");
                assert_eq!(message, "Firmware error (code 9)");
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("handshake should fail"),
        }
    }

    #[test]
    fn test_pin_request_maps_to_family_error() -> anyhow::Result<()> {
        let link = ScriptedLink::default()
            .reply(trezor_one(1, 4, 0))
            .reply(messages::PinMatrixRequest { r#type: Some(1) });
        let mut connection = WireConnection::open("Trezor", link)?;
        assert!(matches!(
            connection.ping("x"),
            Err(Error::PinRequired { family }) if family == "Trezor"
        ));
        Ok(())
    }

    #[test]
    fn test_convert_features_defaults_missing_fields() {
        let features = keepkey_hid::Features {
            major_version: Some(7),
            minor_version: Some(1),
            revision: Some(vec![0x12]),
            ..Default::default()
        };
        let converted = convert_features(&features);
        assert_eq!(converted.version().to_string(), "7.1.0");
        assert_eq!(converted.label, "");
        assert_eq!(converted.revision, vec![0x12]);
    }
}
