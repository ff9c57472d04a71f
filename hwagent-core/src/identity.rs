//! SLIP-0013 identities
//!
//! An identity names the remote party a key is used for, e.g.
//! `ssh://git@github.com`. The device derives a dedicated hardened key path
//! from it, so every identity gets its own key.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const HARDENED: u32 = 0x8000_0000;
const SLIP13_PURPOSE: u32 = 13;

static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<proto>.*)://)?(?:(?P<user>.*)@)?(?P<host>.*?)(?::(?P<port>\w*))?(?P<path>/.*)?$",
    )
    .expect("identity pattern is valid")
});

/// Which family's identity message layout a device expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityType {
    Trezor,
    KeepKey,
}

impl IdentityType {
    /// Parse `[proto://][user@]host[:port][/path]` into an identity of this type
    pub fn identity(self, uri: &str, index: u32) -> Result<Identity> {
        let caps = IDENTITY_RE
            .captures(uri)
            .ok_or_else(|| Error::InvalidIdentity(uri.to_string()))?;
        let group = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
        };

        let host = group("host").ok_or_else(|| Error::InvalidIdentity(uri.to_string()))?;

        Ok(Identity {
            identity_type: self,
            proto: group("proto"),
            user: group("user"),
            host,
            port: group("port"),
            path: group("path"),
            index,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub identity_type: IdentityType,
    pub proto: Option<String>,
    pub user: Option<String>,
    pub host: String,
    pub port: Option<String>,
    pub path: Option<String>,
    pub index: u32,
}

impl Identity {
    pub fn to_uri(&self) -> String {
        let mut uri = String::new();
        if let Some(proto) = &self.proto {
            uri.push_str(proto);
            uri.push_str("://");
        }
        if let Some(user) = &self.user {
            uri.push_str(user);
            uri.push('@');
        }
        uri.push_str(&self.host);
        if let Some(port) = &self.port {
            uri.push(':');
            uri.push_str(port);
        }
        if let Some(path) = &self.path {
            uri.push_str(path);
        }
        uri
    }

    /// Hardened derivation path `13'/a'/b'/c'/d'` for this identity
    pub fn address_n(&self) -> [u32; 5] {
        let digest = Sha256::new()
            .chain_update(self.index.to_le_bytes())
            .chain_update(self.to_uri().as_bytes())
            .finalize();

        let mut path = [SLIP13_PURPOSE | HARDENED; 5];
        for (slot, word) in path[1..].iter_mut().zip(digest[..16].chunks_exact(4)) {
            *slot = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) | HARDENED;
        }
        path
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for IdentityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trezor" => Ok(Self::Trezor),
            "keepkey" => Ok(Self::KeepKey),
            _ => Err(Error::InvalidIdentity(format!("unknown identity type: {s}"))),
        }
    }
}
