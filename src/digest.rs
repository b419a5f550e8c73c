//! Full and truncated digests over an injected [`HashPrimitive`].
//!
//! A truncated digest is always the leading bytes of the full 256-bit digest of
//! the same input, never an independently derived value.
use crate::core::{HashPrimitive, Sha256Primitive};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Output width of the hash under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashVariant {
    #[serde(rename = "full256")]
    Full256,
    #[serde(rename = "trunc8")]
    Truncated8,
    #[serde(rename = "trunc16")]
    Truncated16,
}

impl HashVariant {
    pub const ALL: [HashVariant; 3] = [
        HashVariant::Full256,
        HashVariant::Truncated8,
        HashVariant::Truncated16,
    ];

    /// Effective output length in bits.
    pub const fn bits(self) -> u32 {
        match self {
            HashVariant::Full256 => 256,
            HashVariant::Truncated8 => 8,
            HashVariant::Truncated16 => 16,
        }
    }

    /// Digest length in bytes.
    pub const fn len(self) -> usize {
        match self {
            HashVariant::Full256 => 32,
            HashVariant::Truncated8 => 1,
            HashVariant::Truncated16 => 2,
        }
    }

    /// Number of distinct outputs, when small enough to enumerate.
    pub const fn output_space(self) -> Option<usize> {
        match self {
            HashVariant::Full256 => None,
            HashVariant::Truncated8 => Some(1 << 8),
            HashVariant::Truncated16 => Some(1 << 16),
        }
    }

    /// Numeric selector: 1 = full, 2 = 8-bit, 3 = 16-bit.
    pub const fn selector(self) -> u8 {
        match self {
            HashVariant::Full256 => 1,
            HashVariant::Truncated8 => 2,
            HashVariant::Truncated16 => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            HashVariant::Full256 => "full256",
            HashVariant::Truncated8 => "trunc8",
            HashVariant::Truncated16 => "trunc16",
        }
    }
}

impl Display for HashVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for HashVariant {
    type Error = Error;

    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        match selector {
            1 => Ok(HashVariant::Full256),
            2 => Ok(HashVariant::Truncated8),
            3 => Ok(HashVariant::Truncated16),
            other => Err(Error::InvalidVariant(other.to_string())),
        }
    }
}

impl FromStr for HashVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "full256" | "full" | "256" => Ok(HashVariant::Full256),
            "2" | "trunc8" | "8" => Ok(HashVariant::Truncated8),
            "3" | "trunc16" | "16" => Ok(HashVariant::Truncated16),
            _ => Err(Error::InvalidVariant(s.to_owned())),
        }
    }
}

/// Immutable digest bytes: 32 for full, 1 or 2 when truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest {
    bytes: Vec<u8>,
}

impl Digest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Big-endian unsigned value of the digest, for widths up to 64 bits.
    pub fn key(&self) -> Option<u64> {
        if self.bytes.len() > 8 {
            return None;
        }
        Some(
            self.bytes
                .iter()
                .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)),
        )
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_hex()
    }
}

impl TryFrom<String> for Digest {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = hex::decode(&value)
            .map_err(|err| Error::InvalidConfig(format!("digest `{value}`: {err}")))?;
        if !HashVariant::ALL.iter().any(|v| v.len() == bytes.len()) {
            return Err(Error::InvalidConfig(format!(
                "digest `{value}` has unsupported length {}",
                bytes.len()
            )));
        }
        Ok(Digest { bytes })
    }
}

/// Full or truncated digests over a hash primitive. Holds no state between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEngine<H = Sha256Primitive> {
    primitive: H,
}

impl<H: HashPrimitive> HashEngine<H> {
    pub fn new(primitive: H) -> Self {
        Self { primitive }
    }

    pub fn primitive(&self) -> &H {
        &self.primitive
    }

    /// The untruncated 256-bit hash of `message`.
    pub fn full(&self, message: &[u8]) -> [u8; 32] {
        self.primitive.hash(message)
    }

    /// Hash `message` and keep the leading bytes the variant calls for.
    pub fn digest(&self, message: &[u8], variant: HashVariant) -> Digest {
        let full = self.full(message);
        Digest {
            bytes: full[..variant.len()].to_vec(),
        }
    }

    /// Recompute the digest of `message` and compare it byte for byte.
    pub fn verify(&self, message: &[u8], expected: &Digest, variant: HashVariant) -> bool {
        self.digest(message, variant) == *expected
    }
}
