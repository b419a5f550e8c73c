//! Capabilities the core is built on: a 256-bit hash primitive and a secure
//! entropy source, plus the byte helpers shared by every component.
use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

/// Hashes one byte sequence to 32 bytes.
pub trait HashPrimitive: Debug {
    fn hash(&self, data: &[u8]) -> [u8; 32];
}

/// Fills buffers with cryptographically secure randomness.
pub trait EntropySource: Debug {
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// SHA-256, the default primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Primitive;

impl HashPrimitive for Sha256Primitive {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Primitive;

impl HashPrimitive for Blake3Primitive {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        blake3::hash(data).into()
    }
}

/// Operating-system entropy via `OsRng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|err| Error::RandomSourceFailure(err.to_string()))
    }
}

impl<T: HashPrimitive + ?Sized> HashPrimitive for &T {
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        (**self).hash(data)
    }
}

impl<T: EntropySource + ?Sized> EntropySource for &T {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        (**self).fill(buf)
    }
}

/// Concatenate byte sequences in order, with no length encoding.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Count leading zero bits; an all-zero input counts every bit.
pub fn leading_zero_bits(hash: &[u8]) -> u32 {
    let mut count = 0u32;
    for byte in hash {
        if *byte == 0 {
            count += 8;
            continue;
        }
        count += byte.leading_zeros();
        break;
    }
    count
}
