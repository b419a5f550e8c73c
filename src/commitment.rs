//! Salted hash commitments: `c = H(r || message)` with a fresh 32-byte `r`.
//!
//! Binding holds as far as the chosen [`HashVariant`] is collision resistant.
//! Hiding holds as far as `c` alone cannot be inverted, which stops being true
//! once the digest is truncated to 8 or 16 bits.
use crate::core::{concat, EntropySource, HashPrimitive, OsEntropy, Sha256Primitive};
use crate::digest::{Digest, HashEngine, HashVariant};
use crate::error::Result;
use serde::{Deserialize, Serialize};

pub const SALT_LEN: usize = 32;

/// A commitment `c` together with its opening salt `r`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    pub c: Digest,
    pub r: [u8; SALT_LEN],
}

impl Commitment {
    pub fn salt_hex(&self) -> String {
        hex::encode(self.r)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitmentScheme<H = Sha256Primitive, E = OsEntropy> {
    engine: HashEngine<H>,
    entropy: E,
}

impl<H: HashPrimitive, E: EntropySource> CommitmentScheme<H, E> {
    pub fn new(engine: HashEngine<H>, entropy: E) -> Self {
        Self { engine, entropy }
    }

    pub fn engine(&self) -> &HashEngine<H> {
        &self.engine
    }

    /// Commit to `message` under a freshly drawn salt.
    ///
    /// Fails with [`crate::Error::RandomSourceFailure`] rather than falling back
    /// to a weak or empty salt.
    pub fn commit(&self, message: &[u8], variant: HashVariant) -> Result<Commitment> {
        let mut salt = [0u8; SALT_LEN];
        self.entropy.fill(&mut salt)?;
        Ok(self.commit_with_salt(salt, message, variant))
    }

    /// Commit to `message` under a caller-chosen salt.
    pub fn commit_with_salt(
        &self,
        salt: [u8; SALT_LEN],
        message: &[u8],
        variant: HashVariant,
    ) -> Commitment {
        let c = self.engine.digest(&concat(&[&salt[..], message]), variant);
        Commitment { c, r: salt }
    }

    /// True iff `H(commitment.r || message)` equals `commitment.c`.
    pub fn verify(&self, commitment: &Commitment, message: &[u8], variant: HashVariant) -> bool {
        self.engine
            .verify(&concat(&[&commitment.r[..], message]), &commitment.c, variant)
    }
}
