//! Core protocol types shared by the chain index and the economic layer.
//!
//! Block and transaction payloads are validated and serialized elsewhere;
//! this crate only deals in the metadata the chain index needs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte block identity hash.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// How a block's validity was established.
///
/// The chain accepts proof-of-work blocks up to the last PoW height and
/// proof-of-stake blocks afterwards; the stake-weight estimator only samples
/// [`ProofOfStake`](BlockKind::ProofOfStake) entries.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Block secured by a proof-of-work nonce.
    ProofOfWork,
    /// Block secured by a coin-stake kernel.
    ProofOfStake,
}
