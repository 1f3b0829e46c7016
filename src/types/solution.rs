//! Coinbase puzzle solutions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::ids::Address;

/// A puzzle commitment in canonical string form.
///
/// The numeric difficulty target of a solution is derived from its
/// commitment, not stored on the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(String);

impl Commitment {
    pub fn new(value: impl Into<String>) -> Self {
        Commitment(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the solution's difficulty target: `2^64 - 1` divided by the
    /// low 8 bytes (little-endian) of the sha256 of the canonical rendering.
    /// Smaller hashes mean harder solutions and therefore larger targets.
    pub fn to_target(&self) -> u64 {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::MAX / (u64::from_le_bytes(bytes) | 1)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One submitter's proof-of-work attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSolution {
    pub address: Address,
    pub nonce: u64,
    pub commitment: Commitment,
}

/// Aggregate KZG-style proof over a block's partial solutions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleProof {
    /// x coordinate of the proof point, canonical string form.
    pub x: String,
    /// Sign flag of the y coordinate.
    pub y_is_positive: bool,
}

/// The aggregate of partial solutions submitted for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseSolution {
    pub partial_solutions: Vec<PartialSolution>,
    pub proof: PuzzleProof,
}
