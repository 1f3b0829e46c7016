//! Finalized blocks and their headers.

use serde::{Deserialize, Serialize};

use crate::types::ids::BlockHash;
use crate::types::solution::CoinbaseSolution;
use crate::types::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderMetadata {
    pub network: u16,
    pub round: u64,
    pub height: u32,
    pub coinbase_target: u64,
    pub proof_target: u64,
    pub last_coinbase_target: u64,
    pub last_coinbase_timestamp: i64,
    pub timestamp: i64,
    pub total_supply: u64,
    pub cumulative_proof_target: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous_state_root: String,
    pub transactions_root: String,
    pub coinbase_accumulator_point: String,
    pub finalize_root: String,
    pub metadata: BlockHeaderMetadata,
}

/// One finalized ledger unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_hash: BlockHash,
    pub previous_hash: BlockHash,
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub coinbase: Option<CoinbaseSolution>,
    /// Mining reward for this block, computed post-hoc by the consensus
    /// library. Required whenever `coinbase` is present.
    pub coinbase_reward: Option<u64>,
    pub signature: String,
}

impl Block {
    pub fn height(&self) -> u32 {
        self.header.metadata.height
    }

    pub fn timestamp(&self) -> i64 {
        self.header.metadata.timestamp
    }

    /// Canonical byte encoding of the whole block.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::BlockHash;

    fn minimal_block() -> Block {
        Block {
            block_hash: BlockHash::new("ab1block"),
            previous_hash: BlockHash::new("ab1prev"),
            header: BlockHeader {
                previous_state_root: "sr1prev".to_string(),
                transactions_root: "field1txroot".to_string(),
                coinbase_accumulator_point: "field1acc".to_string(),
                finalize_root: "field1fin".to_string(),
                metadata: BlockHeaderMetadata {
                    network: 3,
                    round: 7,
                    height: 42,
                    coinbase_target: 1000,
                    proof_target: 100,
                    last_coinbase_target: 1000,
                    last_coinbase_timestamp: 1_675_000_000,
                    timestamp: 1_675_000_015,
                    total_supply: 1_500_000_000_000_000,
                    cumulative_proof_target: 12345,
                },
            },
            transactions: vec![],
            coinbase: None,
            coinbase_reward: None,
            signature: "sign1block".to_string(),
        }
    }

    #[test]
    fn byte_encoding_round_trips() {
        let block = minimal_block();
        let bytes = block.to_bytes().unwrap();
        assert_eq!(Block::from_bytes(&bytes).unwrap(), block);
    }
}
