//! Puzzle solution and leaderboard queries.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::error::Result;
use crate::store::ingest::read_or_init_total_credit;
use crate::store::Database;
use crate::types::{Address, Commitment};

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub address: Address,
    pub total_reward: u64,
    pub total_incentive: u64,
}

/// One accepted solution of an address, with its block context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSolution {
    pub height: u32,
    pub timestamp: i64,
    pub commitment: Commitment,
    pub nonce: u64,
    pub target: u64,
    /// Sum of all solution targets in the same block.
    pub target_sum: u64,
    pub reward: u64,
}

/// One accepted solution within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSolution {
    pub address: Address,
    pub nonce: u64,
    pub commitment: Commitment,
    pub target: u64,
    pub reward: u64,
}

/// Where a commitment landed and what it paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitmentInfo {
    pub height: u32,
    pub reward: u64,
}

const ADDRESS_SOLUTION_SQL: &str = "SELECT b.height, b.timestamp, ps.commitment, ps.nonce, \
     ps.target, cs.target_sum, ps.reward \
     FROM partial_solution ps \
     JOIN coinbase_solution cs ON ps.coinbase_solution_id = cs.id \
     JOIN block b ON cs.block_id = b.id \
     WHERE ps.address = ?1 ORDER BY b.height DESC, ps.id DESC LIMIT ?2 OFFSET ?3";

fn map_address_solution(row: &rusqlite::Row<'_>) -> rusqlite::Result<AddressSolution> {
    Ok(AddressSolution {
        height: row.get::<_, i64>(0)? as u32,
        timestamp: row.get(1)?,
        commitment: Commitment::new(row.get::<_, String>(2)?),
        nonce: row.get::<_, i64>(3)? as u64,
        target: row.get::<_, i64>(4)? as u64,
        target_sum: row.get::<_, i64>(5)? as u64,
        reward: row.get::<_, i64>(6)? as u64,
    })
}

impl Database {
    pub fn get_leaderboard_size(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM leaderboard", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Pages the leaderboard, ranked by incentive earnings then total reward.
    pub fn get_leaderboard(&self, start: u32, end: u32) -> Result<Vec<LeaderboardEntry>> {
        self.with_conn(|conn| {
            if end <= start {
                return Ok(vec![]);
            }
            let mut stmt = conn.prepare(
                "SELECT address, total_reward, total_incentive FROM leaderboard \
                 ORDER BY total_incentive DESC, total_reward DESC LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map(params![end - start, start], |row| {
                    Ok(LeaderboardEntry {
                        address: Address::new(row.get::<_, String>(0)?),
                        total_reward: row.get::<_, i64>(1)? as u64,
                        total_incentive: row.get::<_, i64>(2)? as u64,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// `(total_reward, total_incentive)` of one address, `None` if it has
    /// never earned a reward.
    pub fn get_leaderboard_rewards_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<(u64, u64)>> {
        self.with_conn(|conn| {
            let row: Option<(i64, i64)> = conn
                .query_row(
                    "SELECT total_reward, total_incentive FROM leaderboard WHERE address = ?1",
                    [address.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(row.map(|(reward, incentive)| (reward as u64, incentive as u64)))
        })
    }

    /// Total incentive credit paid out so far, across all addresses.
    pub fn get_leaderboard_total(&self) -> Result<u64> {
        self.with_conn(read_or_init_total_credit)
    }

    /// The 30 most recent solutions of an address.
    pub fn get_recent_solutions_by_address(
        &self,
        address: &Address,
    ) -> Result<Vec<AddressSolution>> {
        self.get_solution_by_address(address, 0, 30)
    }

    /// Pages an address's solutions, newest first.
    pub fn get_solution_by_address(
        &self,
        address: &Address,
        start: u32,
        end: u32,
    ) -> Result<Vec<AddressSolution>> {
        self.with_conn(|conn| {
            if end <= start {
                return Ok(vec![]);
            }
            let mut stmt = conn.prepare(ADDRESS_SOLUTION_SQL)?;
            let rows = stmt
                .query_map(
                    params![address.as_str(), end - start, start],
                    map_address_solution,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Pages a block's solutions, hardest (largest target) first.
    pub fn get_solution_by_height(
        &self,
        height: u32,
        start: u32,
        end: u32,
    ) -> Result<Vec<BlockSolution>> {
        self.with_conn(|conn| {
            if end <= start {
                return Ok(vec![]);
            }
            let mut stmt = conn.prepare(
                "SELECT ps.address, ps.nonce, ps.commitment, ps.target, ps.reward \
                 FROM partial_solution ps \
                 JOIN coinbase_solution cs ON ps.coinbase_solution_id = cs.id \
                 JOIN block b ON cs.block_id = b.id \
                 WHERE b.height = ?1 ORDER BY ps.target DESC LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![height as i64, end - start, start], |row| {
                    Ok(BlockSolution {
                        address: Address::new(row.get::<_, String>(0)?),
                        nonce: row.get::<_, i64>(1)? as u64,
                        commitment: Commitment::new(row.get::<_, String>(2)?),
                        target: row.get::<_, i64>(3)? as u64,
                        reward: row.get::<_, i64>(4)? as u64,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_solution_count_by_address(&self, address: &Address) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM partial_solution WHERE address = ?1",
                [address.as_str()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Looks up an accepted commitment: the height it landed at and the
    /// reward it paid.
    pub fn get_puzzle_commitment(&self, commitment: &Commitment) -> Result<Option<CommitmentInfo>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT b.height, ps.reward FROM partial_solution ps \
                     JOIN coinbase_solution cs ON ps.coinbase_solution_id = cs.id \
                     JOIN block b ON cs.block_id = b.id \
                     WHERE ps.commitment = ?1",
                    [commitment.as_str()],
                    |row| {
                        Ok(CommitmentInfo {
                            height: row.get::<_, i64>(0)? as u32,
                            reward: row.get::<_, i64>(1)? as u64,
                        })
                    },
                )
                .optional()?)
        })
    }

    /// Coinbase reward of a block, `None` when the block is absent or its
    /// reward was never computed.
    pub fn get_block_coinbase_reward_by_height(&self, height: u32) -> Result<Option<u64>> {
        self.with_conn(|conn| {
            let reward: Option<Option<i64>> = conn
                .query_row(
                    "SELECT coinbase_reward FROM block WHERE height = ?1",
                    [height as i64],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(reward.flatten().map(|r| r as u64))
        })
    }

    /// Sum of the solution targets of a block's coinbase solution.
    pub fn get_block_target_sum_by_height(&self, height: u32) -> Result<Option<u64>> {
        self.with_conn(|conn| {
            let sum: Option<i64> = conn
                .query_row(
                    "SELECT cs.target_sum FROM coinbase_solution cs \
                     JOIN block b ON cs.block_id = b.id WHERE b.height = ?1",
                    [height as i64],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(sum.map(|s| s as u64))
        })
    }
}
