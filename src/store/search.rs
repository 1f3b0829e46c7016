//! Prefix search over stored identifiers.
//!
//! Every search takes a bare prefix, matches case-sensitively against the
//! canonical string form of the identifier, and returns at most the
//! configured result limit.

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::store::Database;
use crate::types::{Address, BlockHash, ProgramId, TransactionId, TransitionId};

fn search_column(
    conn: &Connection,
    sql: &str,
    prefix: &str,
    limit: u32,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![format!("{}%", prefix), limit], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(rows)
}

impl Database {
    pub fn search_block_hash(&self, prefix: &str) -> Result<Vec<BlockHash>> {
        let limit = self.search_limit();
        self.with_conn(|conn| {
            let rows = search_column(
                conn,
                "SELECT block_hash FROM block WHERE block_hash LIKE ?1 LIMIT ?2",
                prefix,
                limit,
            )?;
            Ok(rows.into_iter().map(BlockHash::new).collect())
        })
    }

    pub fn search_transaction_id(&self, prefix: &str) -> Result<Vec<TransactionId>> {
        let limit = self.search_limit();
        self.with_conn(|conn| {
            let rows = search_column(
                conn,
                "SELECT transaction_id FROM \"transaction\" WHERE transaction_id LIKE ?1 \
                 LIMIT ?2",
                prefix,
                limit,
            )?;
            Ok(rows.into_iter().map(TransactionId::new).collect())
        })
    }

    pub fn search_transition_id(&self, prefix: &str) -> Result<Vec<TransitionId>> {
        let limit = self.search_limit();
        self.with_conn(|conn| {
            let rows = search_column(
                conn,
                "SELECT transition_id FROM transition WHERE transition_id LIKE ?1 LIMIT ?2",
                prefix,
                limit,
            )?;
            Ok(rows.into_iter().map(TransitionId::new).collect())
        })
    }

    /// Searches addresses that have earned at least one puzzle reward.
    pub fn search_address(&self, prefix: &str) -> Result<Vec<Address>> {
        let limit = self.search_limit();
        self.with_conn(|conn| {
            let rows = search_column(
                conn,
                "SELECT address FROM leaderboard WHERE address LIKE ?1 LIMIT ?2",
                prefix,
                limit,
            )?;
            Ok(rows.into_iter().map(Address::new).collect())
        })
    }

    pub fn search_program_id(&self, prefix: &str) -> Result<Vec<ProgramId>> {
        let limit = self.search_limit();
        self.with_conn(|conn| {
            let rows = search_column(
                conn,
                "SELECT program_id FROM program WHERE program_id LIKE ?1 LIMIT ?2",
                prefix,
                limit,
            )?;
            Ok(rows.into_iter().map(ProgramId::new).collect())
        })
    }
}
