//! Solving-rate estimation.
//!
//! Rates are computed over a ladder of trailing wall-clock windows, widening
//! until a window holds enough qualifying solutions to be meaningful. A
//! solution qualifies only when the block before its own exists in the store,
//! because the difficulty it was solved against is the previous block's proof
//! target.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::store::Database;
use crate::types::Address;

/// Trailing windows tried in order, in seconds.
const RATE_WINDOWS: [i64; 6] = [900, 1800, 3600, 14400, 43200, 86400];

/// Minimum qualifying solutions for a window to produce an estimate.
const MIN_SOLUTIONS: i64 = 10;

/// Sums `proof_target` of the previous block over every qualifying solution
/// in the window, optionally restricted to one address. Returns the count of
/// solutions and the summed difficulty.
fn window_difficulty(
    conn: &Connection,
    cutoff: i64,
    address: Option<&Address>,
) -> Result<(i64, u64)> {
    let (count, total): (i64, Option<i64>) = conn.query_row(
        "SELECT COUNT(*), SUM(prev.proof_target) FROM partial_solution ps \
         JOIN coinbase_solution cs ON ps.coinbase_solution_id = cs.id \
         JOIN block b ON cs.block_id = b.id \
         JOIN block prev ON prev.height = b.height - 1 \
         WHERE b.timestamp > ?1 AND (?2 IS NULL OR ps.address = ?2)",
        params![cutoff, address.map(|a| a.as_str())],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((count, total.unwrap_or(0) as u64))
}

fn solving_rate(conn: &Connection, address: Option<&Address>) -> Result<(f64, i64)> {
    let now = Utc::now().timestamp();
    for window in RATE_WINDOWS {
        let (count, difficulty) = window_difficulty(conn, now - window, address)?;
        if count >= MIN_SOLUTIONS {
            return Ok((difficulty as f64 / window as f64, window));
        }
    }
    Ok((0.0, 0))
}

impl Database {
    /// Estimated solving rate of one address and the window it was measured
    /// over. `(0.0, 0)` when no window has enough recent solutions.
    pub fn get_address_rate(&self, address: &Address) -> Result<(f64, i64)> {
        self.with_conn(|conn| solving_rate(conn, Some(address)))
    }

    /// Estimated network-wide solving rate and its measurement window.
    pub fn get_network_rate(&self) -> Result<(f64, i64)> {
        self.with_conn(|conn| solving_rate(conn, None))
    }
}
