//! Database persistence layer for chainscan.
//!
//! [`Database`] is an explicit storage handle over SQLite: open it once,
//! pass it by reference into every component, drop it to close. All failures
//! are reported through the injected event sink exactly once and then
//! returned to the caller; the caller owns retry policy.

pub mod ingest;
pub mod metrics;
pub mod programs;
pub mod reconstruct;
pub mod search;
pub mod solutions;

use rusqlite::Connection;
use std::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};
use crate::events::{EventSink, StoreEvent};

/// Relational schema, rooted at `block`. Reserved words (`transaction`,
/// `index`) are quoted. Child order is always persisted in an explicit
/// `"index"` column; physical row order is never relied on. Foreign keys
/// cascade on delete so [`Database::clear`] is a single cascading delete.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS block (
    id INTEGER PRIMARY KEY,
    height INTEGER NOT NULL UNIQUE,
    block_hash TEXT NOT NULL UNIQUE,
    previous_hash TEXT NOT NULL,
    previous_state_root TEXT NOT NULL,
    transactions_root TEXT NOT NULL,
    coinbase_accumulator_point TEXT NOT NULL,
    finalize_root TEXT NOT NULL,
    network INTEGER NOT NULL,
    round INTEGER NOT NULL,
    coinbase_target INTEGER NOT NULL,
    proof_target INTEGER NOT NULL,
    last_coinbase_target INTEGER NOT NULL,
    last_coinbase_timestamp INTEGER NOT NULL,
    timestamp INTEGER NOT NULL,
    total_supply INTEGER NOT NULL,
    cumulative_proof_target INTEGER NOT NULL,
    signature TEXT NOT NULL,
    coinbase_reward INTEGER
);

CREATE TABLE IF NOT EXISTS "transaction" (
    id INTEGER PRIMARY KEY,
    block_id INTEGER NOT NULL REFERENCES block(id) ON DELETE CASCADE,
    transaction_id TEXT NOT NULL UNIQUE,
    type TEXT NOT NULL,
    "index" INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transaction_block_id ON "transaction" (block_id);

CREATE TABLE IF NOT EXISTS transaction_deploy (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL REFERENCES "transaction"(id) ON DELETE CASCADE,
    edition INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transaction_deploy_transaction_id ON transaction_deploy (transaction_id);

CREATE TABLE IF NOT EXISTS transaction_execute (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL REFERENCES "transaction"(id) ON DELETE CASCADE,
    global_state_root TEXT NOT NULL,
    inclusion_proof TEXT
);
CREATE INDEX IF NOT EXISTS transaction_execute_transaction_id ON transaction_execute (transaction_id);

CREATE TABLE IF NOT EXISTS fee (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL REFERENCES "transaction"(id) ON DELETE CASCADE,
    global_state_root TEXT NOT NULL,
    inclusion_proof TEXT
);
CREATE INDEX IF NOT EXISTS fee_transaction_id ON fee (transaction_id);

CREATE TABLE IF NOT EXISTS program (
    id INTEGER PRIMARY KEY,
    transaction_deploy_id INTEGER NOT NULL REFERENCES transaction_deploy(id) ON DELETE CASCADE,
    program_id TEXT NOT NULL UNIQUE,
    import TEXT NOT NULL,
    mapping TEXT NOT NULL,
    interface TEXT NOT NULL,
    record TEXT NOT NULL,
    closure TEXT NOT NULL,
    function TEXT NOT NULL,
    raw_data BLOB NOT NULL,
    is_helloworld INTEGER NOT NULL,
    feature_hash BLOB NOT NULL,
    owner TEXT NOT NULL,
    signature TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS program_feature_hash ON program (feature_hash);

CREATE TABLE IF NOT EXISTS program_function (
    id INTEGER PRIMARY KEY,
    program_id INTEGER NOT NULL REFERENCES program(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    input TEXT NOT NULL,
    input_mode TEXT NOT NULL,
    output TEXT NOT NULL,
    output_mode TEXT NOT NULL,
    finalize TEXT NOT NULL,
    called INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS program_function_program_id ON program_function (program_id);

CREATE TABLE IF NOT EXISTS transition (
    id INTEGER PRIMARY KEY,
    transition_id TEXT NOT NULL UNIQUE,
    transaction_execute_id INTEGER REFERENCES transaction_execute(id) ON DELETE CASCADE,
    fee_id INTEGER REFERENCES fee(id) ON DELETE CASCADE,
    program_id TEXT NOT NULL,
    function_name TEXT NOT NULL,
    proof TEXT NOT NULL,
    tpk TEXT NOT NULL,
    tcm TEXT NOT NULL,
    "index" INTEGER NOT NULL,
    CHECK ((transaction_execute_id IS NULL) <> (fee_id IS NULL))
);
CREATE INDEX IF NOT EXISTS transition_transaction_execute_id ON transition (transaction_execute_id);
CREATE INDEX IF NOT EXISTS transition_fee_id ON transition (fee_id);
CREATE INDEX IF NOT EXISTS transition_program_id ON transition (program_id);

CREATE TABLE IF NOT EXISTS transition_input (
    id INTEGER PRIMARY KEY,
    transition_id INTEGER NOT NULL REFERENCES transition(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    "index" INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transition_input_transition_id ON transition_input (transition_id);

CREATE TABLE IF NOT EXISTS transition_input_public (
    id INTEGER PRIMARY KEY,
    transition_input_id INTEGER NOT NULL REFERENCES transition_input(id) ON DELETE CASCADE,
    plaintext_hash TEXT NOT NULL,
    plaintext BLOB
);

CREATE TABLE IF NOT EXISTS transition_input_private (
    id INTEGER PRIMARY KEY,
    transition_input_id INTEGER NOT NULL REFERENCES transition_input(id) ON DELETE CASCADE,
    ciphertext_hash TEXT NOT NULL,
    ciphertext TEXT
);

CREATE TABLE IF NOT EXISTS transition_input_record (
    id INTEGER PRIMARY KEY,
    transition_input_id INTEGER NOT NULL REFERENCES transition_input(id) ON DELETE CASCADE,
    serial_number TEXT NOT NULL,
    tag TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transition_input_external_record (
    id INTEGER PRIMARY KEY,
    transition_input_id INTEGER NOT NULL REFERENCES transition_input(id) ON DELETE CASCADE,
    commitment TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transition_output (
    id INTEGER PRIMARY KEY,
    transition_id INTEGER NOT NULL REFERENCES transition(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    "index" INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transition_output_transition_id ON transition_output (transition_id);

CREATE TABLE IF NOT EXISTS transition_output_public (
    id INTEGER PRIMARY KEY,
    transition_output_id INTEGER NOT NULL REFERENCES transition_output(id) ON DELETE CASCADE,
    plaintext_hash TEXT NOT NULL,
    plaintext BLOB
);

CREATE TABLE IF NOT EXISTS transition_output_private (
    id INTEGER PRIMARY KEY,
    transition_output_id INTEGER NOT NULL REFERENCES transition_output(id) ON DELETE CASCADE,
    ciphertext_hash TEXT NOT NULL,
    ciphertext TEXT
);

CREATE TABLE IF NOT EXISTS transition_output_record (
    id INTEGER PRIMARY KEY,
    transition_output_id INTEGER NOT NULL REFERENCES transition_output(id) ON DELETE CASCADE,
    commitment TEXT NOT NULL,
    checksum TEXT NOT NULL,
    record_ciphertext TEXT
);

CREATE TABLE IF NOT EXISTS transition_output_external_record (
    id INTEGER PRIMARY KEY,
    transition_output_id INTEGER NOT NULL REFERENCES transition_output(id) ON DELETE CASCADE,
    commitment TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transition_finalize (
    id INTEGER PRIMARY KEY,
    transition_id INTEGER NOT NULL REFERENCES transition(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    "index" INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transition_finalize_transition_id ON transition_finalize (transition_id);

CREATE TABLE IF NOT EXISTS transition_finalize_plaintext (
    id INTEGER PRIMARY KEY,
    transition_finalize_id INTEGER NOT NULL REFERENCES transition_finalize(id) ON DELETE CASCADE,
    plaintext BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS transition_finalize_record (
    id INTEGER PRIMARY KEY,
    transition_finalize_id INTEGER NOT NULL REFERENCES transition_finalize(id) ON DELETE CASCADE,
    record TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS coinbase_solution (
    id INTEGER PRIMARY KEY,
    block_id INTEGER NOT NULL UNIQUE REFERENCES block(id) ON DELETE CASCADE,
    proof_x TEXT NOT NULL,
    proof_y_positive INTEGER NOT NULL,
    target_sum INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS partial_solution (
    id INTEGER PRIMARY KEY,
    coinbase_solution_id INTEGER NOT NULL REFERENCES coinbase_solution(id) ON DELETE CASCADE,
    address TEXT NOT NULL,
    nonce INTEGER NOT NULL,
    commitment TEXT NOT NULL UNIQUE,
    target INTEGER NOT NULL,
    reward INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS partial_solution_coinbase_solution_id ON partial_solution (coinbase_solution_id);
CREATE INDEX IF NOT EXISTS partial_solution_address ON partial_solution (address);

CREATE TABLE IF NOT EXISTS leaderboard (
    address TEXT PRIMARY KEY,
    total_reward INTEGER NOT NULL DEFAULT 0,
    total_incentive INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS leaderboard_total (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    total_credit INTEGER NOT NULL DEFAULT 0
);
"#;

pub struct Database {
    conn: Mutex<Connection>,
    sink: EventSink,
    search_limit: u32,
}

impl Database {
    /// Opens (creating if needed) the store at `path` and prepares the
    /// schema. Emits `Connected` on success, `ConnectError` on failure.
    pub fn open(path: &str, sink: EventSink) -> Result<Self> {
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(e) => {
                let _ = sink.send(StoreEvent::ConnectError(e.to_string()));
                return Err(StoreError::Connection(format!(
                    "failed to open database at {}: {}",
                    path, e
                )));
            }
        };

        if let Err(e) = conn
            .pragma_update(None, "foreign_keys", true)
            .and_then(|_| conn.execute_batch(SCHEMA))
        {
            let _ = sink.send(StoreEvent::ConnectError(e.to_string()));
            return Err(StoreError::Connection(format!(
                "failed to prepare schema: {}",
                e
            )));
        }

        let _ = sink.send(StoreEvent::Connected);
        Ok(Database {
            conn: Mutex::new(conn),
            sink,
            search_limit: 50,
        })
    }

    /// Opens the store described by a [`DatabaseConfig`].
    pub fn from_config(config: &DatabaseConfig, sink: EventSink) -> Result<Self> {
        let mut db = Database::open(&config.path, sink)?;
        db.search_limit = config.search_limit;
        Ok(db)
    }

    pub(crate) fn emit(&self, event: StoreEvent) {
        // A detached sink is the embedder's choice, not a store failure.
        let _ = self.sink.send(event);
    }

    pub(crate) fn search_limit(&self) -> u32 {
        self.search_limit
    }

    /// Acquires the connection for one operation. On failure the error is
    /// reported through the sink exactly once, then returned.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(_) => {
                let err = StoreError::Connection("connection mutex poisoned".to_string());
                self.emit(StoreEvent::Error(err.to_string()));
                return Err(err);
            }
        };
        match f(&conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.emit(StoreEvent::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Destructive debug reset: removes every block and all descendants via
    /// cascading delete. Leaderboard counters are left alone, matching the
    /// block-rooted cascade.
    pub fn clear(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM block", [])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn open_emits_connected() {
        let (tx, rx) = unbounded();
        let _db = Database::open(":memory:", tx).unwrap();
        assert_eq!(rx.recv().unwrap(), StoreEvent::Connected);
    }

    #[test]
    fn open_bad_path_emits_connect_error() {
        let (tx, rx) = unbounded();
        let result = Database::open("/nonexistent-dir/definitely/nope.db", tx);
        assert!(result.is_err());
        assert!(matches!(rx.recv().unwrap(), StoreEvent::ConnectError(_)));
    }

    #[test]
    fn clear_on_empty_store_is_fine() {
        let (tx, _rx) = unbounded();
        let db = Database::open(":memory:", tx).unwrap();
        db.clear().unwrap();
    }
}
