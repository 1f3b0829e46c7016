//! Program catalog queries.
//!
//! List and inspection queries over deployed programs: paging, call counts,
//! structural-similarity lookups via the stored feature hash, and single
//! function definitions. Paging is half-open `[start, end)` over the listing
//! order, newest deployment first.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::store::Database;
use crate::types::{FunctionSpec, ProgramId, TransactionId, TransitionId};

/// One row of the program listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    pub program_id: ProgramId,
    pub height: u32,
    pub transaction_id: TransactionId,
    /// Total times any of the program's functions has been executed.
    pub called: u64,
}

/// One recorded execution of a program function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCall {
    pub height: u32,
    pub timestamp: i64,
    pub transition_id: TransitionId,
    pub function_name: String,
}

fn helloworld_filter(no_helloworld: bool) -> &'static str {
    if no_helloworld {
        "AND p.is_helloworld = 0"
    } else {
        ""
    }
}

fn program_db_id(conn: &Connection, program_id: &ProgramId) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM program WHERE program_id = ?1",
            [program_id.as_str()],
            |row| row.get(0),
        )
        .optional()?)
}

fn list_programs(
    conn: &Connection,
    feature_hash: Option<&[u8]>,
    no_helloworld: bool,
    start: u32,
    end: u32,
) -> Result<Vec<ProgramSummary>> {
    if end <= start {
        return Ok(vec![]);
    }
    let sql = format!(
        "SELECT p.program_id, b.height, t.transaction_id, \
         (SELECT COALESCE(SUM(called), 0) FROM program_function WHERE program_id = p.id) \
         FROM program p \
         JOIN transaction_deploy td ON p.transaction_deploy_id = td.id \
         JOIN \"transaction\" t ON td.transaction_id = t.id \
         JOIN block b ON t.block_id = b.id \
         WHERE (?1 IS NULL OR p.feature_hash = ?1) {} \
         ORDER BY b.height DESC, p.id DESC LIMIT ?2 OFFSET ?3",
        helloworld_filter(no_helloworld)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![feature_hash, end - start, start], |row| {
            Ok(ProgramSummary {
                program_id: ProgramId::new(row.get::<_, String>(0)?),
                height: row.get::<_, i64>(1)? as u32,
                transaction_id: TransactionId::new(row.get::<_, String>(2)?),
                called: row.get::<_, i64>(3)? as u64,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Database {
    /// Number of deployed programs, optionally excluding trivial
    /// hello-world-shaped deployments.
    pub fn get_program_count(&self, no_helloworld: bool) -> Result<u64> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT COUNT(*) FROM program p WHERE 1 = 1 {}",
                helloworld_filter(no_helloworld)
            );
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    /// Pages the program listing, newest deployment first.
    pub fn get_programs(
        &self,
        start: u32,
        end: u32,
        no_helloworld: bool,
    ) -> Result<Vec<ProgramSummary>> {
        self.with_conn(|conn| list_programs(conn, None, no_helloworld, start, end))
    }

    /// Pages programs whose structure matches a feature hash, given in the
    /// hex form produced by [`Database::get_program_feature_hash`].
    pub fn get_programs_with_feature_hash(
        &self,
        feature_hash: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<ProgramSummary>> {
        self.with_conn(|conn| {
            let raw = hex::decode(feature_hash)
                .map_err(|e| StoreError::Query(format!("malformed feature hash: {}", e)))?;
            list_programs(conn, Some(raw.as_slice()), false, start, end)
        })
    }

    /// Total execution count across a program's functions, `None` when the
    /// program is not deployed.
    pub fn get_program_called_times(&self, program_id: &ProgramId) -> Result<Option<u64>> {
        self.with_conn(|conn| {
            let db_id = match program_db_id(conn, program_id)? {
                Some(id) => id,
                None => return Ok(None),
            };
            let called: i64 = conn.query_row(
                "SELECT COALESCE(SUM(called), 0) FROM program_function WHERE program_id = ?1",
                [db_id],
                |row| row.get(0),
            )?;
            Ok(Some(called as u64))
        })
    }

    /// Pages the recorded executions of a program, newest first.
    pub fn get_program_calls(
        &self,
        program_id: &ProgramId,
        start: u32,
        end: u32,
    ) -> Result<Vec<ProgramCall>> {
        self.with_conn(|conn| {
            if end <= start {
                return Ok(vec![]);
            }
            let mut stmt = conn.prepare(
                "SELECT b.height, b.timestamp, ts.transition_id, ts.function_name \
                 FROM transition ts \
                 JOIN transaction_execute te ON ts.transaction_execute_id = te.id \
                 JOIN \"transaction\" t ON te.transaction_id = t.id \
                 JOIN block b ON t.block_id = b.id \
                 WHERE ts.program_id = ?1 \
                 ORDER BY b.height DESC, ts.id DESC LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![program_id.as_str(), end - start, start], |row| {
                    Ok(ProgramCall {
                        height: row.get::<_, i64>(0)? as u32,
                        timestamp: row.get(1)?,
                        transition_id: TransitionId::new(row.get::<_, String>(2)?),
                        function_name: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Number of OTHER deployed programs with the same structure, `None` when
    /// the program is not deployed.
    pub fn get_program_similar_count(&self, program_id: &ProgramId) -> Result<Option<u64>> {
        self.with_conn(|conn| {
            let count: Option<i64> = conn
                .query_row(
                    "SELECT COUNT(*) FROM program WHERE feature_hash = \
                     (SELECT feature_hash FROM program WHERE program_id = ?1)",
                    [program_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            // COUNT over the empty match set still yields one row of 0.
            Ok(count.filter(|&c| c > 0).map(|c| (c - 1) as u64))
        })
    }

    /// Hex-encoded structural fingerprint of a deployed program.
    pub fn get_program_feature_hash(&self, program_id: &ProgramId) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let raw: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT feature_hash FROM program WHERE program_id = ?1",
                    [program_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw.map(hex::encode))
        })
    }

    /// The stored definition of one function of a deployed program.
    pub fn get_function_definition(
        &self,
        program_id: &ProgramId,
        function_name: &str,
    ) -> Result<Option<FunctionSpec>> {
        self.with_conn(|conn| {
            let row: Option<(String, String, String, String, String)> = conn
                .query_row(
                    "SELECT pf.input, pf.input_mode, pf.output, pf.output_mode, pf.finalize \
                     FROM program_function pf JOIN program p ON pf.program_id = p.id \
                     WHERE p.program_id = ?1 AND pf.name = ?2",
                    params![program_id.as_str(), function_name],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                        ))
                    },
                )
                .optional()?;
            let (input, input_mode, output, output_mode, finalize) = match row {
                Some(row) => row,
                None => return Ok(None),
            };
            Ok(Some(FunctionSpec {
                name: function_name.to_string(),
                inputs: serde_json::from_str(&input)?,
                input_modes: serde_json::from_str(&input_mode)?,
                outputs: serde_json::from_str(&output)?,
                output_modes: serde_json::from_str(&output_mode)?,
                finalize_inputs: serde_json::from_str(&finalize)?,
            }))
        })
    }
}
