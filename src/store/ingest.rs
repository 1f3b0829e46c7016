//! Block ingestion.
//!
//! One block, one SQLite transaction: either every row of the block's
//! transaction/transition graph (and the reward bookkeeping it triggers)
//! becomes visible at once, or none of it does. The single logical writer
//! feeds blocks in increasing-height order; the per-function call counter
//! and leaderboard increments are read-modify-write sequences that are only
//! atomic inside this one transaction.

use rusqlite::{params, Connection, OptionalExtension, Transaction as SqlTx};

use crate::error::{Result, StoreError};
use crate::events::StoreEvent;
use crate::rewards::{incentive_window_open, split_reward};
use crate::store::Database;
use crate::types::{
    Block, CoinbaseSolution, DeployTransaction, ExecuteTransaction, Fee, FinalizeValue, Transaction,
    Transition, TransitionInput, TransitionOutput, NATIVE_PROGRAM_ID,
};

impl Database {
    /// Writes one validated block. All-or-nothing: any failure rolls back the
    /// whole block and is surfaced as an `Error` event plus a returned error;
    /// on success a `BlockAdded` event carries the new height.
    pub fn save_block(&self, block: &Block) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            insert_block(&tx, block)?;
            tx.commit()?;
            Ok(())
        })?;
        self.emit(StoreEvent::BlockAdded(block.height()));
        Ok(())
    }
}

fn insert_block(tx: &SqlTx<'_>, block: &Block) -> Result<()> {
    // The stored chain has no gaps and no forks: a new block must extend the
    // current tip exactly. The first block may start the chain anywhere.
    let latest: Option<i64> = tx.query_row("SELECT MAX(height) FROM block", [], |row| row.get(0))?;
    if let Some(latest) = latest {
        if i64::from(block.height()) != latest + 1 {
            return Err(StoreError::Consistency(format!(
                "block height {} does not extend stored tip {}",
                block.height(),
                latest
            )));
        }
    }

    let meta = &block.header.metadata;
    tx.execute(
        "INSERT INTO block (height, block_hash, previous_hash, previous_state_root, \
         transactions_root, coinbase_accumulator_point, finalize_root, network, round, \
         coinbase_target, proof_target, last_coinbase_target, last_coinbase_timestamp, \
         timestamp, total_supply, cumulative_proof_target, signature) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            meta.height as i64,
            block.block_hash.as_str(),
            block.previous_hash.as_str(),
            block.header.previous_state_root,
            block.header.transactions_root,
            block.header.coinbase_accumulator_point,
            block.header.finalize_root,
            meta.network as i64,
            meta.round as i64,
            meta.coinbase_target as i64,
            meta.proof_target as i64,
            meta.last_coinbase_target as i64,
            meta.last_coinbase_timestamp,
            meta.timestamp,
            meta.total_supply as i64,
            meta.cumulative_proof_target as i64,
            block.signature,
        ],
    )?;
    let block_db_id = tx.last_insert_rowid();

    for (tx_index, transaction) in block.transactions.iter().enumerate() {
        match transaction {
            Transaction::Deploy(deploy) => {
                insert_deploy(tx, block_db_id, tx_index as i64, deploy)?
            }
            Transaction::Execute(execute) => {
                insert_execute(tx, block_db_id, tx_index as i64, execute)?
            }
        }
    }

    if let Some(coinbase) = &block.coinbase {
        insert_coinbase(tx, block_db_id, block, coinbase)?;
    }

    Ok(())
}

fn insert_transaction_row(
    tx: &SqlTx<'_>,
    block_db_id: i64,
    transaction_id: &str,
    kind: &str,
    index: i64,
) -> Result<i64> {
    tx.execute(
        "INSERT INTO \"transaction\" (block_id, transaction_id, type, \"index\") \
         VALUES (?1, ?2, ?3, ?4)",
        params![block_db_id, transaction_id, kind, index],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_deploy(
    tx: &SqlTx<'_>,
    block_db_id: i64,
    index: i64,
    deploy: &DeployTransaction,
) -> Result<()> {
    let transaction_db_id =
        insert_transaction_row(tx, block_db_id, deploy.id.as_str(), "Deploy", index)?;
    tx.execute(
        "INSERT INTO transaction_deploy (transaction_id, edition) VALUES (?1, ?2)",
        params![transaction_db_id, deploy.deployment.edition],
    )?;
    let deploy_db_id = tx.last_insert_rowid();

    let program = &deploy.deployment.program;
    tx.execute(
        "INSERT INTO program (transaction_deploy_id, program_id, import, mapping, interface, \
         record, closure, function, raw_data, is_helloworld, feature_hash, owner, signature) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            deploy_db_id,
            program.id.as_str(),
            serde_json::to_string(&program.imports)?,
            serde_json::to_string(&program.mappings)?,
            serde_json::to_string(&program.interfaces)?,
            serde_json::to_string(&program.records)?,
            serde_json::to_string(&program.closures)?,
            serde_json::to_string(&program.function_names())?,
            program.raw_bytes,
            program.is_helloworld(),
            program.feature_hash(),
            deploy.owner.address.as_str(),
            deploy.owner.signature,
        ],
    )?;
    let program_db_id = tx.last_insert_rowid();

    for function in &program.functions {
        tx.execute(
            "INSERT INTO program_function (program_id, name, input, input_mode, output, \
             output_mode, finalize) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                program_db_id,
                function.name,
                serde_json::to_string(&function.inputs)?,
                serde_json::to_string(&function.input_modes)?,
                serde_json::to_string(&function.outputs)?,
                serde_json::to_string(&function.output_modes)?,
                serde_json::to_string(&function.finalize_inputs)?,
            ],
        )?;
    }

    insert_fee(tx, transaction_db_id, &deploy.fee)
}

fn insert_execute(
    tx: &SqlTx<'_>,
    block_db_id: i64,
    index: i64,
    execute: &ExecuteTransaction,
) -> Result<()> {
    let transaction_db_id =
        insert_transaction_row(tx, block_db_id, execute.id.as_str(), "Execute", index)?;
    tx.execute(
        "INSERT INTO transaction_execute (transaction_id, global_state_root, inclusion_proof) \
         VALUES (?1, ?2, ?3)",
        params![
            transaction_db_id,
            execute.execution.global_state_root,
            execute.execution.inclusion_proof,
        ],
    )?;
    let execute_db_id = tx.last_insert_rowid();

    for (ts_index, transition) in execute.execution.transitions.iter().enumerate() {
        insert_transition(tx, Some(execute_db_id), None, transition, ts_index as i64)?;
    }

    if let Some(fee) = &execute.additional_fee {
        insert_fee(tx, transaction_db_id, fee)?;
    }
    Ok(())
}

fn insert_fee(tx: &SqlTx<'_>, transaction_db_id: i64, fee: &Fee) -> Result<()> {
    tx.execute(
        "INSERT INTO fee (transaction_id, global_state_root, inclusion_proof) \
         VALUES (?1, ?2, ?3)",
        params![transaction_db_id, fee.global_state_root, fee.inclusion_proof],
    )?;
    let fee_db_id = tx.last_insert_rowid();
    insert_transition(tx, None, Some(fee_db_id), &fee.transition, 0)
}

fn insert_transition(
    tx: &SqlTx<'_>,
    execute_db_id: Option<i64>,
    fee_db_id: Option<i64>,
    transition: &Transition,
    index: i64,
) -> Result<()> {
    tx.execute(
        "INSERT INTO transition (transition_id, transaction_execute_id, fee_id, program_id, \
         function_name, proof, tpk, tcm, \"index\") \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            transition.id.as_str(),
            execute_db_id,
            fee_db_id,
            transition.program_id.as_str(),
            transition.function_name,
            transition.proof,
            transition.tpk,
            transition.tcm,
            index,
        ],
    )?;
    let transition_db_id = tx.last_insert_rowid();

    for (input_index, input) in transition.inputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO transition_input (transition_id, type, \"index\") VALUES (?1, ?2, ?3)",
            params![transition_db_id, input.kind(), input_index as i64],
        )?;
        let input_db_id = tx.last_insert_rowid();
        match input {
            TransitionInput::Public {
                plaintext_hash,
                plaintext,
            } => tx.execute(
                "INSERT INTO transition_input_public (transition_input_id, plaintext_hash, \
                 plaintext) VALUES (?1, ?2, ?3)",
                params![input_db_id, plaintext_hash, plaintext],
            )?,
            TransitionInput::Private {
                ciphertext_hash,
                ciphertext,
            } => tx.execute(
                "INSERT INTO transition_input_private (transition_input_id, ciphertext_hash, \
                 ciphertext) VALUES (?1, ?2, ?3)",
                params![input_db_id, ciphertext_hash, ciphertext],
            )?,
            TransitionInput::Record { serial_number, tag } => tx.execute(
                "INSERT INTO transition_input_record (transition_input_id, serial_number, tag) \
                 VALUES (?1, ?2, ?3)",
                params![input_db_id, serial_number, tag],
            )?,
            TransitionInput::ExternalRecord { commitment } => tx.execute(
                "INSERT INTO transition_input_external_record (transition_input_id, commitment) \
                 VALUES (?1, ?2)",
                params![input_db_id, commitment],
            )?,
        };
    }

    for (output_index, output) in transition.outputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO transition_output (transition_id, type, \"index\") VALUES (?1, ?2, ?3)",
            params![transition_db_id, output.kind(), output_index as i64],
        )?;
        let output_db_id = tx.last_insert_rowid();
        match output {
            TransitionOutput::Public {
                plaintext_hash,
                plaintext,
            } => tx.execute(
                "INSERT INTO transition_output_public (transition_output_id, plaintext_hash, \
                 plaintext) VALUES (?1, ?2, ?3)",
                params![output_db_id, plaintext_hash, plaintext],
            )?,
            TransitionOutput::Private {
                ciphertext_hash,
                ciphertext,
            } => tx.execute(
                "INSERT INTO transition_output_private (transition_output_id, ciphertext_hash, \
                 ciphertext) VALUES (?1, ?2, ?3)",
                params![output_db_id, ciphertext_hash, ciphertext],
            )?,
            TransitionOutput::Record {
                commitment,
                checksum,
                record_ciphertext,
            } => tx.execute(
                "INSERT INTO transition_output_record (transition_output_id, commitment, \
                 checksum, record_ciphertext) VALUES (?1, ?2, ?3, ?4)",
                params![output_db_id, commitment, checksum, record_ciphertext],
            )?,
            TransitionOutput::ExternalRecord { commitment } => tx.execute(
                "INSERT INTO transition_output_external_record (transition_output_id, \
                 commitment) VALUES (?1, ?2)",
                params![output_db_id, commitment],
            )?,
        };
    }

    if let Some(finalize) = &transition.finalize {
        for (finalize_index, value) in finalize.iter().enumerate() {
            tx.execute(
                "INSERT INTO transition_finalize (transition_id, type, \"index\") \
                 VALUES (?1, ?2, ?3)",
                params![transition_db_id, value.kind(), finalize_index as i64],
            )?;
            let finalize_db_id = tx.last_insert_rowid();
            match value {
                FinalizeValue::Plaintext(plaintext) => tx.execute(
                    "INSERT INTO transition_finalize_plaintext (transition_finalize_id, \
                     plaintext) VALUES (?1, ?2)",
                    params![finalize_db_id, plaintext],
                )?,
                FinalizeValue::Record(record) => tx.execute(
                    "INSERT INTO transition_finalize_record (transition_finalize_id, record) \
                     VALUES (?1, ?2)",
                    params![finalize_db_id, record],
                )?,
            };
        }
    }

    // Call statistics, skipping the native fee program. Read-modify-write is
    // safe here only because it happens inside the block's transaction.
    if transition.program_id.as_str() != NATIVE_PROGRAM_ID {
        let program_db_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM program WHERE program_id = ?1",
                [transition.program_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let program_db_id = program_db_id.ok_or_else(|| {
            StoreError::Consistency(format!(
                "executed transition references undeployed program {}",
                transition.program_id
            ))
        })?;
        tx.execute(
            "UPDATE program_function SET called = called + 1 WHERE program_id = ?1 AND name = ?2",
            params![program_db_id, transition.function_name],
        )?;
    }

    Ok(())
}

fn insert_coinbase(
    tx: &SqlTx<'_>,
    block_db_id: i64,
    block: &Block,
    coinbase: &CoinbaseSolution,
) -> Result<()> {
    let coinbase_reward = block.coinbase_reward.ok_or_else(|| {
        StoreError::Consistency("coinbase solution present without a computed reward".to_string())
    })?;
    tx.execute(
        "UPDATE block SET coinbase_reward = ?1 WHERE id = ?2",
        params![coinbase_reward as i64, block_db_id],
    )?;

    let targets: Vec<u64> = coinbase
        .partial_solutions
        .iter()
        .map(|solution| solution.commitment.to_target())
        .collect();
    let target_sum: u128 = targets.iter().map(|&t| t as u128).sum();
    let rewards = split_reward(coinbase_reward, &targets);

    tx.execute(
        "INSERT INTO coinbase_solution (block_id, proof_x, proof_y_positive, target_sum) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            block_db_id,
            coinbase.proof.x,
            coinbase.proof.y_is_positive,
            target_sum as u64 as i64,
        ],
    )?;
    let coinbase_db_id = tx.last_insert_rowid();

    // The cap side of the window predicate is re-evaluated per solution
    // against the running credit, so incentive stops mid-block the moment
    // the cap is reached. Each solution is checked BEFORE its own addition.
    let mut total_credit = read_or_init_total_credit(tx)?;
    let mut credited: u64 = 0;

    for ((solution, &target), &reward) in coinbase
        .partial_solutions
        .iter()
        .zip(&targets)
        .zip(&rewards)
    {
        tx.execute(
            "INSERT INTO partial_solution (coinbase_solution_id, address, nonce, commitment, \
             target, reward) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                coinbase_db_id,
                solution.address.as_str(),
                solution.nonce as i64,
                solution.commitment.as_str(),
                target as i64,
                reward as i64,
            ],
        )?;
        // Zero-reward solutions are kept for audit but never touch the
        // leaderboard.
        if reward > 0 {
            tx.execute(
                "INSERT INTO leaderboard (address, total_reward, total_incentive) \
                 VALUES (?1, ?2, 0) \
                 ON CONFLICT(address) DO UPDATE SET \
                 total_reward = total_reward + excluded.total_reward",
                params![solution.address.as_str(), reward as i64],
            )?;
            if incentive_window_open(block.height(), block.timestamp(), total_credit) {
                tx.execute(
                    "UPDATE leaderboard SET total_incentive = total_incentive + ?1 \
                     WHERE address = ?2",
                    params![reward as i64, solution.address.as_str()],
                )?;
                total_credit = total_credit.saturating_add(reward);
                credited += reward;
            }
        }
    }

    if credited > 0 {
        tx.execute(
            "UPDATE leaderboard_total SET total_credit = total_credit + ?1 WHERE id = 1",
            params![credited as i64],
        )?;
    }

    Ok(())
}

/// Reads the single leaderboard_total row, creating it at zero on first use.
pub(crate) fn read_or_init_total_credit(conn: &Connection) -> Result<u64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT total_credit FROM leaderboard_total WHERE id = 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(credit) => Ok(credit as u64),
        None => {
            conn.execute("INSERT INTO leaderboard_total (id, total_credit) VALUES (1, 0)", [])?;
            Ok(0)
        }
    }
}
