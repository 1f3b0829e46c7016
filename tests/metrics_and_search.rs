//! Integration tests for solving-rate estimation and prefix search.

mod common;

use common::*;

use chrono::Utc;
use crossbeam_channel::unbounded;

use chainscan::config::DatabaseConfig;
use chainscan::store::Database;
use chainscan::types::{Address, PartialSolution, Transaction};

fn solutions_for(address: &str, prefix: &str, count: usize) -> Vec<PartialSolution> {
    (0..count)
        .map(|i| solution(address, &format!("{}{}", prefix, i)))
        .collect()
}

#[test]
fn test_solving_rate_uses_previous_block_difficulty() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;

    let now = Utc::now().timestamp();
    db.save_block(&block_at(100, now - 120))?;

    // 10 qualifying solutions for alice, 3 for bob, all against the proof
    // target of block 100.
    let mut block = block_at(101, now - 60);
    let mut solutions = solutions_for("aleo1alice", "puzzle1a", 10);
    solutions.extend(solutions_for("aleo1bob", "puzzle1b", 3));
    add_coinbase(&mut block, 1_000_000, solutions);
    db.save_block(&block)?;

    let proof_target = 50_000f64; // from the fixture header

    let (rate, window) = db.get_network_rate()?;
    assert_eq!(window, 900);
    assert!((rate - 13.0 * proof_target / 900.0).abs() < 1e-9);

    let (rate, window) = db.get_address_rate(&Address::new("aleo1alice"))?;
    assert_eq!(window, 900);
    assert!((rate - 10.0 * proof_target / 900.0).abs() < 1e-9);

    // Too few solutions in every window: no estimate.
    assert_eq!(db.get_address_rate(&Address::new("aleo1bob"))?, (0.0, 0));
    assert_eq!(db.get_address_rate(&Address::new("aleo1nobody"))?, (0.0, 0));

    Ok(())
}

#[test]
fn test_solutions_without_previous_block_never_qualify() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;

    // Plenty of recent solutions, but the block before this one is not
    // stored, so there is no difficulty to measure them against.
    let now = Utc::now().timestamp();
    let mut block = block_at(500, now - 30);
    add_coinbase(&mut block, 1_000_000, solutions_for("aleo1alice", "puzzle1solo", 12));
    db.save_block(&block)?;

    assert_eq!(db.get_network_rate()?, (0.0, 0));
    assert_eq!(db.get_address_rate(&Address::new("aleo1alice"))?, (0.0, 0));

    Ok(())
}

#[test]
fn test_stale_solutions_fall_out_of_the_ladder() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;

    // Solutions two days old are outside even the widest window.
    let stale = Utc::now().timestamp() - 2 * 86_400;
    db.save_block(&block_at(100, stale - 15))?;
    let mut block = block_at(101, stale);
    add_coinbase(&mut block, 1_000_000, solutions_for("aleo1alice", "puzzle1old", 15));
    db.save_block(&block)?;

    assert_eq!(db.get_network_rate()?, (0.0, 0));

    Ok(())
}

#[test]
fn test_prefix_search_finds_identifiers() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;

    let mut block = block_at(1, 1_660_000_000);
    block.transactions = vec![
        Transaction::Deploy(deploy_transaction("s", market_program("market_s.aleo"))),
        Transaction::Execute(execute_transaction(
            "s",
            vec![rich_transition("s1", "market_s.aleo", "list")],
        )),
    ];
    add_coinbase(&mut block, 1_000_000, vec![solution("aleo1alice", "puzzle1s")]);
    db.save_block(&block)?;

    let hashes = db.search_block_hash("ab1block")?;
    assert_eq!(hashes.len(), 1);
    assert_eq!(hashes[0].as_str(), "ab1block1");

    let transactions = db.search_transaction_id("at1")?;
    assert_eq!(transactions.len(), 2);
    assert!(db.search_transaction_id("at1deploy")?.len() == 1);

    // Execution and fee transitions are both searchable.
    assert_eq!(db.search_transition_id("au1call")?.len(), 1);
    assert_eq!(db.search_transition_id("au1fee")?.len(), 1);

    assert_eq!(db.search_program_id("market_")?.len(), 1);

    // Only addresses with earned rewards are searchable.
    let addresses = db.search_address("aleo1ali")?;
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0], Address::new("aleo1alice"));
    assert!(db.search_address("aleo1owner")?.is_empty());

    // Prefix match only, no substring match.
    assert!(db.search_block_hash("block1")?.is_empty());
    assert!(db.search_block_hash("zz1")?.is_empty());

    Ok(())
}

#[test]
fn test_search_respects_configured_limit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("limited.db");
    let config = DatabaseConfig {
        path: path.to_str().ok_or("non-utf8 temp path")?.to_string(),
        search_limit: 2,
    };
    let (tx, _rx) = unbounded();
    let db = Database::from_config(&config, tx)?;

    for height in 1..=5u32 {
        db.save_block(&block_at(height, 1_660_000_000 + i64::from(height) * 15))?;
    }

    assert_eq!(db.search_block_hash("ab1block")?.len(), 2);
    assert_eq!(db.search_block_hash("ab1block3")?.len(), 1);

    Ok(())
}
