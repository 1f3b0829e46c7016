//! Integration tests for the program catalog queries.

mod common;

use common::*;

use chainscan::events::StoreEvent;
use chainscan::types::{ProgramId, Transaction};

/// Two structurally identical marketplace programs, one hello-world clone,
/// and a handful of executions of the first marketplace.
fn seed(db: &chainscan::store::Database) -> Result<(), Box<dyn std::error::Error>> {
    let mut first = block_at(1, 1_660_000_000);
    first.transactions = vec![
        Transaction::Deploy(deploy_transaction("p1", market_program("market_one.aleo"))),
        Transaction::Deploy(deploy_transaction("h1", helloworld_program("hello_copy.aleo"))),
    ];
    db.save_block(&first)?;

    let mut second = block_at(2, 1_660_000_015);
    second.transactions = vec![
        Transaction::Deploy(deploy_transaction("p2", market_program("market_two.aleo"))),
        Transaction::Execute(execute_transaction(
            "calls",
            vec![
                rich_transition("c1", "market_one.aleo", "list"),
                rich_transition("c2", "market_one.aleo", "buy"),
                rich_transition("c3", "market_two.aleo", "list"),
                rich_transition("c4", "market_one.aleo", "list"),
            ],
        )),
    ];
    db.save_block(&second)?;
    Ok(())
}

#[test]
fn test_program_count_and_listing() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;
    seed(&db)?;

    assert_eq!(db.get_program_count(false)?, 3);
    assert_eq!(db.get_program_count(true)?, 2);

    // Newest deployment first; within one block, later transaction first.
    let all = db.get_programs(0, 10, false)?;
    let ids: Vec<&str> = all.iter().map(|p| p.program_id.as_str()).collect();
    assert_eq!(ids, vec!["market_two.aleo", "hello_copy.aleo", "market_one.aleo"]);
    assert_eq!(all[0].height, 2);
    assert_eq!(all[2].height, 1);
    assert_eq!(all[2].transaction_id.as_str(), "at1deployp1");

    // Call counters aggregate over all functions of the program.
    assert_eq!(all[0].called, 1);
    assert_eq!(all[1].called, 0);
    assert_eq!(all[2].called, 3);

    let no_hello = db.get_programs(0, 10, true)?;
    assert_eq!(no_hello.len(), 2);
    assert!(no_hello.iter().all(|p| p.program_id.as_str() != "hello_copy.aleo"));

    // Half-open paging.
    let page = db.get_programs(1, 2, false)?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].program_id.as_str(), "hello_copy.aleo");
    assert!(db.get_programs(3, 10, false)?.is_empty());

    Ok(())
}

#[test]
fn test_feature_hash_groups_similar_programs() -> Result<(), Box<dyn std::error::Error>> {
    let (db, rx, _dir) = test_db()?;
    seed(&db)?;
    drain_events(&rx);

    let market_hash = db
        .get_program_feature_hash(&ProgramId::new("market_one.aleo"))?
        .ok_or("hash missing")?;
    assert_eq!(market_hash, hex::encode(market_program("any.aleo").feature_hash()));
    assert_eq!(
        db.get_program_feature_hash(&ProgramId::new("market_two.aleo"))?,
        Some(market_hash.clone())
    );
    let hello_hash = db
        .get_program_feature_hash(&ProgramId::new("hello_copy.aleo"))?
        .ok_or("hash missing")?;
    assert_ne!(market_hash, hello_hash);
    assert_eq!(db.get_program_feature_hash(&ProgramId::new("nope.aleo"))?, None);

    // A malformed hash fails and is reported through the sink exactly once,
    // like any other store failure.
    assert!(db.get_programs_with_feature_hash("not hex", 0, 10).is_err());
    let events = drain_events(&rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StoreEvent::Error(_)));

    let matches = db.get_programs_with_feature_hash(&market_hash, 0, 10)?;
    let ids: Vec<&str> = matches.iter().map(|p| p.program_id.as_str()).collect();
    assert_eq!(ids, vec!["market_two.aleo", "market_one.aleo"]);

    // Similar count excludes the program itself.
    assert_eq!(
        db.get_program_similar_count(&ProgramId::new("market_one.aleo"))?,
        Some(1)
    );
    assert_eq!(
        db.get_program_similar_count(&ProgramId::new("hello_copy.aleo"))?,
        Some(0)
    );
    assert_eq!(
        db.get_program_similar_count(&ProgramId::new("nope.aleo"))?,
        None
    );

    Ok(())
}

#[test]
fn test_call_statistics() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;
    seed(&db)?;

    assert_eq!(
        db.get_program_called_times(&ProgramId::new("market_one.aleo"))?,
        Some(3)
    );
    assert_eq!(
        db.get_program_called_times(&ProgramId::new("hello_copy.aleo"))?,
        Some(0)
    );
    assert_eq!(
        db.get_program_called_times(&ProgramId::new("nope.aleo"))?,
        None
    );

    // Calls come back newest first.
    let calls = db.get_program_calls(&ProgramId::new("market_one.aleo"), 0, 10)?;
    let summary: Vec<(&str, &str)> = calls
        .iter()
        .map(|c| (c.transition_id.as_str(), c.function_name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("au1callc4", "list"),
            ("au1callc2", "buy"),
            ("au1callc1", "list"),
        ]
    );
    assert!(calls.iter().all(|c| c.height == 2));

    let page = db.get_program_calls(&ProgramId::new("market_one.aleo"), 1, 2)?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].transition_id.as_str(), "au1callc2");

    Ok(())
}

#[test]
fn test_function_definition_lookup() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _rx, _dir) = test_db()?;
    seed(&db)?;

    let list = db
        .get_function_definition(&ProgramId::new("market_one.aleo"), "list")?
        .ok_or("function missing")?;
    assert_eq!(list.name, "list");
    assert_eq!(list.inputs, vec!["u64"]);
    assert_eq!(list.input_modes, vec!["public"]);
    assert_eq!(list.outputs, vec!["Ticket"]);
    assert_eq!(list.output_modes, vec!["private"]);
    assert_eq!(list.finalize_inputs, vec!["u64"]);

    assert_eq!(
        db.get_function_definition(&ProgramId::new("market_one.aleo"), "nope")?,
        None
    );
    assert_eq!(
        db.get_function_definition(&ProgramId::new("nope.aleo"), "list")?,
        None
    );

    Ok(())
}
