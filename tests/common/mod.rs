//! Shared fixtures for the storage integration tests.

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver};
use tempfile::TempDir;

use chainscan::events::StoreEvent;
use chainscan::store::Database;
use chainscan::types::{
    Address, Block, BlockHash, BlockHeader, BlockHeaderMetadata, CoinbaseSolution, Commitment,
    DeployTransaction, Deployment, ExecuteTransaction, Execution, Fee, FunctionSpec,
    PartialSolution, Program, ProgramId, ProgramOwner, PuzzleProof, TransactionId, Transition,
    TransitionId, TransitionInput, TransitionOutput, NATIVE_PROGRAM_ID,
};

/// Helper to open a fresh file-backed store. The TempDir must stay alive for
/// the duration of the test.
pub fn test_db() -> Result<(Database, Receiver<StoreEvent>, TempDir), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("test.db");
    let path = path.to_str().ok_or("non-utf8 temp path")?;
    let (tx, rx) = unbounded();
    let db = Database::open(path, tx)?;
    Ok((db, rx, dir))
}

/// A block with no transactions and no coinbase, hashes derived from height.
pub fn block_at(height: u32, timestamp: i64) -> Block {
    Block {
        block_hash: BlockHash::new(format!("ab1block{}", height)),
        previous_hash: BlockHash::new(format!("ab1block{}", height.wrapping_sub(1))),
        header: BlockHeader {
            previous_state_root: format!("sr1root{}", height),
            transactions_root: format!("field1txroot{}", height),
            coinbase_accumulator_point: format!("field1acc{}", height),
            finalize_root: format!("field1fin{}", height),
            metadata: BlockHeaderMetadata {
                network: 3,
                round: u64::from(height) * 2,
                height,
                coinbase_target: 1_000_000,
                proof_target: 50_000,
                last_coinbase_target: 1_000_000,
                last_coinbase_timestamp: timestamp - 15,
                timestamp,
                total_supply: 1_500_000_000_000_000,
                cumulative_proof_target: u64::from(height) * 100,
            },
        },
        transactions: vec![],
        coinbase: None,
        coinbase_reward: None,
        signature: format!("sign1block{}", height),
    }
}

pub fn solution(address: &str, commitment: &str) -> PartialSolution {
    PartialSolution {
        address: Address::new(address),
        nonce: commitment.len() as u64,
        commitment: Commitment::new(commitment),
    }
}

/// Attaches a coinbase solution and its precomputed reward to a block.
pub fn add_coinbase(block: &mut Block, reward: u64, solutions: Vec<PartialSolution>) {
    block.coinbase = Some(CoinbaseSolution {
        partial_solutions: solutions,
        proof: PuzzleProof {
            x: format!("puzzleproof{}", block.height()),
            y_is_positive: false,
        },
    });
    block.coinbase_reward = Some(reward);
}

/// A fee transition of the native program.
pub fn credits_transition(suffix: &str) -> Transition {
    Transition {
        id: TransitionId::new(format!("au1fee{}", suffix)),
        program_id: ProgramId::new(NATIVE_PROGRAM_ID),
        function_name: "fee".to_string(),
        inputs: vec![
            TransitionInput::Record {
                serial_number: format!("serial{}", suffix),
                tag: format!("tag{}", suffix),
            },
            TransitionInput::Public {
                plaintext_hash: format!("hash{}", suffix),
                plaintext: Some(b"1000u64".to_vec()),
            },
        ],
        outputs: vec![TransitionOutput::Record {
            commitment: format!("cm1fee{}", suffix),
            checksum: format!("checksum{}", suffix),
            record_ciphertext: Some(format!("record1fee{}", suffix)),
        }],
        finalize: None,
        proof: format!("proof1fee{}", suffix),
        tpk: format!("tpk1fee{}", suffix),
        tcm: format!("tcm1fee{}", suffix),
    }
}

pub fn fee(suffix: &str) -> Fee {
    Fee {
        transition: credits_transition(suffix),
        global_state_root: format!("sr1fee{}", suffix),
        inclusion_proof: Some(format!("proof1incl{}", suffix)),
    }
}

/// A two-function marketplace program, structurally distinct from the
/// hello-world template.
pub fn market_program(id: &str) -> Program {
    Program {
        id: ProgramId::new(id),
        imports: vec![ProgramId::new(NATIVE_PROGRAM_ID)],
        mappings: vec!["listings".to_string()],
        interfaces: vec![],
        records: vec!["Ticket".to_string()],
        closures: vec![],
        functions: vec![
            FunctionSpec {
                name: "list".to_string(),
                inputs: vec!["u64".to_string()],
                input_modes: vec!["public".to_string()],
                outputs: vec!["Ticket".to_string()],
                output_modes: vec!["private".to_string()],
                finalize_inputs: vec!["u64".to_string()],
            },
            FunctionSpec {
                name: "buy".to_string(),
                inputs: vec!["Ticket".to_string(), "u64".to_string()],
                input_modes: vec!["private".to_string(), "public".to_string()],
                outputs: vec![],
                output_modes: vec![],
                finalize_inputs: vec![],
            },
        ],
        raw_bytes: format!("program {};", id).into_bytes(),
    }
}

/// The hello-world tutorial shape under a fresh name.
pub fn helloworld_program(id: &str) -> Program {
    Program {
        id: ProgramId::new(id),
        imports: vec![],
        mappings: vec![],
        interfaces: vec![],
        records: vec![],
        closures: vec![],
        functions: vec![FunctionSpec {
            name: "main".to_string(),
            inputs: vec!["u32".to_string(), "u32".to_string()],
            input_modes: vec!["public".to_string(), "private".to_string()],
            outputs: vec!["u32".to_string()],
            output_modes: vec!["private".to_string()],
            finalize_inputs: vec![],
        }],
        raw_bytes: format!("program {};", id).into_bytes(),
    }
}

pub fn deploy_transaction(suffix: &str, program: Program) -> DeployTransaction {
    DeployTransaction {
        id: TransactionId::new(format!("at1deploy{}", suffix)),
        owner: ProgramOwner {
            address: Address::new(format!("aleo1owner{}", suffix)),
            signature: format!("sign1owner{}", suffix),
        },
        deployment: Deployment { edition: 0, program },
        fee: fee(&format!("deploy{}", suffix)),
    }
}

pub fn execute_transaction(suffix: &str, transitions: Vec<Transition>) -> ExecuteTransaction {
    ExecuteTransaction {
        id: TransactionId::new(format!("at1execute{}", suffix)),
        execution: Execution {
            transitions,
            global_state_root: format!("sr1execute{}", suffix),
            inclusion_proof: None,
        },
        additional_fee: None,
    }
}

/// A transition exercising every input/output variant plus finalize values.
pub fn rich_transition(suffix: &str, program_id: &str, function_name: &str) -> Transition {
    Transition {
        id: TransitionId::new(format!("au1call{}", suffix)),
        program_id: ProgramId::new(program_id),
        function_name: function_name.to_string(),
        inputs: vec![
            TransitionInput::Public {
                plaintext_hash: format!("hash1pub{}", suffix),
                plaintext: Some(b"42u64".to_vec()),
            },
            TransitionInput::Private {
                ciphertext_hash: format!("hash1priv{}", suffix),
                ciphertext: Some(format!("ciphertext{}", suffix)),
            },
            TransitionInput::Record {
                serial_number: format!("serial1in{}", suffix),
                tag: format!("tag1in{}", suffix),
            },
            TransitionInput::ExternalRecord {
                commitment: format!("cm1extin{}", suffix),
            },
        ],
        outputs: vec![
            TransitionOutput::Public {
                plaintext_hash: format!("hash1pubout{}", suffix),
                plaintext: None,
            },
            TransitionOutput::Private {
                ciphertext_hash: format!("hash1privout{}", suffix),
                ciphertext: None,
            },
            TransitionOutput::Record {
                commitment: format!("cm1out{}", suffix),
                checksum: format!("checksum1out{}", suffix),
                record_ciphertext: Some(format!("record1out{}", suffix)),
            },
            TransitionOutput::ExternalRecord {
                commitment: format!("cm1extout{}", suffix),
            },
        ],
        finalize: Some(vec![
            chainscan::types::FinalizeValue::Plaintext(b"7u64".to_vec()),
            chainscan::types::FinalizeValue::Record(format!("record1fin{}", suffix)),
        ]),
        proof: format!("proof1call{}", suffix),
        tpk: format!("tpk1call{}", suffix),
        tcm: format!("tcm1call{}", suffix),
    }
}

/// Drains pending events, returning them in order.
pub fn drain_events(rx: &Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = vec![];
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
