//! Transaction types: deploys and executions.

use serde::{Deserialize, Serialize};

use crate::types::ids::{Address, TransactionId};
use crate::types::program::Program;
use crate::types::transition::Transition;

/// A fee payment: exactly one transition plus its inclusion data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub transition: Transition,
    pub global_state_root: String,
    pub inclusion_proof: Option<String>,
}

/// Who deployed a program, with their deployment signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOwner {
    pub address: Address,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub edition: u16,
    pub program: Program,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployTransaction {
    pub id: TransactionId,
    pub owner: ProgramOwner,
    pub deployment: Deployment,
    pub fee: Fee,
}

/// The executed transitions of an execute transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub transitions: Vec<Transition>,
    pub global_state_root: String,
    pub inclusion_proof: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteTransaction {
    pub id: TransactionId,
    pub execution: Execution,
    pub additional_fee: Option<Fee>,
}

/// A transaction in a block, in its two on-chain flavors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    Deploy(DeployTransaction),
    Execute(ExecuteTransaction),
}

impl Transaction {
    /// Discriminator persisted in the `type` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::Deploy(_) => "Deploy",
            Transaction::Execute(_) => "Execute",
        }
    }

    pub fn id(&self) -> &TransactionId {
        match self {
            Transaction::Deploy(tx) => &tx.id,
            Transaction::Execute(tx) => &tx.id,
        }
    }
}
