//! Transitions: atomic function-execution records.

use serde::{Deserialize, Serialize};

use crate::types::ids::{ProgramId, TransitionId};

/// One input consumed by a transition.
///
/// Exactly one variant applies; the store persists the discriminator plus a
/// single variant sub-record and exhaustive matching keeps the two in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionInput {
    Public {
        plaintext_hash: String,
        /// Canonical bytes of the plaintext, when it was visible on chain.
        plaintext: Option<Vec<u8>>,
    },
    Private {
        ciphertext_hash: String,
        ciphertext: Option<String>,
    },
    Record {
        serial_number: String,
        tag: String,
    },
    ExternalRecord {
        commitment: String,
    },
}

impl TransitionInput {
    /// Discriminator persisted in the `type` column.
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionInput::Public { .. } => "Public",
            TransitionInput::Private { .. } => "Private",
            TransitionInput::Record { .. } => "Record",
            TransitionInput::ExternalRecord { .. } => "ExternalRecord",
        }
    }
}

/// One output produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutput {
    Public {
        plaintext_hash: String,
        plaintext: Option<Vec<u8>>,
    },
    Private {
        ciphertext_hash: String,
        ciphertext: Option<String>,
    },
    Record {
        commitment: String,
        checksum: String,
        record_ciphertext: Option<String>,
    },
    ExternalRecord {
        commitment: String,
    },
}

impl TransitionOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            TransitionOutput::Public { .. } => "Public",
            TransitionOutput::Private { .. } => "Private",
            TransitionOutput::Record { .. } => "Record",
            TransitionOutput::ExternalRecord { .. } => "ExternalRecord",
        }
    }
}

/// One argument to a transition's on-chain finalize step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizeValue {
    Plaintext(Vec<u8>),
    Record(String),
}

impl FinalizeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FinalizeValue::Plaintext(_) => "Plaintext",
            FinalizeValue::Record(_) => "Record",
        }
    }
}

/// One atomic function execution, bound to either an execute transaction or
/// a fee payment (never both).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: TransitionId,
    pub program_id: ProgramId,
    pub function_name: String,
    pub inputs: Vec<TransitionInput>,
    pub outputs: Vec<TransitionOutput>,
    pub finalize: Option<Vec<FinalizeValue>>,
    pub proof: String,
    /// Transition public key.
    pub tpk: String,
    /// Transition commitment.
    pub tcm: String,
}
