//! Ledger value types.
//!
//! These are the immutable values the store persists and reconstructs. They
//! arrive already validated by the consensus library upstream; this crate
//! treats them as opaque data with three contracts: canonical byte encoding
//! ([`Block::to_bytes`] and friends, via bincode), canonical string rendering
//! (`Display` on the identifier newtypes), and structural equality.

pub mod block;
pub mod ids;
pub mod program;
pub mod solution;
pub mod transaction;
pub mod transition;

pub use block::{Block, BlockHeader, BlockHeaderMetadata};
pub use ids::{Address, BlockHash, ProgramId, TransactionId, TransitionId};
pub use program::{FunctionSpec, Program, NATIVE_PROGRAM_ID};
pub use solution::{CoinbaseSolution, Commitment, PartialSolution, PuzzleProof};
pub use transaction::{DeployTransaction, Deployment, ExecuteTransaction, Execution, Fee, ProgramOwner, Transaction};
pub use transition::{FinalizeValue, Transition, TransitionInput, TransitionOutput};
