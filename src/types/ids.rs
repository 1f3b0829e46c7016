//! Canonical identifier newtypes.
//!
//! Each wraps the canonical string rendering produced by the consensus
//! library (bech32-style, e.g. `ab1...` block hashes, `at1...` transaction
//! ids). The store never inspects the contents beyond exact and prefix
//! comparison.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! canonical_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name(s.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

canonical_id!(
    /// Hash of a finalized block.
    BlockHash
);
canonical_id!(
    /// Identifier of a deploy or execute transaction.
    TransactionId
);
canonical_id!(
    /// Identifier of a single transition.
    TransitionId
);
canonical_id!(
    /// Identifier of a deployed program, e.g. `credits.aleo`.
    ProgramId
);
canonical_id!(
    /// A solution submitter / program owner address.
    Address
);
