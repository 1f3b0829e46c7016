//! Deployed program metadata.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::ids::ProgramId;

/// The network's native fee-only program. Executions of it are not counted
/// in per-function call statistics.
pub const NATIVE_PROGRAM_ID: &str = "credits.aleo";

/// Signature metadata for one program function.
///
/// Types and modes are the canonical strings produced by the disassembler
/// upstream ("u32" / "public", ...), kept as parallel arrays the way they
/// are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub inputs: Vec<String>,
    pub input_modes: Vec<String>,
    pub outputs: Vec<String>,
    pub output_modes: Vec<String>,
    pub finalize_inputs: Vec<String>,
}

/// A deployed program: canonical raw bytes plus the denormalized name lists
/// used for search and statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub imports: Vec<ProgramId>,
    pub mappings: Vec<String>,
    pub interfaces: Vec<String>,
    pub records: Vec<String>,
    pub closures: Vec<String>,
    pub functions: Vec<FunctionSpec>,
    /// Canonical byte encoding of the whole program, opaque to the store.
    pub raw_bytes: Vec<u8>,
}

impl Program {
    /// Names of the program's functions, in declaration order.
    pub fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name.clone()).collect()
    }

    /// Structural fingerprint used to group near-identical programs.
    ///
    /// Hashes the shape of the program (declaration counts and per-function
    /// signature types/modes) while ignoring all identifier names, so a
    /// renamed copy of a template program hashes the same.
    pub fn feature_hash(&self) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update([
            self.imports.len() as u8,
            self.mappings.len() as u8,
            self.interfaces.len() as u8,
            self.records.len() as u8,
            self.closures.len() as u8,
            self.functions.len() as u8,
        ]);
        for function in &self.functions {
            hasher.update(b"fn;");
            for (ty, mode) in function.inputs.iter().zip(&function.input_modes) {
                hasher.update(ty.as_bytes());
                hasher.update(b".");
                hasher.update(mode.as_bytes());
                hasher.update(b";");
            }
            hasher.update(b"->");
            for (ty, mode) in function.outputs.iter().zip(&function.output_modes) {
                hasher.update(ty.as_bytes());
                hasher.update(b".");
                hasher.update(mode.as_bytes());
                hasher.update(b";");
            }
            hasher.update(b"finalize:");
            for ty in &function.finalize_inputs {
                hasher.update(ty.as_bytes());
                hasher.update(b";");
            }
        }
        hasher.finalize().to_vec()
    }

    /// Whether this program has the shape of the "hello world" tutorial
    /// program everyone deploys first.
    pub fn is_helloworld(&self) -> bool {
        self.feature_hash() == helloworld_feature_hash()
    }
}

/// Feature hash of the tutorial template: a bare program with a single
/// `main(public u32, private u32) -> private u32` function.
fn helloworld_feature_hash() -> Vec<u8> {
    let template = Program {
        id: ProgramId::new("helloworld.aleo"),
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
        raw_bytes: vec![],
    };
    template.feature_hash()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_program(id: &str, function_name: &str) -> Program {
        Program {
            id: ProgramId::new(id),
            imports: vec![],
            mappings: vec![],
            interfaces: vec![],
            records: vec![],
            closures: vec![],
            functions: vec![FunctionSpec {
                name: function_name.to_string(),
                inputs: vec!["u32".to_string(), "u32".to_string()],
                input_modes: vec!["public".to_string(), "private".to_string()],
                outputs: vec!["u32".to_string()],
                output_modes: vec!["private".to_string()],
                finalize_inputs: vec![],
            }],
            raw_bytes: b"program bytes".to_vec(),
        }
    }

    #[test]
    fn feature_hash_ignores_names() {
        let a = sample_program("foo.aleo", "main");
        let b = sample_program("bar.aleo", "hello");
        assert_eq!(a.feature_hash(), b.feature_hash());
    }

    #[test]
    fn helloworld_shape_is_detected() {
        assert!(sample_program("renamed.aleo", "whatever").is_helloworld());

        let mut other = sample_program("real.aleo", "transfer");
        other.mappings.push("balances".to_string());
        assert!(!other.is_helloworld());
    }
}
