//! chainscan - Relational block storage for a zero-knowledge network explorer
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Domain Model
//! - [`types`] - Blocks, transactions, transitions, programs, solutions
//! - [`rewards`] - Coinbase reward distribution and the incentive window
//!
//! ## Storage
//! - [`store`] - The [`store::Database`] handle and schema
//! - [`store::ingest`] - Block decomposition into relational rows
//! - [`store::reconstruct`] - Lossless block reassembly
//! - [`store::metrics`] - Solving-rate estimation
//! - [`store::search`] - Prefix search over identifiers
//! - [`store::programs`] - Program catalog queries
//! - [`store::solutions`] - Leaderboard and solution queries
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`events`] - Store event sink and log bridge

#![forbid(unsafe_code)]

// ============================================================================
// Domain Model
// ============================================================================
pub mod rewards;
pub mod types;

// ============================================================================
// Storage
// ============================================================================
pub mod store;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod events;
