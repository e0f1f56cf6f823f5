//! Shared types for the order tracker.
//!
//! This crate holds the data model passed between the intent parser, the fill
//! watcher and the tracking orchestrator, together with the read-only
//! `ChainClient` boundary every chain-facing component is written against.

pub mod chains;
pub mod errors;
pub mod order;
pub mod tracking;
pub mod utils;

#[cfg(feature = "testing")]
pub mod testing;

pub use chains::*;
pub use errors::*;
pub use order::*;
pub use tracking::*;
pub use utils::*;

// Re-export the primitive types every crate in the workspace speaks.
pub use alloy::primitives::{Address, Bytes, B256, U256};

/// Transaction hash
pub type TxHash = B256;

/// Block number
pub type BlockNumber = u64;

/// Timestamp (Unix seconds)
pub type Timestamp = u64;
