//! Chain clients for the order tracker.
//!
//! This crate provides the read-only clients the tracker uses to observe
//! origin and destination chains, and the manager that owns one client per
//! configured chain.
//!
//! - `registry`: `ChainClientManager`, the per-chain client cache
//! - `implementations`: concrete `ChainClient` implementations

pub mod implementations;
pub mod registry;

pub use implementations::evm::AlloyChainClient;
pub use registry::ChainClientManager;
