//! EVM chain client implementations.

pub mod alloy;

pub use self::alloy::AlloyChainClient;
