//! Error types shared by the chain-facing components.

use crate::chains::ChainId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
	#[error("Chain {0} is not configured")]
	UnsupportedChain(ChainId),

	#[error("RPC error on chain {chain_id}: {message}")]
	Rpc { chain_id: ChainId, message: String },

	#[error("Configuration error: {0}")]
	Config(String),
}

impl ChainError {
	/// Wraps a transport failure for the given chain.
	pub fn rpc(chain_id: ChainId, error: impl std::fmt::Display) -> Self {
		ChainError::Rpc {
			chain_id,
			message: error.to_string(),
		}
	}
}
