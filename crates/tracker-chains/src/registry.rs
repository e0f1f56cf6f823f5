//! Per-chain client cache.
//!
//! The `ChainClientManager` owns one read-only client per configured chain.
//! It is built once by whoever composes the tracker and handed to the parser,
//! the fill watcher and the revert check, so every component shares the same
//! clients.
//!
//! # Thread Safety
//!
//! The manager is immutable once built and is shared behind an `Arc`. The
//! clients stored in it are already wrapped in `Arc` for safe sharing.

use crate::implementations::evm::AlloyChainClient;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, info};
use tracker_types::{ChainClient, ChainError, ChainId};

/// Owned map of chain clients indexed by chain ID.
#[derive(Clone, Default)]
pub struct ChainClientManager {
	clients: HashMap<ChainId, Arc<dyn ChainClient>>,
}

impl ChainClientManager {
	/// Creates a new empty manager.
	pub fn new() -> Self {
		Self {
			clients: HashMap::new(),
		}
	}

	/// Registers a chain client.
	///
	/// # Errors
	///
	/// Returns an error if a client for the same chain ID is already registered.
	pub fn register(&mut self, client: Arc<dyn ChainClient>) -> Result<(), ChainError> {
		let chain_id = client.chain_id();
		info!("Registering chain client for chain {}", chain_id);

		if self.clients.contains_key(&chain_id) {
			return Err(ChainError::Config(format!(
				"Chain {} already registered",
				chain_id
			)));
		}

		self.clients.insert(chain_id, client);
		Ok(())
	}

	/// Builder-style variant of [`register`](Self::register).
	pub fn with_client(mut self, client: Arc<dyn ChainClient>) -> Result<Self, ChainError> {
		self.register(client)?;
		Ok(self)
	}

	/// Retrieves the client for a chain.
	///
	/// # Errors
	///
	/// Returns `ChainError::UnsupportedChain` if the chain is not registered.
	pub fn get_client(&self, chain_id: ChainId) -> Result<Arc<dyn ChainClient>, ChainError> {
		self.clients
			.get(&chain_id)
			.cloned()
			.ok_or(ChainError::UnsupportedChain(chain_id))
	}

	pub fn supports(&self, chain_id: ChainId) -> bool {
		self.clients.contains_key(&chain_id)
	}

	/// Returns all registered chain IDs in ascending order.
	pub fn chains(&self) -> Vec<ChainId> {
		let mut chains: Vec<ChainId> = self.clients.keys().copied().collect();
		chains.sort();
		chains
	}

	/// Creates a manager with one HTTP client per endpoint.
	///
	/// # Errors
	///
	/// Returns an error if any endpoint URL is malformed.
	pub fn with_http_endpoints(endpoints: HashMap<ChainId, String>) -> Result<Self, ChainError> {
		let mut manager = Self::new();

		for (chain_id, endpoint) in endpoints {
			debug!("Creating client for chain {} at {}", chain_id, endpoint);
			let client = AlloyChainClient::new(chain_id, &endpoint)?;
			manager.register(Arc::new(client))?;
		}

		Ok(manager)
	}
}

impl fmt::Debug for ChainClientManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ChainClientManager")
			.field("chains", &self.chains())
			.finish()
	}
}
