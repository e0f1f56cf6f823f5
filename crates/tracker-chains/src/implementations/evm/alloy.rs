//! Alloy-backed chain client.
//!
//! Wraps an HTTP `RootProvider` and converts alloy's RPC types into the
//! tracker's own receipt, log and block records.

use alloy::network::ReceiptResponse;
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log as RpcLog};
use async_trait::async_trait;
use tracing::debug;
use tracker_types::{
	truncate_hash, BlockInfo, BlockNumber, ChainClient, ChainError, ChainId, Log, LogFilter,
	TransactionReceipt, TxHash,
};

/// Read-only EVM client over JSON-RPC.
pub struct AlloyChainClient {
	/// The Alloy provider for blockchain interaction.
	provider: RootProvider,
	/// The chain this client is bound to.
	chain_id: ChainId,
}

impl AlloyChainClient {
	/// Creates a client for `chain_id` talking to `rpc_url`.
	///
	/// No request is made here; the endpoint is first contacted on the first
	/// query.
	pub fn new(chain_id: ChainId, rpc_url: &str) -> Result<Self, ChainError> {
		let provider = RootProvider::new_http(rpc_url.parse().map_err(|e| {
			ChainError::Config(format!("Invalid RPC URL for chain {}: {}", chain_id, e))
		})?);

		Ok(Self { provider, chain_id })
	}
}

/// Converts a `LogFilter` into an alloy `Filter`.
pub(crate) fn to_rpc_filter(filter: &LogFilter) -> Filter {
	let mut rpc_filter = Filter::new().from_block(filter.from_block);
	rpc_filter = match filter.to_block {
		Some(to) => rpc_filter.to_block(to),
		None => rpc_filter.to_block(BlockNumberOrTag::Latest),
	};
	if let Some(address) = filter.address {
		rpc_filter = rpc_filter.address(address);
	}
	if let Some(signature) = filter.topics[0] {
		rpc_filter = rpc_filter.event_signature(signature);
	}
	if let Some(topic) = filter.topics[1] {
		rpc_filter = rpc_filter.topic1(topic);
	}
	if let Some(topic) = filter.topics[2] {
		rpc_filter = rpc_filter.topic2(topic);
	}
	if let Some(topic) = filter.topics[3] {
		rpc_filter = rpc_filter.topic3(topic);
	}
	rpc_filter
}

fn from_rpc_log(log: &RpcLog) -> Log {
	Log {
		address: log.inner.address,
		topics: log.inner.data.topics().to_vec(),
		data: log.inner.data.data.clone(),
		block_number: log.block_number.unwrap_or_default(),
		transaction_hash: log.transaction_hash.unwrap_or_default(),
		log_index: log.log_index.unwrap_or_default(),
	}
}

#[async_trait]
impl ChainClient for AlloyChainClient {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn get_transaction_receipt(
		&self,
		tx_hash: TxHash,
	) -> Result<Option<TransactionReceipt>, ChainError> {
		debug!(
			chain_id = %self.chain_id,
			tx_hash = %truncate_hash(&tx_hash.to_string()),
			"Fetching transaction receipt"
		);

		let receipt = self
			.provider
			.get_transaction_receipt(tx_hash)
			.await
			.map_err(|e| ChainError::rpc(self.chain_id, format!("Failed to get receipt: {}", e)))?;

		Ok(receipt.map(|receipt| TransactionReceipt {
			transaction_hash: receipt.transaction_hash,
			block_number: receipt.block_number.unwrap_or_default(),
			status: ReceiptResponse::status(&receipt),
			logs: receipt.inner.logs().iter().map(from_rpc_log).collect(),
		}))
	}

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError> {
		let logs = self
			.provider
			.get_logs(&to_rpc_filter(filter))
			.await
			.map_err(|e| ChainError::rpc(self.chain_id, format!("Failed to get logs: {}", e)))?;

		Ok(logs.iter().map(from_rpc_log).collect())
	}

	async fn get_block_number(&self) -> Result<BlockNumber, ChainError> {
		self.provider
			.get_block_number()
			.await
			.map_err(|e| ChainError::rpc(self.chain_id, format!("Failed to get block number: {}", e)))
	}

	async fn get_block(&self, number: BlockNumber) -> Result<Option<BlockInfo>, ChainError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Number(number))
			.await
			.map_err(|e| ChainError::rpc(self.chain_id, format!("Failed to get block: {}", e)))?;

		Ok(block.map(|block| BlockInfo {
			number,
			hash: block.header.hash,
			timestamp: block.header.timestamp,
		}))
	}
}
