//! In-memory chain client for tests.
//!
//! `MockChainClient` answers from canned receipts, logs and blocks, counts
//! every call, and can be told to fail or stall individual RPC methods.

use crate::{
	BlockInfo, BlockNumber, ChainClient, ChainError, ChainId, Log, LogFilter, TransactionReceipt,
	TxHash,
};
use alloy::primitives::{Address, LogData, B256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct MockState {
	receipts: HashMap<TxHash, TransactionReceipt>,
	logs: Vec<Log>,
	block_number: BlockNumber,
	block_timestamps: HashMap<BlockNumber, u64>,
	logs_visible_from_call: usize,
	fail_receipts: bool,
	fail_logs: bool,
	fail_block_number: bool,
	fail_blocks: bool,
	receipt_delay: Option<Duration>,
	filters: Vec<LogFilter>,
}

/// Call counters, one per RPC method.
#[derive(Debug, Default)]
pub struct MockCalls {
	pub receipts: AtomicUsize,
	pub logs: AtomicUsize,
	pub block_number: AtomicUsize,
	pub blocks: AtomicUsize,
}

impl MockCalls {
	pub fn receipts(&self) -> usize {
		self.receipts.load(Ordering::SeqCst)
	}

	pub fn logs(&self) -> usize {
		self.logs.load(Ordering::SeqCst)
	}

	pub fn block_number(&self) -> usize {
		self.block_number.load(Ordering::SeqCst)
	}

	pub fn blocks(&self) -> usize {
		self.blocks.load(Ordering::SeqCst)
	}

	pub fn total(&self) -> usize {
		self.receipts() + self.logs() + self.block_number() + self.blocks()
	}
}

pub struct MockChainClient {
	chain_id: ChainId,
	state: Mutex<MockState>,
	pub calls: MockCalls,
}

impl MockChainClient {
	pub fn new(chain_id: ChainId) -> Self {
		Self {
			chain_id,
			state: Mutex::new(MockState::default()),
			calls: MockCalls::default(),
		}
	}

	fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
		self.state.lock().expect("mock state poisoned")
	}

	pub fn with_receipt(self, receipt: TransactionReceipt) -> Self {
		self.state().receipts.insert(receipt.transaction_hash, receipt);
		self
	}

	pub fn with_log(self, log: Log) -> Self {
		self.state().logs.push(log);
		self
	}

	/// Adds a log after construction, e.g. once the client is shared.
	pub fn push_log(&self, log: Log) {
		self.state().logs.push(log);
	}

	pub fn with_block_number(self, block_number: BlockNumber) -> Self {
		self.state().block_number = block_number;
		self
	}

	pub fn with_block_timestamp(self, block: BlockNumber, timestamp: u64) -> Self {
		self.state().block_timestamps.insert(block, timestamp);
		self
	}

	/// Hide all logs until the `call`-th `get_logs` request (1-based).
	pub fn with_logs_visible_from_call(self, call: usize) -> Self {
		self.state().logs_visible_from_call = call;
		self
	}

	pub fn with_receipt_delay(self, delay: Duration) -> Self {
		self.state().receipt_delay = Some(delay);
		self
	}

	pub fn set_fail_receipts(&self, fail: bool) {
		self.state().fail_receipts = fail;
	}

	pub fn set_fail_logs(&self, fail: bool) {
		self.state().fail_logs = fail;
	}

	pub fn set_fail_block_number(&self, fail: bool) {
		self.state().fail_block_number = fail;
	}

	pub fn set_fail_blocks(&self, fail: bool) {
		self.state().fail_blocks = fail;
	}

	/// Every filter passed to `get_logs`, in call order.
	pub fn filters(&self) -> Vec<LogFilter> {
		self.state().filters.clone()
	}

	fn rpc_error(&self, method: &str) -> ChainError {
		ChainError::rpc(self.chain_id, format!("mock {} failure", method))
	}
}

#[async_trait]
impl ChainClient for MockChainClient {
	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn get_transaction_receipt(
		&self,
		tx_hash: TxHash,
	) -> Result<Option<TransactionReceipt>, ChainError> {
		self.calls.receipts.fetch_add(1, Ordering::SeqCst);
		let delay = self.state().receipt_delay;
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		let state = self.state();
		if state.fail_receipts {
			return Err(self.rpc_error("eth_getTransactionReceipt"));
		}
		Ok(state.receipts.get(&tx_hash).cloned())
	}

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError> {
		let call = self.calls.logs.fetch_add(1, Ordering::SeqCst) + 1;
		let mut state = self.state();
		state.filters.push(filter.clone());
		if state.fail_logs {
			return Err(self.rpc_error("eth_getLogs"));
		}
		if call < state.logs_visible_from_call {
			return Ok(Vec::new());
		}
		Ok(state
			.logs
			.iter()
			.filter(|log| filter.matches(log))
			.cloned()
			.collect())
	}

	async fn get_block_number(&self) -> Result<BlockNumber, ChainError> {
		self.calls.block_number.fetch_add(1, Ordering::SeqCst);
		let state = self.state();
		if state.fail_block_number {
			return Err(self.rpc_error("eth_blockNumber"));
		}
		Ok(state.block_number)
	}

	async fn get_block(&self, number: BlockNumber) -> Result<Option<BlockInfo>, ChainError> {
		self.calls.blocks.fetch_add(1, Ordering::SeqCst);
		let state = self.state();
		if state.fail_blocks {
			return Err(self.rpc_error("eth_getBlockByNumber"));
		}
		Ok(state
			.block_timestamps
			.get(&number)
			.map(|timestamp| BlockInfo {
				number,
				hash: B256::with_last_byte((number % 256) as u8),
				timestamp: *timestamp,
			}))
	}
}

/// Builds a log from ABI-encoded event data.
pub fn log_from(
	address: Address,
	data: LogData,
	block_number: BlockNumber,
	transaction_hash: TxHash,
	log_index: u64,
) -> Log {
	Log {
		address,
		topics: data.topics().to_vec(),
		data: data.data,
		block_number,
		transaction_hash,
		log_index,
	}
}

/// Builds a receipt holding `logs`.
pub fn receipt_with(
	transaction_hash: TxHash,
	block_number: BlockNumber,
	status: bool,
	logs: Vec<Log>,
) -> TransactionReceipt {
	TransactionReceipt {
		transaction_hash,
		block_number,
		status,
		logs,
	}
}
