//! Chain-related types and traits.

use crate::{errors::ChainError, BlockNumber, Timestamp, TxHash};
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const ETHEREUM: Self = Self(1);
	pub const OPTIMISM: Self = Self(10);
	pub const BASE: Self = Self(8453);
	pub const ARBITRUM: Self = Self(42161);
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(ChainId(s.parse()?))
	}
}

impl From<u64> for ChainId {
	fn from(id: u64) -> Self {
		ChainId(id)
	}
}

/// Transaction receipt, reduced to what order tracking reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	pub transaction_hash: TxHash,
	pub block_number: BlockNumber,
	/// `false` when the transaction reverted.
	pub status: bool,
	/// Logs in emission order.
	pub logs: Vec<Log>,
}

/// Basic log structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
	pub address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	pub block_number: BlockNumber,
	pub transaction_hash: TxHash,
	pub log_index: u64,
}

impl Log {
	/// The event signature hash, if the log is not anonymous.
	pub fn topic0(&self) -> Option<&B256> {
		self.topics.first()
	}
}

/// Header fields needed to backfill event timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
	pub number: BlockNumber,
	pub hash: B256,
	pub timestamp: Timestamp,
}

/// Historical log query.
///
/// `topics[0]` is the event signature; the remaining slots are indexed
/// arguments. `None` matches anything. A `to_block` of `None` means latest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
	pub address: Option<Address>,
	pub topics: [Option<B256>; 4],
	pub from_block: BlockNumber,
	pub to_block: Option<BlockNumber>,
}

impl LogFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn address(mut self, address: Address) -> Self {
		self.address = Some(address);
		self
	}

	pub fn event_signature(mut self, signature: B256) -> Self {
		self.topics[0] = Some(signature);
		self
	}

	/// Sets indexed topic `index` (1..=3).
	pub fn topic(mut self, index: usize, value: Option<B256>) -> Self {
		if (1..4).contains(&index) {
			self.topics[index] = value;
		}
		self
	}

	pub fn from_block(mut self, block: BlockNumber) -> Self {
		self.from_block = block;
		self
	}

	pub fn to_block(mut self, block: BlockNumber) -> Self {
		self.to_block = Some(block);
		self
	}

	/// Whether `log` would be returned by a node evaluating this filter.
	pub fn matches(&self, log: &Log) -> bool {
		if let Some(address) = self.address {
			if log.address != address {
				return false;
			}
		}
		if log.block_number < self.from_block {
			return false;
		}
		if matches!(self.to_block, Some(to) if log.block_number > to) {
			return false;
		}
		self.topics.iter().enumerate().all(|(i, wanted)| match wanted {
			Some(topic) => log.topics.get(i) == Some(topic),
			None => true,
		})
	}
}

/// Read-only access to a single chain.
///
/// Implementations are shared between concurrent tracking runs and must not
/// hold per-order state.
#[async_trait]
pub trait ChainClient: Send + Sync {
	/// Get the chain ID
	fn chain_id(&self) -> ChainId;

	/// Get transaction receipt, `None` if the transaction is unknown or pending
	async fn get_transaction_receipt(
		&self,
		tx_hash: TxHash,
	) -> Result<Option<TransactionReceipt>, ChainError>;

	/// Get logs matching a filter
	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainError>;

	/// Get current block number
	async fn get_block_number(&self) -> Result<BlockNumber, ChainError>;

	/// Get a block header by number
	async fn get_block(&self, number: BlockNumber) -> Result<Option<BlockInfo>, ChainError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn log_at(block: u64, topics: Vec<B256>) -> Log {
		Log {
			address: Address::repeat_byte(0x11),
			topics,
			data: Bytes::new(),
			block_number: block,
			transaction_hash: B256::ZERO,
			log_index: 0,
		}
	}

	#[test]
	fn test_chain_id_display_and_parse() {
		assert_eq!(ChainId(42161).to_string(), "42161");
		assert_eq!("10".parse::<ChainId>().unwrap(), ChainId::OPTIMISM);
		assert!("ten".parse::<ChainId>().is_err());
	}

	#[test]
	fn test_filter_matches_topics_and_range() {
		let sig = B256::repeat_byte(1);
		let arg = B256::repeat_byte(2);
		let log = log_at(100, vec![sig, arg]);

		let filter = LogFilter::new()
			.event_signature(sig)
			.topic(1, Some(arg))
			.from_block(50);
		assert!(filter.matches(&log));

		// Wrong indexed argument
		assert!(!filter.clone().topic(1, Some(B256::repeat_byte(3))).matches(&log));
		// Out of range
		assert!(!filter.clone().to_block(99).matches(&log));
		assert!(!filter.clone().from_block(101).matches(&log));
		// Address mismatch
		assert!(!filter.address(Address::repeat_byte(0x22)).matches(&log));
	}

	#[test]
	fn test_filter_topic_index_bounds() {
		let filter = LogFilter::new().topic(0, Some(B256::repeat_byte(9))).topic(4, Some(B256::ZERO));
		assert_eq!(filter.topics, [None, None, None, None]);
	}
}
