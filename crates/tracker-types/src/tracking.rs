//! Tracking status, snapshots and progress updates.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::{ChainId, FillEvent, OpenedOrder, Timestamp, TxHash};

/// Lifecycle status of a cross-chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Opened, not yet filled. Also reported while a run is still polling.
	Pending,
	/// A fill was observed on the destination chain.
	Finalized,
	/// The fill deadline passed without a fill.
	Expired,
	/// The origin transaction reverted.
	Failed,
	/// Reserved for an external refund watcher; never produced here.
	Refunded,
}

impl OrderStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, OrderStatus::Pending)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Finalized => "finalized",
			OrderStatus::Expired => "expired",
			OrderStatus::Failed => "failed",
			OrderStatus::Refunded => "refunded",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Point-in-time view of an order, recomputed on every status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTrackingInfo {
	pub status: OrderStatus,
	pub order_id: B256,
	pub open_tx_hash: TxHash,
	pub user: Address,
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	pub fill_deadline: Timestamp,
	pub deposit_id: U256,
	pub input_amount: U256,
	pub output_amount: U256,
	pub fill_event: Option<FillEvent>,
}

impl OrderTrackingInfo {
	/// Snapshot of a parsed order with the given status.
	pub fn from_order(
		status: OrderStatus,
		order: &OpenedOrder,
		origin_chain_id: ChainId,
		fill_event: Option<FillEvent>,
	) -> Self {
		Self {
			status,
			order_id: order.order_id,
			open_tx_hash: order.open_tx_hash,
			user: order.user,
			origin_chain_id,
			destination_chain_id: order.destination_chain_id,
			fill_deadline: order.fill_deadline,
			deposit_id: order.deposit_id,
			input_amount: order.input_amount,
			output_amount: order.output_amount,
			fill_event,
		}
	}

	/// Snapshot for an origin transaction that reverted. Nothing could be
	/// decoded, so every order field is zeroed.
	pub fn failed(open_tx_hash: TxHash, origin_chain_id: ChainId) -> Self {
		Self {
			status: OrderStatus::Failed,
			order_id: B256::ZERO,
			open_tx_hash,
			user: Address::ZERO,
			origin_chain_id,
			destination_chain_id: ChainId(0),
			fill_deadline: 0,
			deposit_id: U256::ZERO,
			input_amount: U256::ZERO,
			output_amount: U256::ZERO,
			fill_event: None,
		}
	}
}

/// One step of a tracking run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTrackingUpdate {
	pub status: OrderStatus,
	pub order_id: Option<B256>,
	pub open_tx_hash: TxHash,
	pub fill_tx_hash: Option<TxHash>,
	/// Unix seconds at which the update was produced.
	pub timestamp: Timestamp,
	pub message: String,
}

/// Request to watch an order from its origin transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchParams {
	pub tx_hash: TxHash,
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	/// Overall wall-clock budget. Falls back to the tracker default.
	pub timeout: Option<Duration>,
}

impl WatchParams {
	pub fn new(tx_hash: TxHash, origin_chain_id: ChainId, destination_chain_id: ChainId) -> Self {
		Self {
			tx_hash,
			origin_chain_id,
			destination_chain_id,
			timeout: None,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}
}
