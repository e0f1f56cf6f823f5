//! Order and fill records produced by the chain-facing components.
//!
//! Both records are built once from on-chain logs and never mutated
//! afterwards; the orchestrator only reads them.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{BlockNumber, ChainId, Timestamp, TxHash};

/// An order as opened on the origin chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedOrder {
	/// Protocol order identifier.
	pub order_id: B256,
	/// Hash of the origin transaction that opened the order.
	pub open_tx_hash: TxHash,
	/// Block the origin transaction was included in.
	pub block_number: BlockNumber,
	/// Contract that emitted the open event.
	pub origin_contract: Address,
	/// Order creator.
	pub user: Address,
	/// Unix seconds after which a fill is no longer valid.
	pub fill_deadline: Timestamp,
	/// Key correlating this order with its fill on the destination chain.
	pub deposit_id: U256,
	pub destination_chain_id: ChainId,
	pub input_amount: U256,
	pub output_amount: U256,
}

/// A fulfillment observed on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
	pub fill_tx_hash: TxHash,
	pub block_number: BlockNumber,
	/// Unix seconds. Taken from the containing block when the event itself
	/// carries no timestamp.
	pub timestamp: Timestamp,
	pub origin_chain_id: ChainId,
	pub deposit_id: U256,
}

/// Identifies the fill a watcher should look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFillParams {
	pub origin_chain_id: ChainId,
	pub destination_chain_id: ChainId,
	pub deposit_id: U256,
	pub user: Address,
	pub fill_deadline: Timestamp,
}

impl GetFillParams {
	/// Builds fill lookup parameters for an opened order.
	pub fn for_order(order: &OpenedOrder, origin_chain_id: ChainId) -> Self {
		Self {
			origin_chain_id,
			destination_chain_id: order.destination_chain_id,
			deposit_id: order.deposit_id,
			user: order.user,
			fill_deadline: order.fill_deadline,
		}
	}
}
