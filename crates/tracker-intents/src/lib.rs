//! Opened-order extraction for the order tracker.
//!
//! The `OpenedIntentParser` fetches an origin transaction's receipt and turns
//! the protocol's open event into an `OpenedOrder`. Protocol knowledge lives
//! entirely in an `OpenedOrderDecoder`; the parser only knows how to find the
//! right log.

pub mod implementations;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracker_chains::ChainClientManager;
use tracker_types::{
	truncate_hash, BlockNumber, ChainError, ChainId, Log, OpenedOrder, TxHash, B256,
};

pub use implementations::{AcrossDepositDecoder, Eip7683OpenDecoder};

#[derive(Debug, Error)]
pub enum IntentError {
	#[error("Chain {0} is not supported")]
	UnsupportedChain(ChainId),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Invalid event: {0}")]
	InvalidEvent(String),

	#[error(transparent)]
	Rpc(ChainError),
}

impl From<ChainError> for IntentError {
	fn from(error: ChainError) -> Self {
		match error {
			ChainError::UnsupportedChain(chain_id) => IntentError::UnsupportedChain(chain_id),
			other => IntentError::Rpc(other),
		}
	}
}

/// Where a matched open log came from.
#[derive(Debug, Clone, Copy)]
pub struct OpenContext {
	pub tx_hash: TxHash,
	pub block_number: BlockNumber,
	pub origin_chain_id: ChainId,
}

/// Decodes one protocol's open event.
pub trait OpenedOrderDecoder: Send + Sync {
	/// Short protocol name used in logs.
	fn name(&self) -> &'static str;

	/// topic0 of the open event.
	fn event_signature(&self) -> B256;

	/// Decodes a log whose topic0 already matched `event_signature`.
	fn decode(&self, log: &Log, context: &OpenContext) -> Result<OpenedOrder, IntentError>;
}

/// Extracts opened orders from origin-chain transactions.
#[derive(Clone)]
pub struct OpenedIntentParser {
	clients: Arc<ChainClientManager>,
	decoder: Arc<dyn OpenedOrderDecoder>,
}

impl OpenedIntentParser {
	pub fn new(clients: Arc<ChainClientManager>, decoder: Arc<dyn OpenedOrderDecoder>) -> Self {
		Self { clients, decoder }
	}

	/// Parser for Across V3 `FundsDeposited` events.
	pub fn across(clients: Arc<ChainClientManager>) -> Self {
		Self::new(clients, Arc::new(AcrossDepositDecoder))
	}

	/// Parser for EIP-7683 `Open` events.
	pub fn eip7683(clients: Arc<ChainClientManager>) -> Self {
		Self::new(clients, Arc::new(Eip7683OpenDecoder))
	}

	pub fn clients(&self) -> &Arc<ChainClientManager> {
		&self.clients
	}

	/// Returns the order opened by `tx_hash` on `origin_chain_id`.
	///
	/// When the transaction emits several open events, the first in log
	/// order is used.
	pub async fn get_opened_order(
		&self,
		tx_hash: TxHash,
		origin_chain_id: ChainId,
	) -> Result<OpenedOrder, IntentError> {
		let client = self.clients.get_client(origin_chain_id)?;

		debug!(
			chain_id = %origin_chain_id,
			tx_hash = %truncate_hash(&tx_hash.to_string()),
			decoder = self.decoder.name(),
			"Parsing opened order"
		);

		let receipt = client
			.get_transaction_receipt(tx_hash)
			.await?
			.ok_or_else(|| {
				IntentError::NotFound(format!(
					"Transaction receipt {} not found on chain {}",
					tx_hash, origin_chain_id
				))
			})?;

		let signature = self.decoder.event_signature();
		let log = receipt
			.logs
			.iter()
			.find(|log| log.topic0() == Some(&signature))
			.ok_or_else(|| {
				IntentError::NotFound(format!(
					"No {} open event in transaction {}",
					self.decoder.name(),
					tx_hash
				))
			})?;

		let context = OpenContext {
			tx_hash,
			block_number: receipt.block_number,
			origin_chain_id,
		};
		let order = self.decoder.decode(log, &context)?;

		info!(
			order_id = %truncate_hash(&order.order_id.to_string()),
			deposit_id = %order.deposit_id,
			destination_chain_id = %order.destination_chain_id,
			"Parsed opened order"
		);

		Ok(order)
	}
}
