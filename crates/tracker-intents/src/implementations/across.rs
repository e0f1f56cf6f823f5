//! Across V3 deposit decoding.
//!
//! Every field the tracker needs is carried by a single `FundsDeposited`
//! event, so this is the plain single-event extractor. Across has no native
//! order id; one is derived from the origin chain and deposit id, which
//! together identify a deposit uniquely.

use crate::{IntentError, OpenContext, OpenedOrderDecoder};
use alloy::primitives::{keccak256, Address, LogData, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracker_types::{ChainId, Log, OpenedOrder};

sol! {
	/// Emitted by the origin SpokePool when a deposit is made.
	event FundsDeposited(
		bytes32 inputToken,
		bytes32 outputToken,
		uint256 inputAmount,
		uint256 outputAmount,
		uint256 indexed destinationChainId,
		uint256 indexed depositId,
		uint32 quoteTimestamp,
		uint32 fillDeadline,
		uint32 exclusivityDeadline,
		bytes32 indexed depositor,
		bytes32 recipient,
		bytes32 exclusiveRelayer,
		bytes message
	);
}

/// Order id for an Across deposit: `keccak256(originChainId ‖ depositId)`,
/// both as 32-byte big-endian words.
pub fn across_order_id(origin_chain_id: ChainId, deposit_id: U256) -> B256 {
	let mut preimage = [0u8; 64];
	preimage[..32].copy_from_slice(&U256::from(origin_chain_id.0).to_be_bytes::<32>());
	preimage[32..].copy_from_slice(&deposit_id.to_be_bytes::<32>());
	keccak256(preimage)
}

/// Decoder for `FundsDeposited`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcrossDepositDecoder;

impl OpenedOrderDecoder for AcrossDepositDecoder {
	fn name(&self) -> &'static str {
		"across"
	}

	fn event_signature(&self) -> B256 {
		FundsDeposited::SIGNATURE_HASH
	}

	fn decode(&self, log: &Log, context: &OpenContext) -> Result<OpenedOrder, IntentError> {
		let event = FundsDeposited::decode_log_data(&LogData::new_unchecked(
			log.topics.clone(),
			log.data.clone(),
		))
		.map_err(|e| IntentError::InvalidEvent(format!("Failed to decode FundsDeposited: {}", e)))?;

		let destination_chain_id = u64::try_from(event.destinationChainId).map_err(|_| {
			IntentError::InvalidEvent(format!(
				"Destination chain id {} out of range",
				event.destinationChainId
			))
		})?;

		Ok(OpenedOrder {
			order_id: across_order_id(context.origin_chain_id, event.depositId),
			open_tx_hash: context.tx_hash,
			block_number: context.block_number,
			origin_contract: log.address,
			user: Address::from_word(event.depositor),
			fill_deadline: u64::from(event.fillDeadline),
			deposit_id: event.depositId,
			destination_chain_id: ChainId(destination_chain_id),
			input_amount: event.inputAmount,
			output_amount: event.outputAmount,
		})
	}
}
