//! EIP-7683 `Open` event decoding.

use crate::{IntentError, OpenContext, OpenedOrderDecoder};
use alloy::primitives::{LogData, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracker_types::{ChainId, Log, OpenedOrder};

// Solidity type definitions for EIP-7683 cross-chain order events.
sol! {
	/// Output specification for cross-chain orders.
	struct Output {
		bytes32 token;
		uint256 amount;
		bytes32 recipient;
		uint256 chainId;
	}

	/// Fill instruction for cross-chain execution.
	struct FillInstruction {
		uint64 destinationChainId;
		bytes32 destinationSettler;
		bytes originData;
	}

	/// Resolved cross-chain order structure.
	struct ResolvedCrossChainOrder {
		address user;
		uint256 originChainId;
		uint32 openDeadline;
		uint32 fillDeadline;
		bytes32 orderId;
		Output[] maxSpent;
		Output[] minReceived;
		FillInstruction[] fillInstructions;
	}

	/// Event emitted when a new cross-chain order is opened.
	event Open(bytes32 indexed orderId, ResolvedCrossChainOrder order);
}

/// Decoder for EIP-7683 `Open`.
///
/// The order id doubles as the deposit id, since OIF output settlers key
/// their fill events by order id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip7683OpenDecoder;

impl OpenedOrderDecoder for Eip7683OpenDecoder {
	fn name(&self) -> &'static str {
		"eip7683"
	}

	fn event_signature(&self) -> B256 {
		Open::SIGNATURE_HASH
	}

	fn decode(&self, log: &Log, context: &OpenContext) -> Result<OpenedOrder, IntentError> {
		let event = Open::decode_log_data(&LogData::new_unchecked(
			log.topics.clone(),
			log.data.clone(),
		))
		.map_err(|e| IntentError::InvalidEvent(format!("Failed to decode Open: {}", e)))?;

		let order = &event.order;
		let instruction = order
			.fillInstructions
			.first()
			.ok_or_else(|| IntentError::InvalidEvent("Order has no fill instructions".into()))?;
		let input = order
			.minReceived
			.first()
			.ok_or_else(|| IntentError::InvalidEvent("Order has no inputs".into()))?;
		let output = order
			.maxSpent
			.first()
			.ok_or_else(|| IntentError::InvalidEvent("Order has no outputs".into()))?;

		Ok(OpenedOrder {
			order_id: event.orderId,
			open_tx_hash: context.tx_hash,
			block_number: context.block_number,
			origin_contract: log.address,
			user: order.user,
			fill_deadline: u64::from(order.fillDeadline),
			deposit_id: U256::from_be_bytes(event.orderId.0),
			destination_chain_id: ChainId(instruction.destinationChainId),
			input_amount: input.amount,
			output_amount: output.amount,
		})
	}
}
