//! OIF output settler `OutputFilled` matching.

use crate::{FillError, FillMatcher};
use alloy::primitives::{LogData, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracker_types::{FillEvent, GetFillParams, Log};

sol! {
	/// MandateOutput structure used in fill operations.
	struct MandateOutput {
		bytes32 oracle;
		bytes32 settler;
		uint256 chainId;
		bytes32 token;
		uint256 amount;
		bytes32 recipient;
		bytes call;
		bytes context;
	}

	/// Emitted by the output settler once an output has been delivered.
	event OutputFilled(
		bytes32 indexed orderId,
		bytes32 solver,
		uint32 timestamp,
		MandateOutput output,
		uint256 finalAmount
	);
}

/// Matches fills by order id, which the EIP-7683 parser stores as the
/// deposit id.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip7683FillMatcher;

fn order_id(params: &GetFillParams) -> B256 {
	B256::from(params.deposit_id.to_be_bytes::<32>())
}

impl FillMatcher for Eip7683FillMatcher {
	fn name(&self) -> &'static str {
		"eip7683"
	}

	fn event_signature(&self) -> B256 {
		OutputFilled::SIGNATURE_HASH
	}

	fn topics(&self, params: &GetFillParams) -> [Option<B256>; 3] {
		[Some(order_id(params)), None, None]
	}

	fn decode(&self, log: &Log, params: &GetFillParams) -> Result<FillEvent, FillError> {
		let event = OutputFilled::decode_log_data(&LogData::new_unchecked(
			log.topics.clone(),
			log.data.clone(),
		))
		.map_err(|e| FillError::InvalidEvent(format!("Failed to decode OutputFilled: {}", e)))?;

		if event.orderId != order_id(params) {
			return Err(FillError::InvalidEvent(format!(
				"OutputFilled for order {} does not match",
				event.orderId
			)));
		}

		Ok(FillEvent {
			fill_tx_hash: log.transaction_hash,
			block_number: log.block_number,
			timestamp: u64::from(event.timestamp),
			origin_chain_id: params.origin_chain_id,
			deposit_id: U256::from_be_bytes(event.orderId.0),
		})
	}
}
