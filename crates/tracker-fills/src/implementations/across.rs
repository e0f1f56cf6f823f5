//! Across V3 `FilledRelay` matching.

use crate::{FillError, FillMatcher};
use alloy::primitives::{LogData, B256, U256};
use alloy::sol;
use alloy::sol_types::SolEvent;
use tracker_types::{FillEvent, GetFillParams, Log};

sol! {
	/// Relay execution details attached to every fill.
	struct V3RelayExecutionEventInfo {
		bytes32 updatedRecipient;
		bytes32 updatedMessageHash;
		uint256 updatedOutputAmount;
		uint8 fillType;
	}

	/// Emitted by the destination SpokePool when a relayer fills a deposit.
	event FilledRelay(
		bytes32 inputToken,
		bytes32 outputToken,
		uint256 inputAmount,
		uint256 outputAmount,
		uint256 repaymentChainId,
		uint256 indexed originChainId,
		uint256 indexed depositId,
		uint32 fillDeadline,
		uint32 exclusivityDeadline,
		bytes32 exclusiveRelayer,
		bytes32 indexed relayer,
		bytes32 depositor,
		bytes32 recipient,
		bytes32 messageHash,
		V3RelayExecutionEventInfo relayExecutionInfo
	);
}

/// Matches fills by `(originChainId, depositId)`.
///
/// `FilledRelay` carries no timestamp, so every match is returned with a zero
/// timestamp and backfilled from its block by the watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcrossFillMatcher;

impl FillMatcher for AcrossFillMatcher {
	fn name(&self) -> &'static str {
		"across"
	}

	fn event_signature(&self) -> B256 {
		FilledRelay::SIGNATURE_HASH
	}

	fn topics(&self, params: &GetFillParams) -> [Option<B256>; 3] {
		[
			Some(B256::from(U256::from(params.origin_chain_id.0).to_be_bytes::<32>())),
			Some(B256::from(params.deposit_id.to_be_bytes::<32>())),
			None,
		]
	}

	fn decode(&self, log: &Log, params: &GetFillParams) -> Result<FillEvent, FillError> {
		let event = FilledRelay::decode_log_data(&LogData::new_unchecked(
			log.topics.clone(),
			log.data.clone(),
		))
		.map_err(|e| FillError::InvalidEvent(format!("Failed to decode FilledRelay: {}", e)))?;

		if event.depositId != params.deposit_id
			|| event.originChainId != U256::from(params.origin_chain_id.0)
		{
			return Err(FillError::InvalidEvent(format!(
				"FilledRelay for deposit {} from chain {} does not match",
				event.depositId, event.originChainId
			)));
		}

		Ok(FillEvent {
			fill_tx_hash: log.transaction_hash,
			block_number: log.block_number,
			timestamp: 0,
			origin_chain_id: params.origin_chain_id,
			deposit_id: event.depositId,
		})
	}
}
