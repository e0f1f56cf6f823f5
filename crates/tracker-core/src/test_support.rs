//! Shared fixture for tracker tests: one Across deposit on Optimism that may
//! be filled on Arbitrum.

use crate::{OrderTracker, TrackerSettings};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolEvent;
use std::sync::Arc;
use tracker_chains::ChainClientManager;
use tracker_fills::implementations::across::{FilledRelay, V3RelayExecutionEventInfo};
use tracker_fills::{FillRoute, FillWatcher, FillWatcherConfig};
use tracker_intents::implementations::across::{across_order_id, FundsDeposited};
use tracker_intents::OpenedIntentParser;
use tracker_types::testing::{log_from, receipt_with, MockChainClient};
use tracker_types::{ChainId, WatchParams};

pub(crate) const ORIGIN: ChainId = ChainId::OPTIMISM;
pub(crate) const DESTINATION: ChainId = ChainId::ARBITRUM;
pub(crate) const OPEN_TX: B256 = B256::new([0x0a; 32]);
pub(crate) const FILL_TX: B256 = B256::new([0xf1; 32]);
pub(crate) const FILL_BLOCK: u64 = 950;
pub(crate) const FILL_TIMESTAMP: u64 = 1_700_000_500;

const DEPOSIT_ID: u64 = 42;
const ORIGIN_SPOKE_POOL: Address = Address::new([0x5a; 20]);
const DESTINATION_SPOKE_POOL: Address = Address::new([0x5b; 20]);

fn deposit(fill_deadline: u64) -> FundsDeposited {
	FundsDeposited {
		inputToken: B256::repeat_byte(0x01),
		outputToken: B256::repeat_byte(0x02),
		inputAmount: U256::from(1_000_000u64),
		outputAmount: U256::from(995_000u64),
		destinationChainId: U256::from(DESTINATION.0),
		depositId: U256::from(DEPOSIT_ID),
		quoteTimestamp: 1_700_000_000,
		fillDeadline: fill_deadline as u32,
		exclusivityDeadline: 0,
		depositor: Address::repeat_byte(0xaa).into_word(),
		recipient: Address::repeat_byte(0xbb).into_word(),
		exclusiveRelayer: B256::ZERO,
		message: Default::default(),
	}
}

fn filled_relay(fill_deadline: u64) -> FilledRelay {
	FilledRelay {
		inputToken: B256::repeat_byte(0x01),
		outputToken: B256::repeat_byte(0x02),
		inputAmount: U256::from(1_000_000u64),
		outputAmount: U256::from(995_000u64),
		repaymentChainId: U256::from(ORIGIN.0),
		originChainId: U256::from(ORIGIN.0),
		depositId: U256::from(DEPOSIT_ID),
		fillDeadline: fill_deadline as u32,
		exclusivityDeadline: 0,
		exclusiveRelayer: B256::ZERO,
		relayer: Address::repeat_byte(0x5e).into_word(),
		depositor: Address::repeat_byte(0xaa).into_word(),
		recipient: Address::repeat_byte(0xbb).into_word(),
		messageHash: B256::ZERO,
		relayExecutionInfo: V3RelayExecutionEventInfo {
			updatedRecipient: Address::repeat_byte(0xbb).into_word(),
			updatedMessageHash: B256::ZERO,
			updatedOutputAmount: U256::from(995_000u64),
			fillType: 0,
		},
	}
}

pub(crate) struct Fixture {
	pub origin: Arc<MockChainClient>,
	pub destination: Arc<MockChainClient>,
	fill_deadline: u64,
}

impl Fixture {
	pub fn new(fill_deadline: u64) -> Self {
		Self::with_origin(fill_deadline, |client| client)
	}

	/// Lets a test tweak the origin client before it is shared.
	pub fn with_origin(
		fill_deadline: u64,
		customize: impl FnOnce(MockChainClient) -> MockChainClient,
	) -> Self {
		let open_log = log_from(
			ORIGIN_SPOKE_POOL,
			deposit(fill_deadline).encode_log_data(),
			500,
			OPEN_TX,
			0,
		);
		let origin = MockChainClient::new(ORIGIN)
			.with_receipt(receipt_with(OPEN_TX, 500, true, vec![open_log]));
		Self::from_clients(customize(origin), fill_deadline)
	}

	/// Origin transaction mined but reverted, so it carries no logs.
	pub fn reverted() -> Self {
		let origin = MockChainClient::new(ORIGIN)
			.with_receipt(receipt_with(OPEN_TX, 500, false, Vec::new()));
		Self::from_clients(origin, 0)
	}

	fn from_clients(origin: MockChainClient, fill_deadline: u64) -> Self {
		let destination = MockChainClient::new(DESTINATION)
			.with_block_number(1_000)
			.with_block_timestamp(FILL_BLOCK, FILL_TIMESTAMP);
		Self {
			origin: Arc::new(origin),
			destination: Arc::new(destination),
			fill_deadline,
		}
	}

	/// Makes the solver's fill visible on the destination chain.
	pub fn with_fill(self) -> Self {
		self.destination.push_log(log_from(
			DESTINATION_SPOKE_POOL,
			filled_relay(self.fill_deadline).encode_log_data(),
			FILL_BLOCK,
			FILL_TX,
			2,
		));
		self
	}

	pub fn order_id(&self) -> B256 {
		across_order_id(ORIGIN, U256::from(DEPOSIT_ID))
	}

	pub fn watch_params(&self) -> WatchParams {
		WatchParams::new(OPEN_TX, ORIGIN, DESTINATION)
	}

	pub fn clients(&self) -> Arc<ChainClientManager> {
		let manager = ChainClientManager::new()
			.with_client(self.origin.clone())
			.and_then(|manager| manager.with_client(self.destination.clone()))
			.unwrap();
		Arc::new(manager)
	}

	fn parts(&self) -> (Arc<ChainClientManager>, OpenedIntentParser, FillWatcher) {
		let clients = self.clients();
		let parser = OpenedIntentParser::across(clients.clone());
		let watcher = FillWatcher::new(clients.clone(), FillWatcherConfig::default())
			.with_route(DESTINATION, FillRoute::across(Some(DESTINATION_SPOKE_POOL)));
		(clients, parser, watcher)
	}

	pub fn tracker(&self) -> OrderTracker {
		let (_, parser, watcher) = self.parts();
		OrderTracker::new(parser, watcher, TrackerSettings::default())
	}

	pub fn tracker_with_revert_detection(&self) -> OrderTracker {
		let (clients, parser, watcher) = self.parts();
		OrderTracker::with_revert_detection(parser, watcher, clients, TrackerSettings::default())
	}
}
