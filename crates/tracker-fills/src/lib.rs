//! Destination-chain fill observation for the order tracker.
//!
//! The `FillWatcher` looks for the event a solver's fulfilling transaction
//! emits on the destination chain. `get_fill` is a single bounded lookup that
//! never fails on RPC errors; `wait_for_fill` polls it until a fill shows up,
//! the timeout elapses or the caller cancels.
//!
//! Protocol knowledge lives in a `FillMatcher`. Each destination chain gets a
//! `FillRoute` pairing a matcher with the contract that emits its events.

pub mod implementations;

use alloy::primitives::{Address, B256, U256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracker_chains::ChainClientManager;
use tracker_types::{
	truncate_hash, ChainClient, ChainId, FillEvent, GetFillParams, Log, LogFilter,
};

pub use implementations::{AcrossFillMatcher, Eip7683FillMatcher};

#[derive(Debug, Error)]
pub enum FillError {
	#[error("Chain {0} is not supported for fill watching")]
	UnsupportedChain(ChainId),

	#[error("Timeout must be greater than zero")]
	InvalidTimeout,

	#[error("Timed out after {timeout_ms}ms waiting for fill of deposit {deposit_id}")]
	Timeout { deposit_id: U256, timeout_ms: u64 },

	#[error("Invalid fill event: {0}")]
	InvalidEvent(String),

	#[error("Fill watch cancelled")]
	Cancelled,
}

/// Recognises one protocol's fill event.
pub trait FillMatcher: Send + Sync {
	/// Short protocol name used in logs.
	fn name(&self) -> &'static str;

	/// topic0 of the fill event.
	fn event_signature(&self) -> B256;

	/// Indexed topics 1..=3 identifying the fill for `params`.
	fn topics(&self, params: &GetFillParams) -> [Option<B256>; 3];

	/// Decodes a candidate log. A zero timestamp asks the watcher to take it
	/// from the containing block.
	fn decode(&self, log: &Log, params: &GetFillParams) -> Result<FillEvent, FillError>;
}

/// Where and how to look for fills on one destination chain.
#[derive(Clone)]
pub struct FillRoute {
	/// Contract emitting fill events. `None` matches any emitter.
	pub contract: Option<Address>,
	pub matcher: Arc<dyn FillMatcher>,
}

impl FillRoute {
	pub fn new(contract: Option<Address>, matcher: Arc<dyn FillMatcher>) -> Self {
		Self { contract, matcher }
	}

	pub fn across(contract: Option<Address>) -> Self {
		Self::new(contract, Arc::new(AcrossFillMatcher))
	}

	pub fn eip7683(contract: Option<Address>) -> Self {
		Self::new(contract, Arc::new(Eip7683FillMatcher))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillWatcherConfig {
	/// How many blocks behind the head a lookup starts.
	pub lookback_blocks: u64,
	/// Delay between lookups in `wait_for_fill`.
	pub poll_interval: Duration,
}

impl Default for FillWatcherConfig {
	fn default() -> Self {
		Self {
			lookback_blocks: 40_000,
			poll_interval: Duration::from_secs(5),
		}
	}
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Finds fills on destination chains.
#[derive(Clone)]
pub struct FillWatcher {
	clients: Arc<ChainClientManager>,
	routes: HashMap<ChainId, FillRoute>,
	config: FillWatcherConfig,
}

impl FillWatcher {
	pub fn new(clients: Arc<ChainClientManager>, config: FillWatcherConfig) -> Self {
		Self {
			clients,
			routes: HashMap::new(),
			config,
		}
	}

	pub fn with_route(mut self, chain_id: ChainId, route: FillRoute) -> Self {
		self.add_route(chain_id, route);
		self
	}

	pub fn add_route(&mut self, chain_id: ChainId, route: FillRoute) {
		debug!(
			chain_id = %chain_id,
			matcher = route.matcher.name(),
			"Registering fill route"
		);
		self.routes.insert(chain_id, route);
	}

	pub fn config(&self) -> &FillWatcherConfig {
		&self.config
	}

	/// Whether fills can be looked up on `chain_id`.
	pub fn supports(&self, chain_id: ChainId) -> bool {
		self.routes.contains_key(&chain_id) && self.clients.supports(chain_id)
	}

	fn route(
		&self,
		chain_id: ChainId,
	) -> Result<(&FillRoute, Arc<dyn ChainClient>), FillError> {
		let route = self
			.routes
			.get(&chain_id)
			.ok_or(FillError::UnsupportedChain(chain_id))?;
		let client = self
			.clients
			.get_client(chain_id)
			.map_err(|_| FillError::UnsupportedChain(chain_id))?;
		Ok((route, client))
	}

	/// Looks for the fill of `params` in the last `lookback_blocks` blocks.
	///
	/// RPC failures are logged and reported as "no fill yet". The only error
	/// is an unsupported destination chain.
	pub async fn get_fill(&self, params: &GetFillParams) -> Result<Option<FillEvent>, FillError> {
		let chain_id = params.destination_chain_id;
		let (route, client) = self.route(chain_id)?;

		let current_block = match client.get_block_number().await {
			Ok(block) => block,
			Err(e) => {
				warn!(chain_id = %chain_id, error = %e, "Failed to get block number for fill lookup");
				return Ok(None);
			}
		};

		let mut filter = LogFilter::new()
			.event_signature(route.matcher.event_signature())
			.from_block(current_block.saturating_sub(self.config.lookback_blocks));
		if let Some(contract) = route.contract {
			filter = filter.address(contract);
		}
		for (i, topic) in route.matcher.topics(params).into_iter().enumerate() {
			filter = filter.topic(i + 1, topic);
		}

		let logs = match client.get_logs(&filter).await {
			Ok(logs) => logs,
			Err(e) => {
				warn!(
					chain_id = %chain_id,
					deposit_id = %params.deposit_id,
					error = %e,
					"Failed to query fill logs"
				);
				return Ok(None);
			}
		};

		let Some(fill) = logs.iter().find_map(|log| {
			route
				.matcher
				.decode(log, params)
				.map_err(|e| {
					debug!(
						tx_hash = %truncate_hash(&log.transaction_hash.to_string()),
						error = %e,
						"Skipping undecodable fill log"
					)
				})
				.ok()
		}) else {
			return Ok(None);
		};

		if fill.timestamp != 0 {
			return Ok(Some(fill));
		}
		self.backfill_timestamp(client.as_ref(), fill).await
	}

	async fn backfill_timestamp(
		&self,
		client: &dyn ChainClient,
		mut fill: FillEvent,
	) -> Result<Option<FillEvent>, FillError> {
		match client.get_block(fill.block_number).await {
			Ok(Some(block)) => {
				fill.timestamp = block.timestamp;
				Ok(Some(fill))
			}
			Ok(None) => {
				warn!(
					chain_id = %client.chain_id(),
					block = fill.block_number,
					"Fill block not found, cannot backfill timestamp"
				);
				Ok(None)
			}
			Err(e) => {
				warn!(
					chain_id = %client.chain_id(),
					block = fill.block_number,
					error = %e,
					"Failed to fetch fill block"
				);
				Ok(None)
			}
		}
	}

	/// Polls `get_fill` until a fill is found.
	///
	/// The first lookup happens immediately. Fails with `Timeout` once
	/// `timeout` has elapsed after a poll interval, or `Cancelled` as soon as
	/// `cancel` fires.
	pub async fn wait_for_fill(
		&self,
		params: &GetFillParams,
		timeout: Duration,
		cancel: &CancellationToken,
	) -> Result<FillEvent, FillError> {
		if timeout.is_zero() {
			return Err(FillError::InvalidTimeout);
		}
		if cancel.is_cancelled() {
			return Err(FillError::Cancelled);
		}

		let started = Instant::now();
		info!(
			deposit_id = %params.deposit_id,
			destination_chain_id = %params.destination_chain_id,
			timeout_secs = timeout.as_secs(),
			"Waiting for fill"
		);

		if let Some(fill) = self.get_fill(params).await? {
			return Ok(fill);
		}

		loop {
			tokio::select! {
				_ = cancel.cancelled() => return Err(FillError::Cancelled),
				_ = tokio::time::sleep(self.config.poll_interval) => {}
			}

			let elapsed = started.elapsed();
			if elapsed >= timeout {
				return Err(FillError::Timeout {
					deposit_id: params.deposit_id,
					timeout_ms: millis(timeout),
				});
			}
			if cancel.is_cancelled() {
				return Err(FillError::Cancelled);
			}

			debug!(
				deposit_id = %params.deposit_id,
				elapsed_ms = millis(elapsed),
				"Polling for fill"
			);
			if let Some(fill) = self.get_fill(params).await? {
				info!(
					deposit_id = %params.deposit_id,
					fill_tx_hash = %truncate_hash(&fill.fill_tx_hash.to_string()),
					"Fill found"
				);
				return Ok(fill);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::across::tests::filled_relay;
	use crate::implementations::eip7683::tests::output_filled;
	use alloy::primitives::Bytes;
	use alloy::sol_types::SolEvent;
	use tracker_types::testing::{log_from, MockChainClient};

	const ORIGIN: ChainId = ChainId::OPTIMISM;
	const DESTINATION: ChainId = ChainId::ARBITRUM;

	fn spoke_pool() -> Address {
		Address::repeat_byte(0x5b)
	}

	fn params(deposit_id: u64) -> GetFillParams {
		GetFillParams {
			origin_chain_id: ORIGIN,
			destination_chain_id: DESTINATION,
			deposit_id: U256::from(deposit_id),
			user: Address::repeat_byte(0xaa),
			fill_deadline: 1_700_003_600,
		}
	}

	fn fill_log(deposit_id: u64, block: u64, tx_byte: u8) -> Log {
		log_from(
			spoke_pool(),
			filled_relay(ORIGIN.0, deposit_id).encode_log_data(),
			block,
			B256::repeat_byte(tx_byte),
			0,
		)
	}

	fn setup(client: MockChainClient) -> (FillWatcher, Arc<MockChainClient>) {
		let client = Arc::new(client);
		let manager = ChainClientManager::new().with_client(client.clone()).unwrap();
		let watcher = FillWatcher::new(Arc::new(manager), FillWatcherConfig::default())
			.with_route(DESTINATION, FillRoute::across(Some(spoke_pool())));
		(watcher, client)
	}

	#[tokio::test]
	async fn test_lookback_clamps_at_genesis() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION).with_block_number(30_000));

		assert!(watcher.get_fill(&params(1)).await.unwrap().is_none());

		let filters = client.filters();
		assert_eq!(filters.len(), 1);
		assert_eq!(filters[0].from_block, 0);
		assert_eq!(filters[0].to_block, None);
		assert_eq!(filters[0].address, Some(spoke_pool()));
		assert_eq!(filters[0].topics[0], Some(implementations::across::FilledRelay::SIGNATURE_HASH));
	}

	#[tokio::test]
	async fn test_lookback_window() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION).with_block_number(100_000));

		watcher.get_fill(&params(1)).await.unwrap();

		assert_eq!(client.filters()[0].from_block, 60_000);
	}

	#[tokio::test]
	async fn test_fill_timestamp_backfilled_from_block() {
		let (watcher, _) = setup(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(fill_log(7, 950, 0xf1))
				.with_block_timestamp(950, 1_700_000_500),
		);

		let fill = watcher.get_fill(&params(7)).await.unwrap().unwrap();

		assert_eq!(fill.fill_tx_hash, B256::repeat_byte(0xf1));
		assert_eq!(fill.block_number, 950);
		assert_eq!(fill.timestamp, 1_700_000_500);
		assert_eq!(fill.deposit_id, U256::from(7u64));
	}

	#[tokio::test]
	async fn test_event_timestamp_skips_block_lookup() {
		let order_id = B256::repeat_byte(0x77);
		let event = output_filled(order_id, 1_750_000_000);
		let client = Arc::new(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(log_from(
					spoke_pool(),
					event.encode_log_data(),
					950,
					B256::repeat_byte(0xf3),
					0,
				)),
		);
		let manager = ChainClientManager::new().with_client(client.clone()).unwrap();
		let watcher = FillWatcher::new(Arc::new(manager), FillWatcherConfig::default())
			.with_route(DESTINATION, FillRoute::eip7683(Some(spoke_pool())));
		let mut by_order = params(0);
		by_order.deposit_id = U256::from_be_bytes(order_id.0);

		let fill = watcher.get_fill(&by_order).await.unwrap().unwrap();

		assert_eq!(fill.timestamp, 1_750_000_000);
		assert_eq!(fill.fill_tx_hash, B256::repeat_byte(0xf3));
		assert_eq!(fill.block_number, 950);
		assert_eq!(client.calls.blocks(), 0);
		assert_eq!(client.filters()[0].topics[1], Some(order_id));
	}

	#[test]
	fn test_millis_saturates() {
		assert_eq!(millis(Duration::from_secs(12)), 12_000);
		assert_eq!(millis(Duration::MAX), u64::MAX);
	}

	#[tokio::test]
	async fn test_first_decodable_log_wins() {
		let mut garbled = fill_log(7, 940, 0xe0);
		garbled.data = Bytes::from(vec![0u8; 3]);
		let (watcher, _) = setup(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(garbled)
				.with_log(fill_log(8, 945, 0xe1))
				.with_log(fill_log(7, 950, 0xf1))
				.with_log(fill_log(7, 960, 0xf2))
				.with_block_timestamp(950, 1)
				.with_block_timestamp(960, 2),
		);

		let fill = watcher.get_fill(&params(7)).await.unwrap().unwrap();

		assert_eq!(fill.fill_tx_hash, B256::repeat_byte(0xf1));
	}

	#[tokio::test]
	async fn test_rpc_failures_resolve_to_none() {
		let (watcher, client) = setup(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(fill_log(7, 950, 0xf1)),
		);

		client.set_fail_block_number(true);
		assert!(watcher.get_fill(&params(7)).await.unwrap().is_none());
		client.set_fail_block_number(false);

		client.set_fail_logs(true);
		assert!(watcher.get_fill(&params(7)).await.unwrap().is_none());
		client.set_fail_logs(false);

		client.set_fail_blocks(true);
		assert!(watcher.get_fill(&params(7)).await.unwrap().is_none());
		client.set_fail_blocks(false);

		// No timestamp registered for block 950.
		assert!(watcher.get_fill(&params(7)).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_unsupported_destination() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION));

		let mut no_route = params(1);
		no_route.destination_chain_id = ChainId::BASE;
		assert!(matches!(
			watcher.get_fill(&no_route).await,
			Err(FillError::UnsupportedChain(ChainId::BASE))
		));

		let watcher = watcher.with_route(ChainId::ETHEREUM, FillRoute::across(None));
		let mut no_client = params(1);
		no_client.destination_chain_id = ChainId::ETHEREUM;
		assert!(matches!(
			watcher.get_fill(&no_client).await,
			Err(FillError::UnsupportedChain(ChainId::ETHEREUM))
		));
		assert!(!watcher.supports(ChainId::ETHEREUM));
		assert!(watcher.supports(DESTINATION));
		assert_eq!(client.calls.total(), 0);
	}

	#[tokio::test]
	async fn test_wait_rejects_zero_timeout() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION));

		let result = watcher
			.wait_for_fill(&params(1), Duration::ZERO, &CancellationToken::new())
			.await;

		assert!(matches!(result, Err(FillError::InvalidTimeout)));
		assert_eq!(client.calls.total(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_returns_immediate_hit() {
		let (watcher, client) = setup(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(fill_log(7, 950, 0xf1))
				.with_block_timestamp(950, 1_700_000_500),
		);
		let started = Instant::now();

		let fill = watcher
			.wait_for_fill(&params(7), Duration::from_secs(60), &CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(fill.block_number, 950);
		assert_eq!(client.calls.logs(), 1);
		assert_eq!(started.elapsed(), Duration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_stops_polling_once_found() {
		let (watcher, client) = setup(
			MockChainClient::new(DESTINATION)
				.with_block_number(1_000)
				.with_log(fill_log(7, 950, 0xf1))
				.with_block_timestamp(950, 1_700_000_500)
				.with_logs_visible_from_call(3),
		);
		let started = Instant::now();

		let fill = watcher
			.wait_for_fill(&params(7), Duration::from_secs(60), &CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(fill.timestamp, 1_700_000_500);
		assert_eq!(client.calls.logs(), 3);
		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_times_out() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION).with_block_number(1_000));

		let result = watcher
			.wait_for_fill(&params(7), Duration::from_secs(12), &CancellationToken::new())
			.await;

		assert!(matches!(
			result,
			Err(FillError::Timeout { deposit_id, timeout_ms: 12_000 }) if deposit_id == U256::from(7u64)
		));
		// Lookups at 0s, 5s and 10s; the 15s tick is past the budget.
		assert_eq!(client.calls.logs(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_cancelled_mid_poll() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION).with_block_number(1_000));
		let cancel = CancellationToken::new();
		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_secs(7)).await;
			trigger.cancel();
		});

		let result = watcher
			.wait_for_fill(&params(7), Duration::from_secs(60), &cancel)
			.await;

		assert!(matches!(result, Err(FillError::Cancelled)));
		assert_eq!(client.calls.logs(), 2);
	}

	#[tokio::test]
	async fn test_wait_already_cancelled() {
		let (watcher, client) = setup(MockChainClient::new(DESTINATION));
		let cancel = CancellationToken::new();
		cancel.cancel();

		let result = watcher
			.wait_for_fill(&params(7), Duration::from_secs(60), &cancel)
			.await;

		assert!(matches!(result, Err(FillError::Cancelled)));
		assert_eq!(client.calls.total(), 0);
	}
}
