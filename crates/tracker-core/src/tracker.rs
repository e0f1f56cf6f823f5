//! The order tracking state machine.
//!
//! `OrderTracker` combines the intent parser and the fill watcher. A watch is
//! driven through a `TrackingRun`, a pull-based producer that does no work
//! until the consumer asks for the next update. `spawn_watch` and
//! `TrackingRun::into_stream` are thin adapters over the same producer.

use crate::TrackerError;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracker_chains::ChainClientManager;
use tracker_fills::{FillError, FillWatcher};
use tracker_intents::OpenedIntentParser;
use tracker_types::{
	format_timestamp, now_secs, truncate_hash, ChainId, GetFillParams, OpenedOrder, OrderStatus,
	OrderTrackingInfo, OrderTrackingUpdate, TxHash, WatchParams, B256,
};

/// Update stream type
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<OrderTrackingUpdate, TrackerError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
	/// Budget of a watch whose params carry no timeout.
	pub default_timeout: Duration,
	/// Slack added to the fill deadline before a watch gives up up front.
	pub grace_period: Duration,
	/// Buffer of the channel behind `spawn_watch`.
	pub channel_capacity: usize,
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self {
			default_timeout: Duration::from_secs(300),
			grace_period: Duration::from_secs(60),
			channel_capacity: 16,
		}
	}
}

#[derive(Clone)]
enum RevertDetection {
	Disabled,
	Enabled(Arc<ChainClientManager>),
}

/// Tracks orders from their origin transaction to a fill.
///
/// Cheap to clone; every clone shares the same parser, watcher and clients.
#[derive(Clone)]
pub struct OrderTracker {
	parser: Arc<OpenedIntentParser>,
	watcher: Arc<FillWatcher>,
	revert_detection: RevertDetection,
	settings: TrackerSettings,
}

impl OrderTracker {
	/// A tracker that trusts the origin transaction to have succeeded.
	pub fn new(parser: OpenedIntentParser, watcher: FillWatcher, settings: TrackerSettings) -> Self {
		Self {
			parser: Arc::new(parser),
			watcher: Arc::new(watcher),
			revert_detection: RevertDetection::Disabled,
			settings,
		}
	}

	/// A tracker that reports `Failed` for reverted origin transactions,
	/// checked through `clients` before parsing.
	pub fn with_revert_detection(
		parser: OpenedIntentParser,
		watcher: FillWatcher,
		clients: Arc<ChainClientManager>,
		settings: TrackerSettings,
	) -> Self {
		Self {
			parser: Arc::new(parser),
			watcher: Arc::new(watcher),
			revert_detection: RevertDetection::Enabled(clients),
			settings,
		}
	}

	pub fn settings(&self) -> &TrackerSettings {
		&self.settings
	}

	pub fn fill_watcher(&self) -> &FillWatcher {
		&self.watcher
	}

	pub fn detects_reverts(&self) -> bool {
		matches!(self.revert_detection, RevertDetection::Enabled(_))
	}

	/// Whether the origin transaction is known to have reverted. Lookup
	/// failures count as "no".
	async fn origin_reverted(&self, tx_hash: TxHash, origin_chain_id: ChainId) -> bool {
		let RevertDetection::Enabled(clients) = &self.revert_detection else {
			return false;
		};

		let client = match clients.get_client(origin_chain_id) {
			Ok(client) => client,
			Err(e) => {
				warn!(chain_id = %origin_chain_id, error = %e, "Skipping revert check");
				return false;
			}
		};

		match client.get_transaction_receipt(tx_hash).await {
			Ok(Some(receipt)) => !receipt.status,
			Ok(None) => false,
			Err(e) => {
				warn!(
					chain_id = %origin_chain_id,
					tx_hash = %truncate_hash(&tx_hash.to_string()),
					error = %e,
					"Revert check failed"
				);
				false
			}
		}
	}

	/// Starts a watch. Nothing happens until the returned run is polled.
	///
	/// # Errors
	///
	/// Returns `TrackerError::InvalidTimeout` for a zero timeout.
	pub fn watch_order(
		&self,
		params: WatchParams,
		cancel: CancellationToken,
	) -> Result<TrackingRun, TrackerError> {
		let timeout = params.timeout.unwrap_or(self.settings.default_timeout);
		if timeout.is_zero() {
			return Err(TrackerError::InvalidTimeout);
		}

		Ok(TrackingRun {
			tracker: self.clone(),
			params,
			timeout,
			started: Instant::now(),
			cancel,
			state: RunState::Start,
		})
	}

	/// Drives a watch on a background task and hands back its updates.
	///
	/// The task stops when the run ends, the token is cancelled or the
	/// returned stream is dropped.
	pub fn spawn_watch(
		&self,
		params: WatchParams,
		cancel: CancellationToken,
	) -> Result<ReceiverStream<Result<OrderTrackingUpdate, TrackerError>>, TrackerError> {
		let mut run = self.watch_order(params, cancel)?;
		let (sender, receiver) = mpsc::channel(self.settings.channel_capacity.max(1));

		tokio::spawn(async move {
			loop {
				let item = tokio::select! {
					item = run.next_update() => item,
					_ = sender.closed() => {
						debug!("Update receiver dropped, stopping watch");
						break;
					}
				};
				let Some(item) = item else {
					break;
				};
				if sender.send(item).await.is_err() {
					debug!("Update receiver dropped, stopping watch");
					break;
				}
			}
		});

		Ok(ReceiverStream::new(receiver))
	}

	/// Point-in-time status of the order opened by `tx_hash`.
	///
	/// Performs a single fill lookup; a filled order reports `Finalized` even
	/// after its deadline.
	pub async fn get_order_status(
		&self,
		tx_hash: TxHash,
		origin_chain_id: ChainId,
	) -> Result<OrderTrackingInfo, TrackerError> {
		if self.origin_reverted(tx_hash, origin_chain_id).await {
			return Ok(OrderTrackingInfo::failed(tx_hash, origin_chain_id));
		}

		let order = self.parser.get_opened_order(tx_hash, origin_chain_id).await?;
		let fill = self
			.watcher
			.get_fill(&GetFillParams::for_order(&order, origin_chain_id))
			.await?;

		let status = match fill {
			Some(_) => OrderStatus::Finalized,
			None if now_secs() > order.fill_deadline => OrderStatus::Expired,
			None => OrderStatus::Pending,
		};

		Ok(OrderTrackingInfo::from_order(
			status,
			&order,
			origin_chain_id,
			fill,
		))
	}
}

enum RunState {
	Start,
	Parsing,
	Opened(OpenedOrder),
	Waiting {
		order: OpenedOrder,
		remaining: Duration,
	},
	Done,
}

/// One watch of one order.
///
/// Each `next_update` call advances the run to its next update. The run ends
/// after a terminal update, after an error, on cancellation, or after a
/// non-terminal `Pending` that gives up watching.
pub struct TrackingRun {
	tracker: OrderTracker,
	params: WatchParams,
	timeout: Duration,
	started: Instant,
	cancel: CancellationToken,
	state: RunState,
}

impl TrackingRun {
	pub fn params(&self) -> &WatchParams {
		&self.params
	}

	pub fn is_finished(&self) -> bool {
		matches!(self.state, RunState::Done)
	}

	/// Produces the next update, or `None` once the run has ended.
	///
	/// A cancelled run ends without a final update.
	pub async fn next_update(&mut self) -> Option<Result<OrderTrackingUpdate, TrackerError>> {
		if self.cancel.is_cancelled() {
			self.state = RunState::Done;
			return None;
		}

		let item = match std::mem::replace(&mut self.state, RunState::Done) {
			RunState::Start => {
				self.state = RunState::Parsing;
				Ok(self.update(
					OrderStatus::Pending,
					None,
					None,
					format!("Parsing order from transaction {}", self.params.tx_hash),
				))
			}
			RunState::Parsing => self.parse().await,
			RunState::Opened(order) => Ok(self.prepare_wait(order)),
			RunState::Waiting { order, remaining } => self.wait(order, remaining).await?,
			RunState::Done => return None,
		};

		if self.cancel.is_cancelled() {
			self.state = RunState::Done;
			return None;
		}

		if let Ok(update) = &item {
			debug!(
				status = %update.status,
				tx_hash = %truncate_hash(&self.params.tx_hash.to_string()),
				"{}",
				update.message
			);
		}
		Some(item)
	}

	/// Adapts the run to a `Stream` of updates.
	pub fn into_stream(mut self) -> UpdateStream {
		Box::pin(async_stream::stream! {
			while let Some(item) = self.next_update().await {
				yield item;
			}
		})
	}

	async fn parse(&mut self) -> Result<OrderTrackingUpdate, TrackerError> {
		let tx_hash = self.params.tx_hash;
		let origin_chain_id = self.params.origin_chain_id;

		if self.tracker.origin_reverted(tx_hash, origin_chain_id).await {
			info!(
				chain_id = %origin_chain_id,
				tx_hash = %truncate_hash(&tx_hash.to_string()),
				"Origin transaction reverted"
			);
			return Ok(self.update(
				OrderStatus::Failed,
				None,
				None,
				format!("Origin transaction {} reverted", tx_hash),
			));
		}

		let order = self
			.tracker
			.parser
			.get_opened_order(tx_hash, origin_chain_id)
			.await?;

		if order.destination_chain_id != self.params.destination_chain_id {
			warn!(
				expected = %self.params.destination_chain_id,
				actual = %order.destination_chain_id,
				"Order destination differs from the requested one, following the order"
			);
		}

		let update = self.update(
			OrderStatus::Pending,
			Some(order.order_id),
			None,
			format!(
				"Order {} opened with deposit id {} for chain {}",
				order.order_id, order.deposit_id, order.destination_chain_id
			),
		);
		self.state = RunState::Opened(order);
		Ok(update)
	}

	fn prepare_wait(&mut self, order: OpenedOrder) -> OrderTrackingUpdate {
		let grace_deadline = order
			.fill_deadline
			.saturating_add(self.tracker.settings.grace_period.as_secs());
		if now_secs() > grace_deadline {
			return self.update(
				OrderStatus::Expired,
				Some(order.order_id),
				None,
				format!(
					"Order expired before watching started (fill deadline {})",
					format_timestamp(order.fill_deadline)
				),
			);
		}

		let remaining = self.timeout.saturating_sub(self.started.elapsed());
		if remaining.is_zero() {
			return self.update(
				OrderStatus::Pending,
				Some(order.order_id),
				None,
				format!(
					"Timeout expired during order setup, order may still be filled before deadline at {}",
					format_timestamp(order.fill_deadline)
				),
			);
		}

		let update = self.update(
			OrderStatus::Pending,
			Some(order.order_id),
			None,
			format!(
				"Waiting for solver to fill order {} on chain {}",
				order.order_id, order.destination_chain_id
			),
		);
		self.state = RunState::Waiting { order, remaining };
		update
	}

	/// `None` when the wait was cancelled.
	async fn wait(
		&mut self,
		order: OpenedOrder,
		remaining: Duration,
	) -> Option<Result<OrderTrackingUpdate, TrackerError>> {
		let params = GetFillParams::for_order(&order, self.params.origin_chain_id);

		match self
			.tracker
			.watcher
			.wait_for_fill(&params, remaining, &self.cancel)
			.await
		{
			Ok(fill) => {
				info!(
					order_id = %truncate_hash(&order.order_id.to_string()),
					fill_tx_hash = %truncate_hash(&fill.fill_tx_hash.to_string()),
					block = fill.block_number,
					"Order filled"
				);
				Some(Ok(self.update(
					OrderStatus::Finalized,
					Some(order.order_id),
					Some(fill.fill_tx_hash),
					format!(
						"Order filled in transaction {} at block {}",
						fill.fill_tx_hash, fill.block_number
					),
				)))
			}
			Err(FillError::Timeout { .. }) if now_secs() > order.fill_deadline => {
				Some(Ok(self.update(
					OrderStatus::Expired,
					Some(order.order_id),
					None,
					format!(
						"Order expired before fill (fill deadline {})",
						format_timestamp(order.fill_deadline)
					),
				)))
			}
			Err(FillError::Timeout { .. }) => Some(Ok(self.update(
				OrderStatus::Pending,
				Some(order.order_id),
				None,
				format!(
					"Stopped watching after timeout, but order may still be filled before deadline at {}",
					format_timestamp(order.fill_deadline)
				),
			))),
			Err(FillError::Cancelled) => None,
			Err(e) => Some(Err(e.into())),
		}
	}

	fn update(
		&self,
		status: OrderStatus,
		order_id: Option<B256>,
		fill_tx_hash: Option<TxHash>,
		message: String,
	) -> OrderTrackingUpdate {
		OrderTrackingUpdate {
			status,
			order_id,
			open_tx_hash: self.params.tx_hash,
			fill_tx_hash,
			timestamp: now_secs(),
			message,
		}
	}
}
