//! Push-based tracking.
//!
//! The `TrackingEmitter` drains a `TrackingRun` and republishes every update
//! on a broadcast bus, so any number of subscribers can follow a watch
//! without driving it themselves.

use crate::{OrderTracker, TrackerError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracker_types::{truncate_hash, OrderStatus, OrderTrackingInfo, OrderTrackingUpdate, WatchParams};

/// Notification published while tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingEvent {
	/// Every update, whatever its status.
	Update(OrderTrackingUpdate),
	/// The same update again, keyed by its status.
	Status(OrderStatus, OrderTrackingUpdate),
	/// The run or the final status query failed.
	Error(String),
}

impl TrackingEvent {
	/// Notification name: `update`, the lowercase status, or `error`.
	pub fn name(&self) -> &'static str {
		match self {
			TrackingEvent::Update(_) => "update",
			TrackingEvent::Status(status, _) => status.as_str(),
			TrackingEvent::Error(_) => "error",
		}
	}
}

/// Broadcasts tracking progress to subscribers.
#[derive(Clone)]
pub struct TrackingEmitter {
	tracker: OrderTracker,
	sender: broadcast::Sender<TrackingEvent>,
}

impl TrackingEmitter {
	/// Creates an emitter whose bus buffers `capacity` events per subscriber.
	pub fn new(tracker: OrderTracker, capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { tracker, sender }
	}

	pub fn tracker(&self) -> &OrderTracker {
		&self.tracker
	}

	/// Each subscriber receives every event published after it subscribed.
	pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: TrackingEvent,
	) -> Result<(), broadcast::error::SendError<TrackingEvent>> {
		self.sender.send(event)?;
		Ok(())
	}

	/// Watches an order to the end, publishing as it goes, and returns a
	/// final point-in-time status.
	///
	/// Errors are published as `TrackingEvent::Error` before being returned.
	pub async fn start_tracking(
		&self,
		params: WatchParams,
		cancel: CancellationToken,
	) -> Result<OrderTrackingInfo, TrackerError> {
		let tx_hash = params.tx_hash;
		let origin_chain_id = params.origin_chain_id;

		let result = match self.drain(params, cancel).await {
			Ok(()) => self.tracker.get_order_status(tx_hash, origin_chain_id).await,
			Err(e) => Err(e),
		};

		match result {
			Ok(info) => {
				info!(
					tx_hash = %truncate_hash(&tx_hash.to_string()),
					status = %info.status,
					"Tracking finished"
				);
				Ok(info)
			}
			Err(e) => {
				warn!(tx_hash = %truncate_hash(&tx_hash.to_string()), error = %e, "Tracking failed");
				self.publish(TrackingEvent::Error(e.to_string())).ok();
				Err(e)
			}
		}
	}

	async fn drain(&self, params: WatchParams, cancel: CancellationToken) -> Result<(), TrackerError> {
		let mut run = self.tracker.watch_order(params, cancel)?;

		while let Some(item) = run.next_update().await {
			let update = item?;
			self.publish(TrackingEvent::Update(update.clone())).ok();
			self.publish(TrackingEvent::Status(update.status, update)).ok();
		}

		Ok(())
	}
}
