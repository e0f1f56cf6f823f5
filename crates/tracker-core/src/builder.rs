//! Composition root: turns a `TrackerConfig` into a ready `OrderTracker`.

use crate::{OrderTracker, TrackerError, TrackerSettings, TrackingEmitter};
use std::sync::Arc;
use tracing::{debug, info};
use tracker_chains::ChainClientManager;
use tracker_config::{Protocol, TrackerConfig};
use tracker_fills::{FillRoute, FillWatcher, FillWatcherConfig};
use tracker_intents::OpenedIntentParser;

pub struct OrderTrackerBuilder {
	config: TrackerConfig,
	clients: Option<Arc<ChainClientManager>>,
}

impl OrderTrackerBuilder {
	pub fn new(config: TrackerConfig) -> Self {
		Self {
			config,
			clients: None,
		}
	}

	/// Builds a tracker with one HTTP client per configured chain.
	pub fn from_config(config: &TrackerConfig) -> Result<OrderTracker, TrackerError> {
		Self::new(config.clone()).build()
	}

	/// Uses existing clients instead of connecting to the configured RPC URLs.
	pub fn with_clients(mut self, clients: Arc<ChainClientManager>) -> Self {
		self.clients = Some(clients);
		self
	}

	pub fn build(self) -> Result<OrderTracker, TrackerError> {
		let settings = &self.config.tracker;

		let clients = match self.clients {
			Some(clients) => clients,
			None => Arc::new(
				ChainClientManager::with_http_endpoints(self.config.rpc_endpoints())
					.map_err(|e| TrackerError::Config(e.to_string()))?,
			),
		};

		let parser = match settings.protocol {
			Protocol::Across => OpenedIntentParser::across(clients.clone()),
			Protocol::Eip7683 => OpenedIntentParser::eip7683(clients.clone()),
		};

		let mut watcher = FillWatcher::new(
			clients.clone(),
			FillWatcherConfig {
				lookback_blocks: settings.lookback_blocks,
				poll_interval: settings.poll_interval(),
			},
		);
		for (chain_id, chain) in &self.config.chains {
			let Some(contract) = chain.fill_contract else {
				debug!("Chain {} ({}) has no fill contract, fills will not be watched", chain_id, chain.name);
				continue;
			};
			let route = match settings.protocol {
				Protocol::Across => FillRoute::across(Some(contract)),
				Protocol::Eip7683 => FillRoute::eip7683(Some(contract)),
			};
			watcher.add_route(*chain_id, route);
		}

		let tracker_settings = TrackerSettings {
			default_timeout: settings.default_timeout(),
			grace_period: settings.grace_period(),
			channel_capacity: settings.channel_capacity,
		};

		info!(
			protocol = ?settings.protocol,
			chains = clients.chains().len(),
			revert_detection = settings.revert_detection,
			"Order tracker initialized"
		);

		Ok(if settings.revert_detection {
			OrderTracker::with_revert_detection(parser, watcher, clients, tracker_settings)
		} else {
			OrderTracker::new(parser, watcher, tracker_settings)
		})
	}

	/// Builds a tracker wrapped in an emitter sized from the configuration.
	pub fn build_emitter(self) -> Result<TrackingEmitter, TrackerError> {
		let capacity = self.config.tracker.channel_capacity;
		Ok(TrackingEmitter::new(self.build()?, capacity))
	}
}
