//! Configuration types for the tracker.

use crate::serde_helpers::{deserialize_chain_id_map, serialize_chain_id_map};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracker_types::{Address, ChainId};

/// Complete tracker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
	/// Tracking behaviour
	#[serde(default)]
	pub tracker: TrackerSettings,
	/// Chain configurations
	#[serde(
		deserialize_with = "deserialize_chain_id_map",
		serialize_with = "serialize_chain_id_map"
	)]
	pub chains: HashMap<ChainId, ChainConfig>,
}

/// Which settlement protocol's events to parse and match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
	/// Across V3 `FundsDeposited` / `FilledRelay`.
	#[default]
	Across,
	/// EIP-7683 `Open` / OIF `OutputFilled`.
	Eip7683,
}

/// Tracking behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerSettings {
	pub protocol: Protocol,
	/// Overall budget of a watch when the caller gives none
	pub default_timeout_secs: u64,
	/// Added to the fill deadline before an unfilled order counts as expired
	pub grace_period_secs: u64,
	/// Delay between fill queries while waiting
	pub poll_interval_secs: u64,
	/// How far back a fill query looks
	pub lookback_blocks: u64,
	/// Check the origin receipt for a revert before parsing
	pub revert_detection: bool,
	/// Buffer size of spawned update channels and the event bus
	pub channel_capacity: usize,
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self {
			protocol: Protocol::default(),
			default_timeout_secs: 300,
			grace_period_secs: 60,
			poll_interval_secs: 5,
			lookback_blocks: 40_000,
			revert_detection: true,
			channel_capacity: 16,
		}
	}
}

impl TrackerSettings {
	pub fn default_timeout(&self) -> Duration {
		Duration::from_secs(self.default_timeout_secs)
	}

	pub fn grace_period(&self) -> Duration {
		Duration::from_secs(self.grace_period_secs)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}
}

/// Chain-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Chain name for logging
	pub name: String,
	/// RPC endpoint URL
	pub rpc_url: String,
	/// Contract emitting fill events when this chain is a destination.
	/// Fills cannot be watched on a chain without one.
	#[serde(default)]
	pub fill_contract: Option<Address>,
}

impl TrackerConfig {
	/// RPC endpoints keyed by chain.
	pub fn rpc_endpoints(&self) -> HashMap<ChainId, String> {
		self.chains
			.iter()
			.map(|(id, chain)| (*id, chain.rpc_url.clone()))
			.collect()
	}
}
