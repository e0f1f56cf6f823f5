//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracker_types::{ChainId, TxHash, WatchParams};

#[derive(Parser, Debug)]
#[command(name = "order-tracker")]
#[command(about = "Cross-chain order tracker", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,

	/// Path to configuration file
	#[arg(short, long, value_name = "FILE", env = "TRACKER_CONFIG", default_value = "config/example.toml")]
	pub config: PathBuf,

	/// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
	#[arg(long, env = "TRACKER_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Log output format
	#[arg(long, value_enum, default_value_t = LogFormat::Text)]
	pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	Text,
	Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Follow an order until it is filled, expires or the watch times out
	Watch {
		/// Origin transaction hash
		#[arg(long)]
		tx: TxHash,

		/// Origin chain id
		#[arg(long)]
		origin: ChainId,

		/// Destination chain id
		#[arg(long)]
		destination: ChainId,

		/// Overall watch budget; the configured default when omitted
		#[arg(long)]
		timeout_secs: Option<u64>,
	},

	/// Print the current status of an order
	Status {
		/// Origin transaction hash
		#[arg(long)]
		tx: TxHash,

		/// Origin chain id
		#[arg(long)]
		origin: ChainId,
	},

	/// Validate the configuration file
	Validate,
}

/// Builds watch parameters from the `watch` arguments.
pub fn watch_params(
	tx: TxHash,
	origin: ChainId,
	destination: ChainId,
	timeout_secs: Option<u64>,
) -> WatchParams {
	let params = WatchParams::new(tx, origin, destination);
	match timeout_secs {
		Some(secs) => params.with_timeout(Duration::from_secs(secs)),
		None => params,
	}
}
