use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker_config::{ConfigLoader, TrackerConfig};
use tracker_core::{OrderTrackerBuilder, TrackingEvent};

mod cli;

use cli::{Cli, Command, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level, cli.log_format)?;

	match cli.command {
		Command::Watch {
			tx,
			origin,
			destination,
			timeout_secs,
		} => {
			let config = load_config(&cli).await?;
			let params = cli::watch_params(tx, origin, destination, timeout_secs);
			watch(config, params).await
		}
		Command::Status { tx, origin } => {
			let config = load_config(&cli).await?;
			let tracker =
				OrderTrackerBuilder::from_config(&config).context("Failed to build order tracker")?;
			let info = tracker
				.get_order_status(tx, origin)
				.await
				.context("Failed to query order status")?;
			println!("{}", serde_json::to_string_pretty(&info)?);
			Ok(())
		}
		Command::Validate => validate_config(&cli).await,
	}
}

async fn load_config(cli: &Cli) -> Result<TrackerConfig> {
	info!("Loading configuration from: {:?}", cli.config);
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

async fn watch(config: TrackerConfig, params: tracker_types::WatchParams) -> Result<()> {
	let emitter = OrderTrackerBuilder::new(config)
		.build_emitter()
		.context("Failed to build order tracker")?;

	let mut events = emitter.subscribe();
	let listener = tokio::spawn(async move {
		loop {
			match events.recv().await {
				Ok(event) => log_event(&event),
				Err(RecvError::Lagged(skipped)) => warn!("Event listener lagged, {} events skipped", skipped),
				Err(RecvError::Closed) => break,
			}
		}
	});

	let cancel = CancellationToken::new();
	let shutdown = cancel.clone();
	tokio::spawn(async move {
		shutdown_signal().await;
		info!("Shutdown signal received, stopping watch...");
		shutdown.cancel();
	});

	info!(
		tx_hash = %params.tx_hash,
		origin_chain_id = %params.origin_chain_id,
		destination_chain_id = %params.destination_chain_id,
		"Watching order"
	);
	let result = emitter.start_tracking(params, cancel).await;

	// Dropping the emitter closes the bus so the listener drains and exits.
	drop(emitter);
	listener.await.ok();

	let info = result.context("Order tracking failed")?;
	println!("{}", serde_json::to_string_pretty(&info)?);
	Ok(())
}

fn log_event(event: &TrackingEvent) {
	match event {
		TrackingEvent::Update(update) => debug!(status = %update.status, "{}", update.message),
		TrackingEvent::Status(status, update) => info!(
			status = %status,
			order_id = ?update.order_id,
			fill_tx_hash = ?update.fill_tx_hash,
			"{}",
			update.message
		),
		TrackingEvent::Error(message) => error!("Tracking error: {}", message),
	}
}

async fn validate_config(cli: &Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = load_config(cli).await?;

	info!("Configuration is valid");
	info!("Protocol: {:?}", config.tracker.protocol);
	let mut chains: Vec<_> = config.chains.iter().collect();
	chains.sort_by_key(|(id, _)| **id);
	for (chain_id, chain) in chains {
		match chain.fill_contract {
			Some(contract) => info!("  Chain {} ({}): fill contract {}", chain_id, chain.name, contract),
			None => info!("  Chain {} ({}): origin only", chain_id, chain.name),
		}
	}

	Ok(())
}

fn setup_tracing(log_level: &str, format: LogFormat) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	let registry = tracing_subscriber::registry().with(env_filter);
	match format {
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.try_init(),
	}
	.context("Failed to install tracing subscriber")?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			warn!("Failed to listen for Ctrl+C: {}", e);
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				warn!("Failed to install SIGTERM handler: {}", e);
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
