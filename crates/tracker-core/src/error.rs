use thiserror::Error;
use tracker_fills::FillError;
use tracker_intents::IntentError;

#[derive(Debug, Error)]
pub enum TrackerError {
	#[error(transparent)]
	Intent(#[from] IntentError),

	#[error(transparent)]
	Fill(#[from] FillError),

	#[error("Timeout must be greater than zero")]
	InvalidTimeout,

	#[error("Configuration error: {0}")]
	Config(String),
}
