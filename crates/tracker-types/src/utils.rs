//! Formatting and clock helpers used across the tracker crates.

use crate::Timestamp;
use chrono::{DateTime, SecondsFormat, Utc};

/// Truncate a hash or long identifier for display purposes.
///
/// Shows the first 6 and last 4 characters with an ellipsis in between,
/// or the original string if it's 12 characters or shorter.
pub fn truncate_hash(hash: &str) -> String {
	if hash.len() <= 12 {
		hash.to_string()
	} else {
		format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
	}
}

/// Current wall-clock time in unix seconds.
pub fn now_secs() -> Timestamp {
	Utc::now().timestamp().max(0) as Timestamp
}

/// Renders a unix timestamp as an ISO-8601 UTC string with millisecond
/// precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(secs: Timestamp) -> String {
	i64::try_from(secs)
		.ok()
		.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
		.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
		.unwrap_or_else(|| secs.to_string())
}
