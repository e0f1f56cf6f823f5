//! Cross-chain order tracking.
//!
//! `OrderTracker` follows an order from the origin transaction that opened
//! it to the fill a solver delivers on the destination chain. Progress is
//! observed either by pulling a `TrackingRun` (directly, as a `Stream`, or
//! through `spawn_watch`) or by subscribing to a `TrackingEmitter`.
//!
//! Use `OrderTrackerBuilder` to compose a tracker from configuration.

pub mod builder;
pub mod emitter;
pub mod error;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use builder::OrderTrackerBuilder;
pub use emitter::{TrackingEmitter, TrackingEvent};
pub use error::TrackerError;
pub use tracker::{OrderTracker, TrackerSettings, TrackingRun, UpdateStream};
