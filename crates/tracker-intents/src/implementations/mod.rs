//! Opened-order decoders, one per settlement protocol.

pub mod across;
pub mod eip7683;

pub use across::AcrossDepositDecoder;
pub use eip7683::Eip7683OpenDecoder;
