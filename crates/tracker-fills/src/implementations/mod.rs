//! Fill matchers, one per settlement protocol.

pub mod across;
pub mod eip7683;

pub use across::AcrossFillMatcher;
pub use eip7683::Eip7683FillMatcher;
