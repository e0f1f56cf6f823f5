//! Chain client implementations.

pub mod evm;
