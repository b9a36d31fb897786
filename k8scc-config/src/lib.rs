//! Configuration management for the chaincode builder and launcher.
//!
//! Provides environment detection, configuration loading from YAML files,
//! and the shared configuration types consumed by the
//! launcher and the exchange store.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
