//! Core domain types for flip-bot.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Signal`: directional webhook signal (long/short)
//! - `Instrument`, `InstrumentPair`: the two opposing instruments and their symbols
//! - `ProbeResult`, `DiscoveryOutcome`: results of probe buys and discovery runs

pub mod error;
pub mod execution;
pub mod signal;

pub use error::{CoreError, Result};
pub use execution::{DiscoveryOutcome, ProbeResult};
pub use signal::{Instrument, InstrumentPair, Signal};
