//! Signal execution for flip-bot.
//!
//! Turns a directional signal into orders: probe the entry instrument for
//! the largest size the account accepts, unwind the opposite instrument,
//! then start the post-trade cooldown.
//!
//! # Key Components
//!
//! - [`QuantityDiscovery`]: probe-buy search (bisection or halving descent)
//! - [`CooldownTracker`]: post-trade quiescent window
//! - [`SignalOrchestrator`]: sequences cooldown check, discovery, unwind
//! - [`Pacer`]: inter-probe delay, injectable for tests
//! - [`Clock`]: wall-clock source, injectable for tests
//!
//! # Signal handling (in `SignalOrchestrator::handle`)
//!
//! 1. Cooling -> close both instruments, handled
//! 2. Discovery on entry instrument
//! 3. Any success -> pause, close exit instrument, start cooldown, handled
//! 4. No success -> not handled, nothing closed

pub mod clock;
pub mod cooldown;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod pacer;

pub use clock::{Clock, SystemClock};
pub use cooldown::CooldownTracker;
pub use discovery::{DiscoveryConfig, QuantityDiscovery, SearchPolicy};
pub use error::{ExecutorError, ExecutorResult};
pub use orchestrator::SignalOrchestrator;
pub use pacer::{DynPacer, Pacer, RecordingPacer, TokioPacer};
