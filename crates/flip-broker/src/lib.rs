//! Brokerage client for flip-bot.
//!
//! Sends buy and close orders to the SignalStack webhook and decides whether
//! each response means the order went through. The API reports many
//! application-level rejections (e.g. insufficient buying power) with a 200
//! status, so classification inspects the body, not just the HTTP code.

pub mod broker;
pub mod classify;
pub mod client;
pub mod error;
pub mod mock;

pub use broker::{BoxFuture, Broker, DynBroker};
pub use classify::is_successful;
pub use client::{OrderAction, OrderRequest, SignalStackClient};
pub use error::{BrokerError, BrokerResult};
pub use mock::{BuyRecord, MockBroker};
