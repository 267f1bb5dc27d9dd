//! Exchange integration.
//!
//! Bitfinex v1 REST client for funding-market data and offer management,
//! plus the [`LendingVenue`] trait the run flow is written against.

mod client;
mod error;
mod traits;
mod types;

pub use client::BitfinexClient;
pub use error::ExchangeError;
pub use traits::LendingVenue;
pub use types::*;
