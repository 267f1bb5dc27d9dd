//! Venue trait for the lending workflow.
//!
//! The runner and executor only see this interface, so the whole run flow can
//! be exercised against an in-memory venue in tests.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::exchange::error::ExchangeError;
use crate::exchange::types::{ActiveOffer, Lendbook, Ticker, WalletBalance};
use crate::exchange::BitfinexClient;

/// The operations one lending run needs from an exchange.
#[async_trait]
pub trait LendingVenue: Send + Sync {
    /// Funding book for a currency, asks ascending by rate.
    async fn lendbook(&self, currency: &str) -> Result<Lendbook, ExchangeError>;

    /// Public ticker for a trading pair such as "btcusd".
    async fn ticker(&self, pair: &str) -> Result<Ticker, ExchangeError>;

    /// All wallet balances of the account.
    async fn balances(&self) -> Result<Vec<WalletBalance>, ExchangeError>;

    /// All of our currently active offers.
    async fn active_offers(&self) -> Result<Vec<ActiveOffer>, ExchangeError>;

    /// Place a funding offer; rate is annualized percent.
    async fn new_offer(
        &self,
        currency: &str,
        amount: Decimal,
        annual_rate: Decimal,
        period_days: u32,
    ) -> Result<ActiveOffer, ExchangeError>;

    /// Cancel one of our offers by id.
    async fn cancel_offer(&self, offer_id: u64) -> Result<(), ExchangeError>;
}

#[async_trait]
impl LendingVenue for BitfinexClient {
    async fn lendbook(&self, currency: &str) -> Result<Lendbook, ExchangeError> {
        BitfinexClient::lendbook(self, currency).await
    }

    async fn ticker(&self, pair: &str) -> Result<Ticker, ExchangeError> {
        BitfinexClient::ticker(self, pair).await
    }

    async fn balances(&self) -> Result<Vec<WalletBalance>, ExchangeError> {
        BitfinexClient::balances(self).await
    }

    async fn active_offers(&self) -> Result<Vec<ActiveOffer>, ExchangeError> {
        BitfinexClient::active_offers(self).await
    }

    async fn new_offer(
        &self,
        currency: &str,
        amount: Decimal,
        annual_rate: Decimal,
        period_days: u32,
    ) -> Result<ActiveOffer, ExchangeError> {
        BitfinexClient::new_offer(self, currency, amount, annual_rate, period_days).await
    }

    async fn cancel_offer(&self, offer_id: u64) -> Result<(), ExchangeError> {
        BitfinexClient::cancel_offer(self, offer_id).await
    }
}
