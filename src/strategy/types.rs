//! Normalized inputs and outputs shared by the lending strategies.
//!
//! The runner converts exchange wire types into these snapshot types so the
//! allocators stay pure: one immutable snapshot in, an ordered list of
//! [`Action`]s out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::utils::annual_to_daily;

/// One ask level of the funding order book, as quoted by the exchange.
///
/// Asks arrive ascending by rate; the allocators rely on nothing beyond that.
#[derive(Debug, Clone, PartialEq)]
pub struct BookLevel {
    /// Annualized lend rate in percent.
    pub rate: Decimal,
    /// Volume offered at this level.
    pub amount: Decimal,
    /// Whether this level tracks the exchange's floating reference rate.
    pub frr: bool,
}

/// Read-only copy of an offer currently sitting on the exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSnapshot {
    pub id: u64,
    pub amount: Decimal,
    /// Portion of the offer that has not been taken yet.
    pub remaining_amount: Decimal,
    /// Annualized rate in percent.
    pub rate: Decimal,
    pub period_days: u32,
    pub created_at: DateTime<Utc>,
}

/// Everything a strategy is allowed to see for one run.
///
/// Gathered by the runner immediately before evaluation and discarded right
/// after; strategies hold no state between runs.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Funds free to lend, already capped by the account limits.
    pub available_funds: Decimal,
    /// Exchange minimum offer size, in the wallet currency.
    pub min_loan: Decimal,
    /// Funding book asks, ascending by rate.
    pub asks: Vec<BookLevel>,
    /// Our own offers currently on the book.
    pub active_offers: Vec<OfferSnapshot>,
    /// Clock reading for offer-age decisions.
    pub now: DateTime<Utc>,
}

impl Snapshot {
    /// Daily floating reference rate taken from the first FRR-flagged ask.
    ///
    /// Falls back to 1%/day when the book carries no FRR entry, which prices
    /// fresh offers far above the market instead of giving them away at zero.
    pub fn daily_frr(&self) -> Decimal {
        self.asks
            .iter()
            .find(|level| level.frr)
            .map(|level| annual_to_daily(level.rate))
            .unwrap_or(Decimal::ONE)
    }
}

/// A single decision produced by a strategy.
///
/// Actions carry no identity beyond the run that produced them; the executor
/// submits them in emission order and stops at the first transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Withdraw one of our offers from the book.
    Cancel { offer_id: u64 },
    /// Place a new loan offer.
    Lend {
        amount: Decimal,
        /// Annualized rate in percent.
        annual_rate: Decimal,
        period_days: u32,
    },
}
