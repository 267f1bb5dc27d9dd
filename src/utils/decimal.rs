//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Offers are quoted with at most 8 decimal places.
const OFFER_SCALE: u32 = 8;

const DAYS_PER_YEAR: Decimal = dec!(365);

/// Truncate, never round, to the exchange's 8-decimal offer granularity.
///
/// Rounding up could place an offer a fraction above the wallet balance.
pub fn truncate_amount(value: Decimal) -> Decimal {
    value.trunc_with_scale(OFFER_SCALE)
}

/// Convert a daily percentage rate to the annualized form the exchange quotes.
pub fn daily_to_annual(daily_rate: Decimal) -> Decimal {
    daily_rate * DAYS_PER_YEAR
}

/// Convert an exchange-quoted annualized percentage rate to its daily form.
pub fn annual_to_daily(annual_rate: Decimal) -> Decimal {
    annual_rate / DAYS_PER_YEAR
}
