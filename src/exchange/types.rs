//! Type definitions for Bitfinex v1 API responses.
//!
//! All numeric fields arrive as JSON strings and are decoded into `Decimal`.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// One level of the funding book.
#[derive(Debug, Clone, Deserialize)]
pub struct LendbookEntry {
    /// Annualized rate in percent.
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub period: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub timestamp: Decimal,
    /// The exchange encodes the flag as "Yes"/"No".
    #[serde(deserialize_with = "yes_no")]
    pub frr: bool,
}

/// Funding order book: outstanding loan demands and offers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lendbook {
    #[serde(default)]
    pub bids: Vec<LendbookEntry>,
    /// Loan offers, ascending by rate.
    #[serde(default)]
    pub asks: Vec<LendbookEntry>,
}

/// One wallet's balance line.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletBalance {
    /// Wallet kind: "trading", "deposit" or "exchange".
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Portion not locked in open offers or positions.
    #[serde(with = "rust_decimal::serde::str")]
    pub available: Decimal,
}

/// Public ticker for a trading pair.
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    #[serde(with = "rust_decimal::serde::str")]
    pub mid: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub bid: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ask: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
}

/// One of our own funding offers as the exchange reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveOffer {
    pub id: u64,
    pub currency: String,
    /// Annualized rate in percent.
    #[serde(with = "rust_decimal::serde::str")]
    pub rate: Decimal,
    pub period: u32,
    /// "lend" or "loan".
    pub direction: String,
    /// Epoch seconds with a fractional part.
    #[serde(with = "rust_decimal::serde::str")]
    pub timestamp: Decimal,
    pub is_live: bool,
    pub is_cancelled: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub original_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub remaining_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub executed_amount: Decimal,
}

impl ActiveOffer {
    /// Placement time, if the reported epoch seconds are representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let seconds = self.timestamp.to_i64()?;
        Utc.timestamp_opt(seconds, 0).single()
    }
}

/// Body of a new funding offer request.
#[derive(Debug, Clone, Serialize)]
pub struct NewOfferRequest {
    pub currency: String,
    /// The exchange expects the numeric fields as strings.
    pub amount: String,
    /// Annualized rate in percent, as a string.
    pub rate: String,
    pub period: u32,
    pub direction: String,
}

fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lendbook_deserializes_frr_flags() {
        let json = r#"{
            "bids": [
                {"rate":"9.1287","amount":"5000.0","period":30,"timestamp":"1444257541.0","frr":"No"}
            ],
            "asks": [
                {"rate":"8.3965","amount":"407.7","period":2,"timestamp":"1444260343.0","frr":"No"},
                {"rate":"9.2406","amount":"150.0","period":30,"timestamp":"1444260704.0","frr":"Yes"}
            ]
        }"#;

        let book: Lendbook = serde_json::from_str(json).unwrap();

        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.asks[0].rate, dec!(8.3965));
        assert!(!book.asks[0].frr);
        assert!(book.asks[1].frr);
    }

    #[test]
    fn test_active_offer_roundtrip() {
        let json = r#"{
            "id":13800585,
            "currency":"USD",
            "rate":"31.39",
            "period":2,
            "direction":"lend",
            "timestamp":"1444276597.0",
            "is_live":true,
            "is_cancelled":false,
            "original_amount":"50.0",
            "remaining_amount":"50.0",
            "executed_amount":"0.0"
        }"#;

        let offer: ActiveOffer = serde_json::from_str(json).unwrap();

        assert_eq!(offer.id, 13800585);
        assert_eq!(offer.rate, dec!(31.39));
        assert_eq!(offer.remaining_amount, dec!(50.0));
        assert_eq!(
            offer.created_at().unwrap(),
            Utc.timestamp_opt(1_444_276_597, 0).single().unwrap()
        );
    }

    #[test]
    fn test_wallet_balances_deserialize() {
        let json = r#"[
            {"type":"deposit","currency":"usd","amount":"1250.0","available":"750.0"},
            {"type":"trading","currency":"btc","amount":"0.5","available":"0.5"}
        ]"#;

        let balances: Vec<WalletBalance> = serde_json::from_str(json).unwrap();

        assert_eq!(balances[0].wallet_type, "deposit");
        assert_eq!(balances[0].available, dec!(750.0));
        assert_eq!(balances[1].currency, "btc");
    }
}
