//! Configuration management for the lending bot.
//!
//! Loads settings from a config file and environment variables. One file may
//! describe several exchange accounts; each account carries its own wallet
//! limits and strategy section.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Accounts to process, in order. Each run fetches its own snapshot.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

/// One exchange account plus the strategy that manages it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub bitfinex: BitfinexConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitfinexConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret key for signing requests
    #[serde(default)]
    pub secret_key: String,
    /// Funding wallet currency the bot manages (e.g. "usd", "btc")
    #[serde(default = "default_active_wallet")]
    pub active_wallet: String,
    /// Cap on total funds kept lent out; negative disables the cap
    #[serde(default = "default_max_active_amount")]
    pub max_active_amount: Decimal,
    /// Exchange minimum offer size, expressed in USD
    #[serde(default = "default_min_loan_usd")]
    pub min_loan_usd: Decimal,
}

/// Strategy selection plus the parameters of both allocators.
///
/// Only the section named by `active` is consulted at run time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy name, matched case-insensitively ("MarginBot" or "CascadeBot")
    #[serde(default = "default_active_strategy")]
    pub active: String,
    #[serde(default)]
    pub margin_bot: DepthSplitConfig,
    #[serde(default)]
    pub cascade_bot: DecayConfig,
}

/// Parameters of the order-book depth-splitting allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSplitConfig {
    /// Floor for any placed offer, in percent per day
    #[serde(default = "default_min_daily_rate")]
    pub min_daily_rate: Decimal,
    /// Number of price bands the split pool is spread across
    #[serde(default = "default_split_count")]
    pub split_count: u32,
    /// Cumulative book depth (wallet currency) where the first band prices
    #[serde(default)]
    pub gap_bottom: Decimal,
    /// Cumulative book depth where the last band prices
    #[serde(default)]
    pub gap_top: Decimal,
    /// Daily rate at or above which offers run 30 days; zero disables
    #[serde(default)]
    pub thirty_day_threshold: Decimal,
    /// Daily rate of the reserved high-hold slice
    #[serde(default)]
    pub high_hold_daily_rate: Decimal,
    /// Size of the high-hold slice; zero disables the carve-out
    #[serde(default)]
    pub high_hold_amount: Decimal,
}

/// Parameters of the rate-decay allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Premium over the floating reference rate for fresh offers, %/day
    #[serde(default = "default_start_rate_over_frr")]
    pub start_daily_rate_over_frr: Decimal,
    /// Floor the decay never crosses, in percent per day
    #[serde(default = "default_min_daily_rate")]
    pub min_daily_rate: Decimal,
    /// Offer age that triggers a cancel-and-reprice cycle
    #[serde(default = "default_reduction_interval_minutes")]
    pub reduction_interval_minutes: i64,
    /// Linear rate reduction applied once per cycle, %/day
    #[serde(default = "default_reduce_daily_rate_step")]
    pub reduce_daily_rate_step: Decimal,
    /// Multiplier pulling the reduced rate toward the floor, in (0, 1]
    #[serde(default = "default_decay_multiplier")]
    pub decay_multiplier: Decimal,
    /// Period for repriced offers when the exchange requires one
    #[serde(default = "default_offer_period_days")]
    pub offer_period_days: u32,
}

// Default value functions

fn default_active_wallet() -> String {
    "usd".to_string()
}

fn default_max_active_amount() -> Decimal {
    dec!(-1) // uncapped
}

fn default_min_loan_usd() -> Decimal {
    dec!(50)
}

fn default_active_strategy() -> String {
    "MarginBot".to_string()
}

fn default_min_daily_rate() -> Decimal {
    dec!(0.01) // 0.01% daily == 3.65% yearly
}

fn default_split_count() -> u32 {
    3
}

fn default_start_rate_over_frr() -> Decimal {
    dec!(0.01)
}

fn default_reduction_interval_minutes() -> i64 {
    45
}

fn default_reduce_daily_rate_step() -> Decimal {
    dec!(0.001)
}

fn default_decay_multiplier() -> Decimal {
    dec!(0.95)
}

fn default_offer_period_days() -> u32 {
    2
}

impl Config {
    /// Load configuration from the named file and environment variables.
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::default().separator("__").prefix("ML"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.accounts.is_empty(), "no accounts configured");

        for account in &self.accounts {
            account.validate()?;
        }

        Ok(())
    }

    /// Non-fatal configuration problems, one message per finding.
    ///
    /// These are logged and execution continues; a suspicious rate is the
    /// operator's call, not ours.
    pub fn warnings(&self) -> Vec<String> {
        self.accounts
            .iter()
            .flat_map(|account| account.warnings())
            .collect()
    }
}

impl AccountConfig {
    fn validate(&self) -> Result<()> {
        let wallet = &self.bitfinex.active_wallet;
        anyhow::ensure!(!wallet.is_empty(), "active_wallet must be set");
        anyhow::ensure!(
            self.bitfinex.min_loan_usd > Decimal::ZERO,
            "min_loan_usd must be positive"
        );

        let margin = &self.strategy.margin_bot;
        anyhow::ensure!(
            margin.gap_top >= margin.gap_bottom,
            "margin_bot.gap_top must not be below gap_bottom"
        );

        let cascade = &self.strategy.cascade_bot;
        anyhow::ensure!(
            cascade.decay_multiplier > Decimal::ZERO && cascade.decay_multiplier <= Decimal::ONE,
            "cascade_bot.decay_multiplier must be in (0, 1]"
        );
        anyhow::ensure!(
            cascade.reduction_interval_minutes > 0,
            "cascade_bot.reduction_interval_minutes must be positive"
        );
        anyhow::ensure!(
            cascade.reduce_daily_rate_step >= Decimal::ZERO,
            "cascade_bot.reduce_daily_rate_step must not be negative"
        );
        anyhow::ensure!(
            cascade.offer_period_days > 0,
            "cascade_bot.offer_period_days must be positive"
        );

        Ok(())
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let wallet = &self.bitfinex.active_wallet;
        let margin = &self.strategy.margin_bot;
        let cascade = &self.strategy.cascade_bot;

        // 0.003% daily == 1.095% yearly
        let suspicious_floor = dec!(0.003);

        if margin.min_daily_rate <= suspicious_floor {
            warnings.push(format!(
                "{wallet}: margin_bot minimum daily lend rate is low ({}%)",
                margin.min_daily_rate
            ));
        }

        if margin.high_hold_daily_rate < margin.min_daily_rate {
            warnings.push(format!(
                "{wallet}: high-hold daily lend rate ({}%/day) is lower than the minimum daily rate ({}%/day)",
                margin.high_hold_daily_rate, margin.min_daily_rate
            ));
        }

        if cascade.min_daily_rate <= suspicious_floor {
            warnings.push(format!(
                "{wallet}: cascade_bot minimum daily lend rate is low ({}%)",
                cascade.min_daily_rate
            ));
        }

        warnings
    }
}

impl Default for BitfinexConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            active_wallet: default_active_wallet(),
            max_active_amount: default_max_active_amount(),
            min_loan_usd: default_min_loan_usd(),
        }
    }
}

impl Default for DepthSplitConfig {
    fn default() -> Self {
        Self {
            min_daily_rate: default_min_daily_rate(),
            split_count: default_split_count(),
            gap_bottom: Decimal::ZERO,
            gap_top: Decimal::ZERO,
            thirty_day_threshold: Decimal::ZERO,
            high_hold_daily_rate: Decimal::ZERO,
            high_hold_amount: Decimal::ZERO,
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            start_daily_rate_over_frr: default_start_rate_over_frr(),
            min_daily_rate: default_min_daily_rate(),
            reduction_interval_minutes: default_reduction_interval_minutes(),
            reduce_daily_rate_step: default_reduce_daily_rate_step(),
            decay_multiplier: default_decay_multiplier(),
            offer_period_days: default_offer_period_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_account() -> Config {
        Config {
            accounts: vec![AccountConfig::default()],
        }
    }

    #[test]
    fn test_default_account_is_valid() {
        let config = one_account();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_accounts_rejected() {
        let config = Config {
            accounts: Vec::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_gap_rejected() {
        let mut config = one_account();
        config.accounts[0].strategy.margin_bot.gap_bottom = dec!(10);
        config.accounts[0].strategy.margin_bot.gap_top = dec!(5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decay_multiplier_bounds() {
        let mut config = one_account();
        config.accounts[0].strategy.cascade_bot.decay_multiplier = Decimal::ZERO;
        assert!(config.validate().is_err());

        config.accounts[0].strategy.cascade_bot.decay_multiplier = dec!(1.5);
        assert!(config.validate().is_err());

        config.accounts[0].strategy.cascade_bot.decay_multiplier = Decimal::ONE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_low_min_rate_warns_but_validates() {
        let mut config = one_account();
        config.accounts[0].strategy.margin_bot.min_daily_rate = dec!(0.001);
        assert!(config.validate().is_ok());
        assert!(config
            .warnings()
            .iter()
            .any(|w| w.contains("minimum daily lend rate is low")));
    }

    #[test]
    fn test_high_hold_below_floor_warns() {
        let mut config = one_account();
        config.accounts[0].strategy.margin_bot.high_hold_daily_rate = dec!(0.005);
        config.accounts[0].strategy.margin_bot.min_daily_rate = dec!(0.01);
        let warnings = config.warnings();
        assert!(warnings.iter().any(|w| w.contains("high-hold")));
    }
}
