//! Shared utilities.

mod decimal;

pub use decimal::{annual_to_daily, daily_to_annual, truncate_amount};
