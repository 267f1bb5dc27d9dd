//! Order-book depth-splitting allocator ("MarginBot").
//!
//! Spreads the available balance across a configurable number of price bands
//! read from cumulative book depth, optionally carving out a fixed high-hold
//! slice at a premium rate first.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::DepthSplitConfig;
use crate::strategy::{Action, BookLevel};
use crate::utils::{daily_to_annual, truncate_amount};

/// High-hold offers always run the longest period the exchange accepts.
const HIGH_HOLD_PERIOD_DAYS: u32 = 30;

pub struct DepthSplitAllocator {
    config: DepthSplitConfig,
}

impl DepthSplitAllocator {
    pub fn new(config: DepthSplitConfig) -> Self {
        Self { config }
    }

    /// Decide loan offers for the available balance against the current book.
    ///
    /// Balances below `min_loan` produce nothing. When funds cannot support
    /// the configured number of splits at the minimum loan size, the split
    /// count shrinks rather than emitting undersized offers.
    pub fn allocate(
        &self,
        available_funds: Decimal,
        min_loan: Decimal,
        asks: &[BookLevel],
    ) -> Vec<Action> {
        let conf = &self.config;
        let mut actions = Vec::new();

        if available_funds < min_loan {
            return actions;
        }

        let mut split_funds = available_funds;

        // A zero high-hold amount disables the carve-out entirely.
        if conf.high_hold_amount > min_loan {
            let amount = available_funds.min(conf.high_hold_amount);
            actions.push(Action::Lend {
                amount,
                annual_rate: daily_to_annual(conf.high_hold_daily_rate),
                period_days: HIGH_HOLD_PERIOD_DAYS,
            });
            split_funds -= amount;
        }

        let mut splits = conf.split_count;
        if splits == 0 || split_funds < min_loan {
            return actions;
        }

        let mut amount_each = truncate_amount(split_funds / Decimal::from(splits));

        // Fewer, larger slices when the per-split amount would be undersized.
        while amount_each <= min_loan {
            splits -= 1;
            if splits == 0 {
                return actions;
            }
            amount_each = truncate_amount(split_funds / Decimal::from(splits));
        }

        let climb = (conf.gap_top - conf.gap_bottom) / Decimal::from(splits);
        let rate_floor = daily_to_annual(conf.min_daily_rate);
        let mut next_depth = conf.gap_bottom;

        // Cumulative-volume pointer into the asks; it only ever moves forward,
        // so later bands start where the previous one stopped.
        let mut index = 0usize;
        let mut cumulative = asks.first().map(|level| level.amount).unwrap_or(Decimal::ZERO);

        for _ in 0..splits {
            while cumulative < next_depth && index + 1 < asks.len() {
                index += 1;
                cumulative += asks[index].amount;
            }

            if cumulative < next_depth {
                debug!(depth_target = %next_depth, "book exhausted, pricing from its last level");
            }

            // An empty book quotes nothing; the floor clamp below takes over.
            let quoted = asks.get(index).map(|level| level.rate).unwrap_or(Decimal::ZERO);

            let annual_rate = if quoted < rate_floor { rate_floor } else { quoted };

            // Lock in long periods only where the book itself quotes above the
            // threshold, not where our own floor pushed the rate there.
            let period_days = if conf.thirty_day_threshold > Decimal::ZERO
                && quoted >= daily_to_annual(conf.thirty_day_threshold)
            {
                30
            } else {
                2
            };

            actions.push(Action::Lend {
                amount: amount_each,
                annual_rate,
                period_days,
            });
            next_depth += climb;
        }

        actions
    }
}
