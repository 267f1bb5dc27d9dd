//! Rate-decay allocator ("CascadeBot").
//!
//! Ages out unfilled offers: anything older than the reduction interval is
//! cancelled and re-offered one decay step lower, and spare capital goes out
//! fresh at a premium over the floating reference rate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::DecayConfig;
use crate::strategy::{Action, OfferSnapshot};
use crate::utils::{annual_to_daily, daily_to_annual};

/// Fresh offers stay short so the decay cycle re-prices them quickly.
const FRESH_OFFER_PERIOD_DAYS: u32 = 2;

pub struct DecayAllocator {
    config: DecayConfig,
}

impl DecayAllocator {
    pub fn new(config: DecayConfig) -> Self {
        Self { config }
    }

    /// Decide cancellations and re-offers for one snapshot of active offers.
    ///
    /// `daily_frr` is the exchange's floating reference rate in percent per
    /// day; it anchors the rate of fresh offers.
    pub fn allocate(
        &self,
        available_funds: Decimal,
        min_loan: Decimal,
        daily_frr: Decimal,
        offers: &[OfferSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<Action> {
        let conf = &self.config;
        let mut actions = Vec::new();
        let mut spare = available_funds;

        for offer in offers {
            let age_minutes = (now - offer.created_at).num_minutes();
            if age_minutes < conf.reduction_interval_minutes {
                continue;
            }

            actions.push(Action::Cancel { offer_id: offer.id });

            if offer.remaining_amount >= min_loan {
                actions.push(Action::Lend {
                    amount: offer.remaining_amount,
                    annual_rate: daily_to_annual(self.decayed_daily_rate(offer.rate)),
                    // Keep the original period; only the price moves.
                    period_days: offer.period_days,
                });
            } else {
                // Too small to re-lend on its own; the balance returns to the
                // wallet and goes out again at the starting rate below.
                spare += offer.remaining_amount;
            }
        }

        if spare >= min_loan {
            actions.push(Action::Lend {
                amount: spare,
                annual_rate: daily_to_annual(daily_frr + conf.start_daily_rate_over_frr),
                period_days: FRESH_OFFER_PERIOD_DAYS,
            });
        }

        actions
    }

    /// One decay step: a linear reduction, then an exponential pull toward the
    /// floor, clamped so the floor is never crossed.
    ///
    /// The linear step keeps a burst of missed cycles from collapsing the rate
    /// straight to the floor; the exponential term closes in smoothly over
    /// repeated cycles.
    fn decayed_daily_rate(&self, annual_rate: Decimal) -> Decimal {
        let conf = &self.config;
        let mut daily = annual_to_daily(annual_rate);

        daily -= conf.reduce_daily_rate_step;
        daily = (daily - conf.min_daily_rate) * conf.decay_multiplier + conf.min_daily_rate;

        daily.max(conf.min_daily_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn conf() -> DecayConfig {
        DecayConfig {
            start_daily_rate_over_frr: dec!(0.02),
            min_daily_rate: dec!(0.05),
            reduction_interval_minutes: 30,
            reduce_daily_rate_step: dec!(0.01),
            decay_multiplier: dec!(0.9),
            offer_period_days: 2,
        }
    }

    fn offer(id: u64, daily_rate: Decimal, remaining: Decimal, age_minutes: i64, now: DateTime<Utc>) -> OfferSnapshot {
        OfferSnapshot {
            id,
            amount: remaining,
            remaining_amount: remaining,
            rate: daily_to_annual(daily_rate),
            period_days: 7,
            created_at: now - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_young_offer_left_alone() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());
        let offers = vec![offer(1, dec!(0.1), dec!(100), 29, now)];

        let actions = allocator.allocate(Decimal::ZERO, dec!(50), dec!(0.08), &offers, now);

        assert!(actions.is_empty());
    }

    #[test]
    fn test_aged_offer_cancelled_and_repriced() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());
        let offers = vec![offer(7, dec!(0.1), dec!(100), 30, now)];

        let actions = allocator.allocate(Decimal::ZERO, dec!(50), dec!(0.08), &offers, now);

        // 0.1 - 0.01 = 0.09, then (0.09 - 0.05) * 0.9 + 0.05 = 0.086
        assert_eq!(
            actions,
            vec![
                Action::Cancel { offer_id: 7 },
                Action::Lend {
                    amount: dec!(100),
                    annual_rate: dec!(0.086) * dec!(365),
                    period_days: 7,
                },
            ]
        );
    }

    #[test]
    fn test_decay_never_crosses_floor() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());
        // Already at the floor
        let offers = vec![offer(3, dec!(0.05), dec!(100), 60, now)];

        let actions = allocator.allocate(Decimal::ZERO, dec!(50), dec!(0.08), &offers, now);

        assert_eq!(
            actions[1],
            Action::Lend {
                amount: dec!(100),
                annual_rate: dec!(0.05) * dec!(365),
                period_days: 7,
            }
        );
    }

    #[test]
    fn test_decay_is_monotonic_toward_floor() {
        let allocator = DecayAllocator::new(conf());
        let floor = dec!(0.05);

        let mut daily = dec!(2);
        for _ in 0..50 {
            let next = allocator.decayed_daily_rate(daily_to_annual(daily));
            assert!(next >= floor);
            assert!(next <= daily);
            daily = next;
        }

        // After enough cycles the rate settles on the floor exactly
        assert_eq!(allocator.decayed_daily_rate(daily_to_annual(floor)), floor);
    }

    #[test]
    fn test_small_remainder_folds_into_fresh_offer() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());
        // Aged, but its remainder alone is below the exchange minimum
        let offers = vec![offer(9, dec!(0.1), dec!(10), 45, now)];

        let actions = allocator.allocate(dec!(45), dec!(50), dec!(0.08), &offers, now);

        // 0.08 FRR + 0.02 premium = 0.1 %/day for the combined 55
        assert_eq!(
            actions,
            vec![
                Action::Cancel { offer_id: 9 },
                Action::Lend {
                    amount: dec!(55),
                    annual_rate: dec!(0.1) * dec!(365),
                    period_days: 2,
                },
            ]
        );
    }

    #[test]
    fn test_spare_funds_below_minimum_stay_idle() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());

        let actions = allocator.allocate(dec!(49), dec!(50), dec!(0.08), &[], now);

        assert!(actions.is_empty());
    }

    #[test]
    fn test_mixed_offers_processed_in_order() {
        let now = Utc::now();
        let allocator = DecayAllocator::new(conf());
        let offers = vec![
            offer(1, dec!(0.2), dec!(100), 10, now), // young, untouched
            offer(2, dec!(0.2), dec!(100), 90, now), // aged, repriced
            offer(3, dec!(0.2), dec!(20), 90, now),  // aged, folded back
        ];

        let actions = allocator.allocate(dec!(40), dec!(50), dec!(0.08), &offers, now);

        // 0.2 - 0.01 = 0.19, (0.19 - 0.05) * 0.9 + 0.05 = 0.176
        assert_eq!(
            actions,
            vec![
                Action::Cancel { offer_id: 2 },
                Action::Lend {
                    amount: dec!(100),
                    annual_rate: dec!(0.176) * dec!(365),
                    period_days: 7,
                },
                Action::Cancel { offer_id: 3 },
                Action::Lend {
                    amount: dec!(60),
                    annual_rate: dec!(0.1) * dec!(365),
                    period_days: 2,
                },
            ]
        );
    }
}
