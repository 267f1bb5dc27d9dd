//! One lending run per account: gather a snapshot, evaluate the configured
//! strategy, execute the resulting actions in order.
//!
//! The first transport failure aborts the remaining actions and surfaces;
//! actions already submitted stand, nothing is rolled back.

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::config::AccountConfig;
use crate::exchange::{ActiveOffer, LendingVenue};
use crate::strategy::{Action, BookLevel, OfferSnapshot, Snapshot, StrategyKind};
use crate::utils::annual_to_daily;

/// Run the configured strategy for one account.
///
/// With `dry_run` set, every decision is computed and logged but no mutating
/// endpoint is called.
pub async fn run_account<V>(venue: &V, account: &AccountConfig, dry_run: bool) -> Result<()>
where
    V: LendingVenue + ?Sized,
{
    let kind = StrategyKind::from_name(&account.strategy.active)?;
    let wallet = account.bitfinex.active_wallet.to_lowercase();

    info!("running {kind} for the {wallet} wallet");

    // Depth splitting starts from a clean book: everything still open gets
    // cancelled and the whole balance is re-offered from scratch.
    if kind == StrategyKind::DepthSplit {
        info!("cancelling all active {wallet} offers");
        if !dry_run {
            let offers = venue
                .active_offers()
                .await
                .context("Failed to list active offers")?;
            for offer in offers.iter().filter(|o| is_wallet_lend(o, &wallet)) {
                venue
                    .cancel_offer(offer.id)
                    .await
                    .context("Failed to cancel offer")?;
            }
        }
    }

    info!("getting current lendbook");
    let lendbook = venue
        .lendbook(&wallet)
        .await
        .context("Failed to get lendbook")?;

    info!("getting current wallet balance");
    let balances = venue.balances().await.context("Failed to get wallet funds")?;

    // The exchange minimum is quoted in USD; other wallets convert through
    // the ticker mid price.
    let mut min_loan = account.bitfinex.min_loan_usd;
    if wallet != "usd" {
        info!("getting current {wallet} ticker");
        let ticker = venue
            .ticker(&format!("{wallet}usd"))
            .await
            .context("Failed to get ticker")?;
        min_loan = account.bitfinex.min_loan_usd / ticker.mid;
    }

    let deposit = balances
        .iter()
        .find(|b| b.wallet_type == "deposit" && b.currency.to_lowercase() == wallet);
    let wallet_amount = deposit.map(|b| b.amount).unwrap_or(Decimal::ZERO);
    let mut available = deposit.map(|b| b.available).unwrap_or(Decimal::ZERO);

    if wallet_amount < min_loan {
        warn!(
            "wallet amount ({wallet_amount} {wallet}) is less than the allowed minimum ({min_loan} {wallet})"
        );
    }

    // Optional cap on how much capital the bot keeps deployed.
    let max_active = account.bitfinex.max_active_amount;
    if max_active >= Decimal::ZERO {
        available = match kind {
            // Leave room for what is already lent out of the wallet.
            StrategyKind::DepthSplit => {
                available.min((available + max_active - wallet_amount).min(max_active))
            }
            StrategyKind::Decay => available.min(max_active),
        };
    }

    let now = Utc::now();
    let active_offers: Vec<OfferSnapshot> = venue
        .active_offers()
        .await
        .context("Failed to list active offers")?
        .iter()
        .filter(|o| is_wallet_lend(o, &wallet))
        .map(|o| OfferSnapshot {
            id: o.id,
            amount: o.original_amount,
            remaining_amount: o.remaining_amount,
            rate: o.rate,
            period_days: o.period,
            created_at: o.created_at().unwrap_or(now),
        })
        .collect();

    let snapshot = Snapshot {
        available_funds: available,
        min_loan,
        asks: lendbook
            .asks
            .iter()
            .map(|entry| BookLevel {
                rate: entry.rate,
                amount: entry.amount,
                frr: entry.frr,
            })
            .collect(),
        active_offers,
        now,
    };

    if kind == StrategyKind::Decay {
        let start_rate =
            snapshot.daily_frr() + account.strategy.cascade_bot.start_daily_rate_over_frr;
        if start_rate >= dec!(0.5) {
            warn!("starting daily lend rate ({start_rate} %/day) is unusually high");
        }
    }

    let actions = kind.evaluate(&snapshot, &account.strategy);
    execute_actions(venue, &wallet, &actions, dry_run).await?;

    info!("run done");
    Ok(())
}

/// Submit actions in emission order, stopping at the first failure.
pub async fn execute_actions<V>(
    venue: &V,
    wallet: &str,
    actions: &[Action],
    dry_run: bool,
) -> Result<()>
where
    V: LendingVenue + ?Sized,
{
    for action in actions {
        match action {
            Action::Cancel { offer_id } => {
                info!("cancelling offer ID: {offer_id}");
                if !dry_run {
                    venue
                        .cancel_offer(*offer_id)
                        .await
                        .context("Failed to cancel offer")?;
                }
            }
            Action::Lend {
                amount,
                annual_rate,
                period_days,
            } => {
                info!(
                    "placing offer: {amount} {wallet} @ {} %/day for {period_days} days",
                    annual_to_daily(*annual_rate)
                );
                if !dry_run {
                    venue
                        .new_offer(wallet, *amount, *annual_rate, *period_days)
                        .await
                        .context("Failed to place new offer")?;
                }
            }
        }
    }

    Ok(())
}

fn is_wallet_lend(offer: &ActiveOffer, wallet: &str) -> bool {
    offer.currency.to_lowercase() == wallet && offer.direction == "lend"
}
