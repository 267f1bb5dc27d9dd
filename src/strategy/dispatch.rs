//! Strategy selection and dispatch.

use std::fmt;

use thiserror::Error;

use crate::config::StrategyConfig;
use crate::strategy::{Action, DecayAllocator, DepthSplitAllocator, Snapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// The configured name matches no registered allocator. Fatal: surfaced
    /// before any snapshot is fetched, so nothing was executed.
    #[error("unknown strategy \"{0}\"")]
    UnknownStrategy(String),
}

/// The closed set of allocators the bot can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Order-book depth splitting ("MarginBot").
    DepthSplit,
    /// Age-triggered rate decay ("CascadeBot").
    Decay,
}

/// Registered strategy names, matched case-insensitively.
const REGISTRY: &[(&str, StrategyKind)] = &[
    ("marginbot", StrategyKind::DepthSplit),
    ("cascadebot", StrategyKind::Decay),
];

impl StrategyKind {
    pub fn from_name(name: &str) -> Result<Self, StrategyError> {
        let lowered = name.to_lowercase();
        REGISTRY
            .iter()
            .find(|(key, _)| *key == lowered)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))
    }

    /// Run the selected allocator over one immutable snapshot.
    pub fn evaluate(self, snapshot: &Snapshot, config: &StrategyConfig) -> Vec<Action> {
        match self {
            StrategyKind::DepthSplit => DepthSplitAllocator::new(config.margin_bot.clone())
                .allocate(snapshot.available_funds, snapshot.min_loan, &snapshot.asks),
            StrategyKind::Decay => DecayAllocator::new(config.cascade_bot.clone()).allocate(
                snapshot.available_funds,
                snapshot.min_loan,
                snapshot.daily_frr(),
                &snapshot.active_offers,
                snapshot.now,
            ),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::DepthSplit => write!(f, "MarginBot"),
            StrategyKind::Decay => write!(f, "CascadeBot"),
        }
    }
}

/// Select a strategy by its configured name and evaluate it.
pub fn evaluate(
    name: &str,
    snapshot: &Snapshot,
    config: &StrategyConfig,
) -> Result<Vec<Action>, StrategyError> {
    Ok(StrategyKind::from_name(name)?.evaluate(snapshot, config))
}
