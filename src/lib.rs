//! # Margin Lender
//!
//! Automated margin-lending offer management for Bitfinex funding wallets.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Bitfinex REST API client and wire types
//! - `strategy`: Pure allocation logic (depth splitting, rate decay, dispatch)
//! - `runner`: Snapshot gathering, input normalization, and action execution
//! - `utils`: Shared decimal and rate arithmetic

pub mod config;
pub mod exchange;
pub mod runner;
pub mod strategy;
pub mod utils;

pub use config::Config;
