//! Core domain types and logic.

pub mod capital_pool;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod position;
pub mod position_book;
pub mod price;
pub mod review;
pub mod series;
pub mod signal;
pub mod signal_generator;
pub mod simulator;
pub mod sweep;
