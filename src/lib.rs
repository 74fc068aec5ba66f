//! alphawealth: event-driven wealth backtester for Chinese equities.
//!
//! Simulates raw and index-hedged ("alpha") wealth series from precomputed
//! trade signals. Hexagonal architecture: domain logic in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
