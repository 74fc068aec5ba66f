//! Output persistence port trait.

use crate::domain::config::SignalKey;
use crate::domain::error::WealthError;
use crate::domain::review::{ReviewConfig, ReviewOutcome, StrategySeries};
use crate::domain::signal::TradeSignal;
use crate::domain::simulator::SimulationResult;

/// Port for writing run outputs and reading stored runs back.
pub trait ResultPort {
    /// Raw series, alpha series and ledger of one run, named after its
    /// configuration.
    fn write_run(&self, result: &SimulationResult) -> Result<(), WealthError>;

    fn write_signals(&self, key: SignalKey, signals: &[TradeSignal]) -> Result<(), WealthError>;

    fn write_review(
        &self,
        config: &ReviewConfig,
        outcome: &ReviewOutcome,
    ) -> Result<(), WealthError>;

    /// Every stored run that has both a raw and an alpha series, sorted by
    /// name.
    fn load_runs(&self) -> Result<Vec<StrategySeries>, WealthError>;
}
