//! Parameter sweep: one simulation per grid point, run in parallel.

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::info;

use super::config::{SignalKey, SimulationConfig, SweepGrid};
use super::config_validation::check_sweep_grid;
use super::error::WealthError;
use super::metrics::Metrics;
use super::price::MarketData;
use super::signal::{SignalBook, TradeSignal};
use super::simulator::{SimulationResult, WealthSimulator};

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub result: SimulationResult,
    pub raw_metrics: Metrics,
    pub alpha_metrics: Metrics,
}

impl SweepOutcome {
    pub fn from_result(result: SimulationResult, risk_free_rate: f64) -> Self {
        let raw_metrics = Metrics::compute(&result.raw, risk_free_rate);
        let alpha_metrics = Metrics::compute(&result.alpha, risk_free_rate);
        SweepOutcome {
            result,
            raw_metrics,
            alpha_metrics,
        }
    }
}

/// Run every configuration of `grid`. `load_signals` is called once per
/// distinct signal table; outcomes come back in grid order and the first
/// failing run aborts the sweep. Grids whose points share an output name
/// are rejected before anything is loaded.
pub fn run_sweep<F>(
    grid: &SweepGrid,
    base: &SimulationConfig,
    market: &MarketData,
    risk_free_rate: f64,
    mut load_signals: F,
) -> Result<Vec<SweepOutcome>, WealthError>
where
    F: FnMut(SignalKey) -> Result<Vec<TradeSignal>, WealthError>,
{
    check_sweep_grid(grid, base)?;
    let mut books: HashMap<SignalKey, SignalBook> = HashMap::new();
    for key in grid.signal_keys() {
        let signals = load_signals(key)?;
        let book = SignalBook::build(&signals)?;
        info!(
            table = %key.file_name(),
            scheduled = book.len(),
            skipped = book.skipped(),
            "loaded signal table"
        );
        books.insert(key, book);
    }

    let configs = grid.expand(base);
    info!(runs = configs.len(), "starting sweep");

    configs
        .par_iter()
        .map(|config| {
            let book = books
                .get(&config.signal_key())
                .ok_or_else(|| WealthError::data(format!("no signals for {}", config.series_name())))?;
            let result = WealthSimulator::new(config, market).run(book)?;
            Ok(SweepOutcome::from_result(result, risk_free_rate))
        })
        .collect()
}
