//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_result_adapter::CsvResultAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{DataConfig, SignalKey, SimulationConfig, SweepGrid};
use crate::domain::config_validation::{
    check_simulation_config, check_sweep_grid, typed, typed_flag, typed_flag_list, typed_list,
    validate_config,
};
use crate::domain::error::WealthError;
use crate::domain::metrics::Metrics;
use crate::domain::review::{ReviewBase, ReviewConfig, ReviewMethod, ReviewOutcome, review_strategies};
use crate::domain::signal::SignalBook;
use crate::domain::signal_generator::{ExitRule, generate_signals};
use crate::domain::simulator::{SimulationResult, WealthSimulator};
use crate::domain::sweep::{SweepOutcome, run_sweep};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::result_port::ResultPort;

#[derive(Parser, Debug)]
#[command(
    name = "alphawealth",
    about = "Event-driven wealth backtester with index-hedged alpha series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one simulation and write its series and ledger
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        holding_days: Option<usize>,
        #[arg(long, allow_negative_numbers = true)]
        stop_loss: Option<f64>,
        #[arg(long)]
        portfolio_size: Option<usize>,
        #[arg(long)]
        rebalance: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every point of the [sweep] grid in parallel
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate signal tables from the announcement events
    Signals {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Select strategies over rolling windows from stored runs
    Review {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line overrides for a single simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOverrides {
    pub holding_days: Option<usize>,
    pub stop_loss: Option<f64>,
    pub portfolio_size: Option<usize>,
    pub rebalance: bool,
}

impl SimulationOverrides {
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(h) = self.holding_days {
            config.holding_days = h;
        }
        if let Some(s) = self.stop_loss {
            config.stop_loss = s;
        }
        if let Some(p) = self.portfolio_size {
            config.portfolio_size = p;
        }
        if self.rebalance {
            config.rebalance = true;
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            holding_days,
            stop_loss,
            portfolio_size,
            rebalance,
            output,
        } => {
            let overrides = SimulationOverrides {
                holding_days,
                stop_loss,
                portfolio_size,
                rebalance,
            };
            run_simulate(&config, &overrides, output.as_deref())
        }
        Command::Sweep { config, output } => run_sweep_command(&config, output.as_deref()),
        Command::Signals { config } => run_signals(&config),
        Command::Review { config, output } => run_review(&config, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(e: &WealthError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_config(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

fn required_path(config: &dyn ConfigPort, key: &str) -> Result<PathBuf, WealthError> {
    config
        .get_string("data", key)
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| WealthError::ConfigMissing {
            section: "data".into(),
            key: key.into(),
        })
}

pub fn build_data_config(config: &dyn ConfigPort) -> Result<DataConfig, WealthError> {
    Ok(DataConfig {
        trading_days: required_path(config, "trading_days")?,
        index_prices: required_path(config, "index_prices")?,
        stock_prices: required_path(config, "stock_prices")?,
        events: config
            .get_string("data", "events")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim())),
        signals_dir: required_path(config, "signals_dir")?,
        output_dir: required_path(config, "output_dir")?,
    })
}

pub fn build_simulation_config(config: &dyn ConfigPort) -> Result<SimulationConfig, WealthError> {
    let defaults = SimulationConfig::default();
    Ok(SimulationConfig {
        holding_days: typed(config, "simulation", "holding_days")?.unwrap_or(defaults.holding_days),
        stop_loss: typed(config, "simulation", "stop_loss")?.unwrap_or(defaults.stop_loss),
        portfolio_size: typed(config, "simulation", "portfolio_size")?
            .unwrap_or(defaults.portfolio_size),
        rebalance: typed_flag(config, "simulation", "rebalance")?.unwrap_or(defaults.rebalance),
        transaction_cost: typed(config, "simulation", "transaction_cost")?
            .unwrap_or(defaults.transaction_cost),
        initial_wealth: typed(config, "simulation", "initial_wealth")?
            .unwrap_or(defaults.initial_wealth),
        tag: config
            .get_string("simulation", "tag")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.tag),
    })
}

pub fn risk_free_rate(config: &dyn ConfigPort) -> Result<f64, WealthError> {
    Ok(typed(config, "simulation", "risk_free_rate")?.unwrap_or(0.0))
}

/// Grid from the `[sweep]` section; every missing list falls back to the
/// single value of `base`.
pub fn build_sweep_grid(
    config: &dyn ConfigPort,
    base: &SimulationConfig,
) -> Result<SweepGrid, WealthError> {
    let single = SweepGrid::single(base);
    let grid = SweepGrid {
        holding_days: typed_list(config, "sweep", "holding_days")?.unwrap_or(single.holding_days),
        stop_losses: typed_list(config, "sweep", "stop_loss")?.unwrap_or(single.stop_losses),
        portfolio_sizes: typed_list(config, "sweep", "portfolio_size")?
            .unwrap_or(single.portfolio_sizes),
        rebalance: typed_flag_list(config, "sweep", "rebalance")?.unwrap_or(single.rebalance),
    };
    check_sweep_grid(&grid, base)?;
    Ok(grid)
}

pub fn build_review_config(config: &dyn ConfigPort) -> Result<ReviewConfig, WealthError> {
    let defaults = ReviewConfig::default();
    let invalid = |key: &str, reason: String| WealthError::ConfigInvalid {
        section: "review".into(),
        key: key.into(),
        reason,
    };
    let base = match config.get_string("review", "base") {
        Some(s) => s.parse::<ReviewBase>().map_err(|r| invalid("base", r))?,
        None => defaults.base,
    };
    let method = match config.get_string("review", "method") {
        Some(s) => s.parse::<ReviewMethod>().map_err(|r| invalid("method", r))?,
        None => defaults.method,
    };
    Ok(ReviewConfig {
        base,
        method,
        review_months: typed(config, "review", "review")?.unwrap_or(defaults.review_months),
        forward_months: typed(config, "review", "forward")?.unwrap_or(defaults.forward_months),
        initial_wealth: typed(config, "simulation", "initial_wealth")?
            .unwrap_or(defaults.initial_wealth),
    })
}

pub fn run_simulation_pipeline(
    data: &dyn DataPort,
    results: &dyn ResultPort,
    config: &SimulationConfig,
) -> Result<SimulationResult, WealthError> {
    let market = data.market_data()?;
    let signals = data.signals(config.signal_key())?;
    let book = SignalBook::build(&signals)?;
    info!(
        run = %config.series_name(),
        scheduled = book.len(),
        skipped = book.skipped(),
        "loaded signals"
    );
    let result = WealthSimulator::new(config, &market).run(&book)?;
    results.write_run(&result)?;
    Ok(result)
}

pub fn run_sweep_pipeline(
    data: &dyn DataPort,
    results: &dyn ResultPort,
    grid: &SweepGrid,
    base: &SimulationConfig,
    risk_free_rate: f64,
) -> Result<Vec<SweepOutcome>, WealthError> {
    let market = data.market_data()?;
    let outcomes = run_sweep(grid, base, &market, risk_free_rate, |key| data.signals(key))?;
    for outcome in &outcomes {
        results.write_run(&outcome.result)?;
    }
    Ok(outcomes)
}

/// Generate and write one signal table per key. Returns the number of
/// tables written.
pub fn run_signals_pipeline(
    data: &dyn DataPort,
    results: &dyn ResultPort,
    keys: &[SignalKey],
) -> Result<usize, WealthError> {
    let market = data.market_data()?;
    let events = data.events()?;
    info!(events = events.len(), tables = keys.len(), "generating signals");
    for &key in keys {
        let rule = ExitRule::new(key.holding_days, key.stop_loss());
        let signals = generate_signals(&events, &rule, &market);
        results.write_signals(key, &signals)?;
    }
    Ok(keys.len())
}

pub fn run_review_pipeline(
    results: &dyn ResultPort,
    config: &ReviewConfig,
) -> Result<ReviewOutcome, WealthError> {
    let runs = results.load_runs()?;
    let outcome = review_strategies(&runs, config)?;
    results.write_review(config, &outcome)?;
    Ok(outcome)
}

fn print_metrics(label: &str, metrics: &Metrics) {
    eprintln!("\n=== {label} ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!(
        "Max Drawdown:     -{:.1}% over {} days",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
}

struct Setup {
    data: DataConfig,
    simulation: SimulationConfig,
    adapter: FileConfigAdapter,
}

fn setup(config_path: &Path, output: Option<&Path>) -> Result<Setup, ExitCode> {
    let adapter = load_config(config_path)?;
    let mut data = build_data_config(&adapter).map_err(|e| fail(&e))?;
    if let Some(dir) = output {
        data.output_dir = dir.to_path_buf();
    }
    let simulation = build_simulation_config(&adapter).map_err(|e| fail(&e))?;
    Ok(Setup {
        data,
        simulation,
        adapter,
    })
}

fn ports(data: &DataConfig) -> (CsvAdapter, CsvResultAdapter) {
    (
        CsvAdapter::new(data.clone()),
        CsvResultAdapter::new(data.output_dir.clone(), data.signals_dir.clone()),
    )
}

fn run_simulate(
    config_path: &Path,
    overrides: &SimulationOverrides,
    output: Option<&Path>,
) -> ExitCode {
    let Setup {
        data,
        mut simulation,
        adapter,
    } = match setup(config_path, output) {
        Ok(s) => s,
        Err(code) => return code,
    };
    overrides.apply(&mut simulation);
    if let Err(e) = check_simulation_config(&simulation) {
        return fail(&e);
    }
    let rf = match risk_free_rate(&adapter) {
        Ok(rf) => rf,
        Err(e) => return fail(&e),
    };

    eprintln!("Running {}", simulation.series_name());
    let (data_port, result_port) = ports(&data);
    let result = match run_simulation_pipeline(&data_port, &result_port, &simulation) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Trades: {}  Committed: {:.2}  Still open: {}",
        result.ledger.len(),
        result.ledger.total_committed(),
        result.open_positions
    );
    print_metrics("Raw", &Metrics::compute(&result.raw, rf));
    print_metrics("Alpha", &Metrics::compute(&result.alpha, rf));
    eprintln!("\nOutputs written to: {}", data.output_dir.display());
    ExitCode::SUCCESS
}

fn run_sweep_command(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let Setup {
        data,
        simulation,
        adapter,
    } = match setup(config_path, output) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let (grid, rf) = match build_sweep_grid(&adapter, &simulation)
        .and_then(|grid| Ok((grid, risk_free_rate(&adapter)?)))
    {
        Ok(v) => v,
        Err(e) => return fail(&e),
    };

    eprintln!("Sweeping {} configurations", grid.len());
    let (data_port, result_port) = ports(&data);
    let outcomes = match run_sweep_pipeline(&data_port, &result_port, &grid, &simulation, rf) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Sweep Results ===");
    for outcome in &outcomes {
        eprintln!(
            "  {:<40} raw {:>12.2}  alpha {:>12.2}  alpha sharpe {:>6.2}",
            outcome.result.name(),
            outcome.result.final_raw(),
            outcome.result.final_alpha(),
            outcome.alpha_metrics.sharpe_ratio,
        );
    }
    eprintln!("\nOutputs written to: {}", data.output_dir.display());
    ExitCode::SUCCESS
}

fn run_signals(config_path: &Path) -> ExitCode {
    let Setup {
        data,
        simulation,
        adapter,
    } = match setup(config_path, None) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let grid = match build_sweep_grid(&adapter, &simulation) {
        Ok(g) => g,
        Err(e) => return fail(&e),
    };

    let (data_port, result_port) = ports(&data);
    match run_signals_pipeline(&data_port, &result_port, &grid.signal_keys()) {
        Ok(count) => {
            eprintln!(
                "{} signal tables written to {}",
                count,
                data.signals_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_review(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let Setup { data, adapter, .. } = match setup(config_path, output) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let review = match build_review_config(&adapter) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let (_, result_port) = ports(&data);
    let outcome = match run_review_pipeline(&result_port, &review) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Review Decisions ({}) ===", review.series_name());
    for decision in &outcome.decisions {
        eprintln!(
            "  {} -> from {} follow {}",
            decision.window_start, decision.follow_from, decision.strategy
        );
    }
    print_metrics("Learning Alpha", &Metrics::compute(&outcome.alpha, 0.0));
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_config(config_path) {
        Ok(_) => {
            eprintln!("Configuration is valid.");
            ExitCode::SUCCESS
        }
        Err(code) => code,
    }
}
