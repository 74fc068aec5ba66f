//! Configuration validation.
//!
//! Validates all config fields before any table is loaded, and provides
//! the typed lookups the CLI uses to build its configuration structs.

use crate::domain::config::{SimulationConfig, SweepGrid};
use crate::domain::error::WealthError;
use crate::domain::review::{ReviewBase, ReviewMethod};
use crate::ports::config_port::ConfigPort;
use std::collections::HashSet;
use std::str::FromStr;

pub const DATA_KEYS: [&str; 5] = [
    "trading_days",
    "index_prices",
    "stock_prices",
    "signals_dir",
    "output_dir",
];

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> WealthError {
    WealthError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse a boolean flag the way the INI adapter does.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Typed value of `[section] key`; `Ok(None)` when absent, `Err` when the
/// value does not parse.
pub fn typed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, WealthError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim()))),
    }
}

pub fn typed_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<bool>, WealthError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => parse_flag(&raw)
            .map(Some)
            .ok_or_else(|| invalid(section, key, format!("'{}' is not a boolean", raw.trim()))),
    }
}

/// Typed comma-separated list; `Ok(None)` when absent.
pub fn typed_list<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<T>>, WealthError> {
    let Some(items) = config.get_list(section, key) else {
        return Ok(None);
    };
    if items.is_empty() {
        return Err(invalid(section, key, "list is empty"));
    }
    items
        .iter()
        .map(|item| {
            item.parse()
                .map_err(|_| invalid(section, key, format!("cannot parse list item '{}'", item)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn typed_flag_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<bool>>, WealthError> {
    let Some(items) = config.get_list(section, key) else {
        return Ok(None);
    };
    if items.is_empty() {
        return Err(invalid(section, key, "list is empty"));
    }
    items
        .iter()
        .map(|item| {
            parse_flag(item)
                .ok_or_else(|| invalid(section, key, format!("'{}' is not a boolean", item)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), WealthError> {
    validate_data_config(config)?;
    validate_simulation_config(config)?;
    validate_sweep_config(config)?;
    validate_review_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), WealthError> {
    for key in DATA_KEYS {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(WealthError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), WealthError> {
    if let Some(value) = typed::<i64>(config, "simulation", "holding_days")? {
        check_holding_days("simulation", value)?;
    }
    if let Some(value) = typed::<f64>(config, "simulation", "stop_loss")? {
        check_stop_loss("simulation", value)?;
    }
    if let Some(value) = typed::<i64>(config, "simulation", "portfolio_size")? {
        check_portfolio_size("simulation", value)?;
    }
    typed_flag(config, "simulation", "rebalance")?;
    validate_transaction_cost(config)?;
    validate_initial_wealth(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

/// Checks a fully built simulation config, including command-line
/// overrides that never went through the INI file.
pub fn check_simulation_config(config: &SimulationConfig) -> Result<(), WealthError> {
    check_holding_days("simulation", config.holding_days as i64)?;
    check_stop_loss("simulation", config.stop_loss)?;
    check_portfolio_size("simulation", config.portfolio_size as i64)?;
    if !(0.0..1.0).contains(&config.transaction_cost) {
        return Err(invalid(
            "simulation",
            "transaction_cost",
            "transaction_cost must be in [0, 1)",
        ));
    }
    if !config.initial_wealth.is_finite() || config.initial_wealth <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_wealth",
            "initial_wealth must be positive",
        ));
    }
    Ok(())
}

fn check_holding_days(section: &str, value: i64) -> Result<(), WealthError> {
    if value < 1 {
        return Err(invalid(section, "holding_days", "holding_days must be at least 1"));
    }
    Ok(())
}

/// Stop losses are whole percentages: signal tables and output names
/// encode them in percentage points.
fn check_stop_loss(section: &str, value: f64) -> Result<(), WealthError> {
    if !value.is_finite() || value > 0.0 {
        return Err(invalid(
            section,
            "stop_loss",
            "stop_loss must be zero or a negative fraction",
        ));
    }
    let points = value * 100.0;
    if (points - points.round()).abs() > 1e-9 {
        return Err(invalid(
            section,
            "stop_loss",
            format!("stop_loss {} is not a whole percentage", value),
        ));
    }
    Ok(())
}

/// Every grid point must write to its own output files.
pub fn check_sweep_grid(grid: &SweepGrid, base: &SimulationConfig) -> Result<(), WealthError> {
    for &value in &grid.stop_losses {
        check_stop_loss("sweep", value)?;
    }
    let mut names = HashSet::new();
    for config in grid.expand(base) {
        let name = config.series_name();
        if !names.insert(name.clone()) {
            return Err(invalid(
                "sweep",
                "grid",
                format!("two grid points share the output name {}", name),
            ));
        }
    }
    Ok(())
}

fn check_portfolio_size(section: &str, value: i64) -> Result<(), WealthError> {
    if value < 1 {
        return Err(invalid(
            section,
            "portfolio_size",
            "portfolio_size must be at least 1",
        ));
    }
    Ok(())
}

fn validate_transaction_cost(config: &dyn ConfigPort) -> Result<(), WealthError> {
    if let Some(value) = typed::<f64>(config, "simulation", "transaction_cost")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "simulation",
                "transaction_cost",
                "transaction_cost must be in [0, 1)",
            ));
        }
    }
    Ok(())
}

fn validate_initial_wealth(config: &dyn ConfigPort) -> Result<(), WealthError> {
    if let Some(value) = typed::<f64>(config, "simulation", "initial_wealth")? {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(
                "simulation",
                "initial_wealth",
                "initial_wealth must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), WealthError> {
    if let Some(value) = typed::<f64>(config, "simulation", "risk_free_rate")? {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "simulation",
                "risk_free_rate",
                "risk_free_rate must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), WealthError> {
    for value in typed_list::<i64>(config, "sweep", "holding_days")?.unwrap_or_default() {
        check_holding_days("sweep", value)?;
    }
    for value in typed_list::<f64>(config, "sweep", "stop_loss")?.unwrap_or_default() {
        check_stop_loss("sweep", value)?;
    }
    for value in typed_list::<i64>(config, "sweep", "portfolio_size")?.unwrap_or_default() {
        check_portfolio_size("sweep", value)?;
    }
    typed_flag_list(config, "sweep", "rebalance")?;
    Ok(())
}

pub fn validate_review_config(config: &dyn ConfigPort) -> Result<(), WealthError> {
    if let Some(base) = config.get_string("review", "base") {
        base.parse::<ReviewBase>()
            .map_err(|reason| invalid("review", "base", reason))?;
    }
    if let Some(method) = config.get_string("review", "method") {
        method
            .parse::<ReviewMethod>()
            .map_err(|reason| invalid("review", "method", reason))?;
    }
    for key in ["review", "forward"] {
        if let Some(months) = typed::<i64>(config, "review", key)? {
            if months < 1 {
                return Err(invalid("review", key, format!("{} must be at least 1 month", key)));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[data]
trading_days = data/trading_days.csv
index_prices = data/index.csv
stock_prices = data/stocks.csv
events = data/events.csv
signals_dir = data/signals
output_dir = output

[simulation]
holding_days = 10
stop_loss = -0.10
portfolio_size = 10
rebalance = false
transaction_cost = 0.002
initial_wealth = 10000.0
risk_free_rate = 0.03

[sweep]
holding_days = 5,10
stop_loss = -0.05,-0.10
portfolio_size = 5,10
rebalance = false,true

[review]
base = alpha
review = 6
forward = 6
method = sharpe_ratio
"#;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn with_line(section: &str, line: &str) -> FileConfigAdapter {
        let header = format!("[{}]\n", section);
        make_config(&VALID.replacen(&header, &format!("{}{}\n", header, line), 1))
    }

    fn assert_invalid(result: Result<(), WealthError>, expected_key: &str) {
        match result {
            Err(WealthError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&make_config(VALID)).is_ok());
    }

    #[test]
    fn missing_data_key_fails() {
        let config = make_config(&VALID.replace("stock_prices = data/stocks.csv\n", ""));
        assert!(matches!(
            validate_data_config(&config),
            Err(WealthError::ConfigMissing { key, .. }) if key == "stock_prices"
        ));
    }

    #[test]
    fn events_path_is_optional() {
        let config = make_config(&VALID.replace("events = data/events.csv\n", ""));
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn portfolio_size_zero_fails() {
        let config = make_config(&VALID.replace("portfolio_size = 10", "portfolio_size = 0"));
        assert_invalid(validate_simulation_config(&config), "portfolio_size");
    }

    #[test]
    fn holding_days_zero_fails() {
        let config = make_config(&VALID.replace("holding_days = 10\n", "holding_days = 0\n"));
        assert_invalid(validate_simulation_config(&config), "holding_days");
    }

    #[test]
    fn positive_stop_loss_fails() {
        let config = make_config(&VALID.replace("stop_loss = -0.10\n", "stop_loss = 0.10\n"));
        assert_invalid(validate_simulation_config(&config), "stop_loss");
    }

    #[test]
    fn fractional_stop_loss_percentage_fails() {
        let config = make_config(&VALID.replace("stop_loss = -0.10\n", "stop_loss = -0.075\n"));
        assert_invalid(validate_simulation_config(&config), "stop_loss");

        let config = make_config(&VALID.replace("stop_loss = -0.05,-0.10", "stop_loss = -0.05,-0.101"));
        assert_invalid(validate_sweep_config(&config), "stop_loss");

        let overridden = SimulationConfig {
            stop_loss: -0.075,
            ..SimulationConfig::default()
        };
        assert_invalid(check_simulation_config(&overridden), "stop_loss");
    }

    #[test]
    fn grid_points_must_have_distinct_names() {
        let base = SimulationConfig::default();
        let grid = SweepGrid {
            holding_days: vec![5, 10],
            stop_losses: vec![-0.05, -0.10],
            portfolio_sizes: vec![5, 10],
            rebalance: vec![false, true],
        };
        assert!(check_sweep_grid(&grid, &base).is_ok());

        let repeated = SweepGrid {
            holding_days: vec![10, 10],
            ..grid.clone()
        };
        assert_invalid(check_sweep_grid(&repeated, &base), "grid");

        let same_percentage = SweepGrid {
            stop_losses: vec![-0.1, -0.10],
            ..grid
        };
        assert_invalid(check_sweep_grid(&same_percentage, &base), "grid");
    }

    #[test]
    fn transaction_cost_out_of_range_fails() {
        let config = make_config(&VALID.replace("transaction_cost = 0.002", "transaction_cost = 1.0"));
        assert_invalid(validate_simulation_config(&config), "transaction_cost");

        let config = make_config(&VALID.replace("transaction_cost = 0.002", "transaction_cost = -0.01"));
        assert_invalid(validate_simulation_config(&config), "transaction_cost");
    }

    #[test]
    fn non_numeric_value_fails() {
        let config = make_config(&VALID.replace("transaction_cost = 0.002", "transaction_cost = cheap"));
        assert_invalid(validate_simulation_config(&config), "transaction_cost");
    }

    #[test]
    fn initial_wealth_must_be_positive() {
        let config = make_config(&VALID.replace("initial_wealth = 10000.0", "initial_wealth = 0"));
        assert_invalid(validate_simulation_config(&config), "initial_wealth");
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = make_config(&VALID.replace("risk_free_rate = 0.03", "risk_free_rate = 1.5"));
        assert_invalid(validate_simulation_config(&config), "risk_free_rate");
    }

    #[test]
    fn bad_rebalance_flag_fails() {
        let config = make_config(&VALID.replace("rebalance = false\n", "rebalance = maybe\n"));
        assert_invalid(validate_simulation_config(&config), "rebalance");
    }

    #[test]
    fn sweep_list_with_bad_item_fails() {
        let config = make_config(&VALID.replace("holding_days = 5,10", "holding_days = 5,ten"));
        assert_invalid(validate_sweep_config(&config), "holding_days");

        let config = make_config(&VALID.replace("stop_loss = -0.05,-0.10", "stop_loss = -0.05,0.10"));
        assert_invalid(validate_sweep_config(&config), "stop_loss");

        let config = make_config(&VALID.replace("rebalance = false,true", "rebalance = false,sometimes"));
        assert_invalid(validate_sweep_config(&config), "rebalance");
    }

    #[test]
    fn sweep_section_is_optional() {
        let content = VALID.split("[sweep]").next().unwrap().to_string();
        assert!(validate_sweep_config(&make_config(&content)).is_ok());
    }

    #[test]
    fn unknown_review_method_fails() {
        let config = make_config(&VALID.replace("method = sharpe_ratio", "method = median"));
        assert_invalid(validate_review_config(&config), "method");
    }

    #[test]
    fn unknown_review_base_fails() {
        let config = make_config(&VALID.replace("base = alpha", "base = beta"));
        assert_invalid(validate_review_config(&config), "base");
    }

    #[test]
    fn review_window_must_be_positive() {
        let config = make_config(&VALID.replace("forward = 6", "forward = 0"));
        assert_invalid(validate_review_config(&config), "forward");
    }

    #[test]
    fn built_config_is_checked() {
        assert!(check_simulation_config(&SimulationConfig::default()).is_ok());

        let overridden = SimulationConfig {
            portfolio_size: 0,
            ..SimulationConfig::default()
        };
        assert_invalid(check_simulation_config(&overridden), "portfolio_size");

        let overridden = SimulationConfig {
            stop_loss: 0.05,
            ..SimulationConfig::default()
        };
        assert_invalid(check_simulation_config(&overridden), "stop_loss");
    }

    #[test]
    fn typed_lookups() {
        let config = with_line("simulation", "tag = ann");
        assert_eq!(typed::<String>(&config, "simulation", "tag").unwrap(), Some("ann".into()));
        assert_eq!(typed::<usize>(&config, "simulation", "missing").unwrap(), None);
        assert_eq!(
            typed_list::<usize>(&config, "sweep", "portfolio_size").unwrap(),
            Some(vec![5, 10])
        );
        assert_eq!(
            typed_flag_list(&config, "sweep", "rebalance").unwrap(),
            Some(vec![false, true])
        );
        assert_eq!(typed_flag(&config, "simulation", "rebalance").unwrap(), Some(false));
    }
}
