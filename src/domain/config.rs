//! Run parameters and parameter grids.

use std::path::PathBuf;

pub const DEFAULT_INITIAL_WEALTH: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub holding_days: usize,
    /// Trailing stop-loss threshold as a negative fraction, e.g. -0.10.
    pub stop_loss: f64,
    pub portfolio_size: usize,
    pub rebalance: bool,
    pub transaction_cost: f64,
    pub initial_wealth: f64,
    pub tag: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            holding_days: 10,
            stop_loss: -0.10,
            portfolio_size: 10,
            rebalance: false,
            transaction_cost: 0.002,
            initial_wealth: DEFAULT_INITIAL_WEALTH,
            tag: "event".to_string(),
        }
    }
}

/// Stop-loss rate as whole percentage points, e.g. -0.10 -> 10.
pub fn stop_loss_tag(stop_loss: f64) -> i64 {
    (stop_loss.abs() * 100.0).round() as i64
}

impl SimulationConfig {
    /// Output name: `{tag}_{P}p_{H}d_{C}cost_{S}sr`, cost in tenths of a
    /// percent, with `_reb` appended for rebalanced runs.
    pub fn series_name(&self) -> String {
        let cost_tag = (self.transaction_cost * 1000.0).round() as i64;
        let mut name = format!(
            "{}_{}p_{}d_{}cost_{}sr",
            self.tag,
            self.portfolio_size,
            self.holding_days,
            cost_tag,
            stop_loss_tag(self.stop_loss)
        );
        if self.rebalance {
            name.push_str("_reb");
        }
        name
    }

    pub fn signal_key(&self) -> SignalKey {
        SignalKey::new(self.holding_days, self.stop_loss)
    }
}

/// Identifies one signal table: signals only depend on holding days and
/// stop loss, not on how capital is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalKey {
    pub holding_days: usize,
    pub stop_loss_tag: i64,
}

impl SignalKey {
    pub fn new(holding_days: usize, stop_loss: f64) -> Self {
        SignalKey {
            holding_days,
            stop_loss_tag: stop_loss_tag(stop_loss),
        }
    }

    pub fn stop_loss(&self) -> f64 {
        -(self.stop_loss_tag as f64) / 100.0
    }

    pub fn file_name(&self) -> String {
        format!("hday{}_sr{}.csv", self.holding_days, self.stop_loss_tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub holding_days: Vec<usize>,
    pub stop_losses: Vec<f64>,
    pub portfolio_sizes: Vec<usize>,
    pub rebalance: Vec<bool>,
}

impl SweepGrid {
    /// A grid holding just the parameters of `base`.
    pub fn single(base: &SimulationConfig) -> Self {
        SweepGrid {
            holding_days: vec![base.holding_days],
            stop_losses: vec![base.stop_loss],
            portfolio_sizes: vec![base.portfolio_size],
            rebalance: vec![base.rebalance],
        }
    }

    pub fn len(&self) -> usize {
        self.holding_days.len()
            * self.stop_losses.len()
            * self.portfolio_sizes.len()
            * self.rebalance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every grid point, sharing cost, wealth and tag with `base`.
    pub fn expand(&self, base: &SimulationConfig) -> Vec<SimulationConfig> {
        let mut configs = Vec::with_capacity(self.len());
        for &holding_days in &self.holding_days {
            for &stop_loss in &self.stop_losses {
                for &portfolio_size in &self.portfolio_sizes {
                    for &rebalance in &self.rebalance {
                        configs.push(SimulationConfig {
                            holding_days,
                            stop_loss,
                            portfolio_size,
                            rebalance,
                            ..base.clone()
                        });
                    }
                }
            }
        }
        configs
    }

    /// Distinct signal tables the grid needs, in grid order.
    pub fn signal_keys(&self) -> Vec<SignalKey> {
        let mut keys = Vec::new();
        for &holding_days in &self.holding_days {
            for &stop_loss in &self.stop_losses {
                let key = SignalKey::new(holding_days, stop_loss);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

/// Locations of the input tables and the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub trading_days: PathBuf,
    pub index_prices: PathBuf,
    pub stock_prices: PathBuf,
    pub events: Option<PathBuf>,
    pub signals_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_name_encodes_parameters() {
        let config = SimulationConfig {
            holding_days: 20,
            stop_loss: -0.05,
            portfolio_size: 8,
            transaction_cost: 0.002,
            tag: "ann".into(),
            ..SimulationConfig::default()
        };
        assert_eq!(config.series_name(), "ann_8p_20d_2cost_5sr");

        let reb = SimulationConfig {
            rebalance: true,
            ..config
        };
        assert_eq!(reb.series_name(), "ann_8p_20d_2cost_5sr_reb");
    }

    #[test]
    fn signal_file_name_uses_percent_points() {
        assert_eq!(SignalKey::new(10, -0.1).file_name(), "hday10_sr10.csv");
        assert_eq!(SignalKey::new(5, -0.07).file_name(), "hday5_sr7.csv");
        assert!((SignalKey::new(5, -0.07).stop_loss() + 0.07).abs() < 1e-12);
    }

    #[test]
    fn grid_expands_cartesian_product() {
        let grid = SweepGrid {
            holding_days: vec![5, 10],
            stop_losses: vec![-0.05, -0.10],
            portfolio_sizes: vec![4],
            rebalance: vec![false, true],
        };
        let base = SimulationConfig::default();
        let configs = grid.expand(&base);

        assert_eq!(grid.len(), 8);
        assert_eq!(configs.len(), 8);
        assert_eq!(configs[0].holding_days, 5);
        assert!(!configs[0].rebalance);
        assert!(configs[1].rebalance);
        assert_eq!(configs[7].holding_days, 10);
        assert!(configs.iter().all(|c| c.portfolio_size == 4));
        assert!(configs.iter().all(|c| c.tag == base.tag));
    }

    #[test]
    fn grid_signal_keys_are_distinct() {
        let grid = SweepGrid {
            holding_days: vec![5, 10],
            stop_losses: vec![-0.05],
            portfolio_sizes: vec![4, 8],
            rebalance: vec![false, true],
        };
        assert_eq!(
            grid.signal_keys(),
            vec![SignalKey::new(5, -0.05), SignalKey::new(10, -0.05)]
        );
    }

    #[test]
    fn single_grid_matches_base() {
        let base = SimulationConfig::default();
        let configs = SweepGrid::single(&base).expand(&base);
        assert_eq!(configs, vec![base]);
    }
}
