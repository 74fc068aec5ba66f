//! Performance statistics over wealth series and return vectors.

use super::series::{WealthPoint, WealthSeries};

/// Trading days per year on the Shanghai and Shenzhen exchanges.
pub const TRADING_DAYS_PER_YEAR: f64 = 251.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
}

impl Metrics {
    pub fn compute(series: &WealthSeries, risk_free_rate: f64) -> Self {
        let points = series.points();
        let (initial, final_wealth) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.wealth, last.wealth),
            _ => (0.0, 0.0),
        };

        let total_return = if initial > 0.0 {
            (final_wealth - initial) / initial
        } else {
            0.0
        };

        let periods = points.len().saturating_sub(1) as f64;
        let years = periods / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(points);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(points, daily_rf);

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
        }
    }
}

fn compute_drawdown(points: &[WealthPoint]) -> (f64, i64) {
    let Some(first) = points.first() else {
        return (0.0, 0);
    };

    let mut peak = first.wealth;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in points {
        if point.wealth > peak {
            peak = point.wealth;
            current_dd_duration = 0;
        } else if peak > 0.0 && point.wealth < peak {
            let dd = (peak - point.wealth) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn wealth_returns(points: &[WealthPoint]) -> Vec<f64> {
    points
        .windows(2)
        .map(|w| {
            let prev = w[0].wealth;
            if prev > 0.0 {
                (w[1].wealth - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

fn compute_risk_adjusted(points: &[WealthPoint], daily_rf: f64) -> (f64, f64) {
    let returns = wealth_returns(points);
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let stddev = population_stddev(&returns, mean);
    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}

fn population_stddev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn defined(returns: &[f64]) -> Vec<f64> {
    returns.iter().copied().filter(|r| r.is_finite()).collect()
}

/// Mean of the defined returns, `None` when there are none.
pub fn mean_return(returns: &[f64]) -> Option<f64> {
    let values = defined(returns);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Annualized Sharpe ratio of daily returns with a zero risk-free rate.
/// Uses the sample standard deviation; `None` with fewer than two defined
/// returns or no variation.
pub fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    let values = defined(returns);
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    if stddev > 0.0 {
        Some(mean / stddev * TRADING_DAYS_PER_YEAR.sqrt())
    } else {
        None
    }
}

/// Compound daily returns into an annual rate.
pub fn annualized_return(returns: &[f64]) -> Option<f64> {
    let values = defined(returns);
    if values.is_empty() {
        return None;
    }
    let growth: f64 = values.iter().map(|r| 1.0 + r).product();
    if growth <= 0.0 {
        return Some(-1.0);
    }
    Some(growth.powf(TRADING_DAYS_PER_YEAR / values.len() as f64) - 1.0)
}
