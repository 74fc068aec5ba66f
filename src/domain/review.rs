//! Rolling strategy selection.
//!
//! Every window looks back `review` months over a set of stored runs, picks
//! the run that scored best on the chosen statistic, and follows it for the
//! next `forward` months. Chaining the followed returns gives a "learning"
//! series that only ever uses information available at the time.

use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use super::config::DEFAULT_INITIAL_WEALTH;
use super::error::WealthError;
use super::metrics;
use super::series::{WealthPoint, WealthSeries};

/// Which series the review statistic is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewBase {
    Alpha,
    Raw,
}

impl FromStr for ReviewBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alpha" => Ok(ReviewBase::Alpha),
            "raw" => Ok(ReviewBase::Raw),
            other => Err(format!("unknown review base '{other}'")),
        }
    }
}

impl fmt::Display for ReviewBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewBase::Alpha => f.write_str("alpha"),
            ReviewBase::Raw => f.write_str("raw"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMethod {
    DailyReturn,
    SharpeRatio,
    AnnualizedReturn,
}

impl ReviewMethod {
    /// Score a window of daily returns; `None` when the window has nothing
    /// to score.
    pub fn score(&self, returns: &[f64]) -> Option<f64> {
        match self {
            ReviewMethod::DailyReturn => metrics::mean_return(returns),
            ReviewMethod::SharpeRatio => metrics::sharpe_ratio(returns),
            ReviewMethod::AnnualizedReturn => metrics::annualized_return(returns),
        }
    }
}

impl FromStr for ReviewMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily_return" => Ok(ReviewMethod::DailyReturn),
            "sharpe_ratio" => Ok(ReviewMethod::SharpeRatio),
            "annualized_return" => Ok(ReviewMethod::AnnualizedReturn),
            other => Err(format!("unknown review method '{other}'")),
        }
    }
}

impl fmt::Display for ReviewMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReviewMethod::DailyReturn => "daily_return",
            ReviewMethod::SharpeRatio => "sharpe_ratio",
            ReviewMethod::AnnualizedReturn => "annualized_return",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    pub base: ReviewBase,
    pub review_months: u32,
    pub forward_months: u32,
    pub method: ReviewMethod,
    pub initial_wealth: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            base: ReviewBase::Alpha,
            review_months: 6,
            forward_months: 6,
            method: ReviewMethod::DailyReturn,
            initial_wealth: DEFAULT_INITIAL_WEALTH,
        }
    }
}

impl ReviewConfig {
    pub fn series_name(&self) -> String {
        format!(
            "review_{}_{}_{}m_{}m",
            self.base, self.method, self.review_months, self.forward_months
        )
    }
}

/// The raw and alpha series of one stored run.
#[derive(Debug, Clone)]
pub struct StrategySeries {
    pub name: String,
    pub raw: WealthSeries,
    pub alpha: WealthSeries,
}

/// Daily returns of every strategy aligned on the union of their dates.
/// Undefined returns (first date, gaps) are NaN.
#[derive(Debug, Clone)]
pub struct ReturnsFrame {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    raw: Vec<Vec<f64>>,
    alpha: Vec<Vec<f64>>,
}

fn aligned_returns(series: &WealthSeries, dates: &[NaiveDate]) -> Vec<f64> {
    let mut out = Vec::with_capacity(dates.len());
    let mut previous: Option<f64> = None;
    for &date in dates {
        let current = series.get(date);
        let r = match (previous, current) {
            (Some(prev), Some(cur)) if prev != 0.0 => cur / prev - 1.0,
            _ => f64::NAN,
        };
        out.push(r);
        previous = current;
    }
    out
}

impl ReturnsFrame {
    pub fn new(strategies: &[StrategySeries]) -> Self {
        let dates: Vec<NaiveDate> = strategies
            .iter()
            .flat_map(|s| s.raw.dates().chain(s.alpha.dates()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        ReturnsFrame {
            names: strategies.iter().map(|s| s.name.clone()).collect(),
            raw: strategies
                .iter()
                .map(|s| aligned_returns(&s.raw, &dates))
                .collect(),
            alpha: strategies
                .iter()
                .map(|s| aligned_returns(&s.alpha, &dates))
                .collect(),
            dates,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn column(&self, base: ReviewBase, strategy: usize) -> &[f64] {
        match base {
            ReviewBase::Alpha => &self.alpha[strategy],
            ReviewBase::Raw => &self.raw[strategy],
        }
    }

    /// Index range of dates in `[from, to)`.
    fn span(&self, from: NaiveDate, to: NaiveDate) -> std::ops::Range<usize> {
        let lo = self.dates.partition_point(|&d| d < from);
        let hi = self.dates.partition_point(|&d| d < to);
        lo..hi.max(lo)
    }

    /// Best-scoring strategy over `[from, to)`. Ties keep the earlier name.
    fn best(
        &self,
        base: ReviewBase,
        method: ReviewMethod,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Option<usize> {
        let span = self.span(from, to);
        let mut best: Option<(usize, f64)> = None;
        for strategy in 0..self.names.len() {
            let Some(score) = method.score(&self.column(base, strategy)[span.clone()]) else {
                continue;
            };
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((strategy, score)),
            }
        }
        best.map(|(strategy, _)| strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    /// First day of the review window.
    pub window_start: NaiveDate,
    /// First day the choice is followed.
    pub follow_from: NaiveDate,
    pub strategy: String,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub alpha: WealthSeries,
    pub raw: WealthSeries,
    pub decisions: Vec<ReviewDecision>,
}

fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, WealthError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| WealthError::data(format!("date overflow adding {months} months to {date}")))
}

fn sub_months(date: NaiveDate, months: u32) -> Result<NaiveDate, WealthError> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| WealthError::data(format!("date overflow subtracting {months} months from {date}")))
}

fn compound(dates: &[NaiveDate], returns: &[f64], initial: f64) -> WealthSeries {
    let mut wealth = initial;
    let points = dates
        .iter()
        .zip(returns)
        .map(|(&date, &r)| {
            if r.is_finite() {
                wealth *= 1.0 + r;
            }
            WealthPoint { date, wealth }
        })
        .collect();
    WealthSeries::from_points(points)
}

pub fn review_strategies(
    strategies: &[StrategySeries],
    config: &ReviewConfig,
) -> Result<ReviewOutcome, WealthError> {
    if strategies.is_empty() {
        return Err(WealthError::data("no strategies to review"));
    }
    if config.review_months == 0 || config.forward_months == 0 {
        return Err(WealthError::data("review and forward windows must span at least one month"));
    }

    let frame = ReturnsFrame::new(strategies);
    let dates = frame.dates();
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return Ok(ReviewOutcome {
            alpha: WealthSeries::new(),
            raw: WealthSeries::new(),
            decisions: Vec::new(),
        });
    };

    let stop = last
        .succ_opt()
        .ok_or_else(|| WealthError::data(format!("date overflow after {last}")))?;
    let clamp = |d: NaiveDate| d.min(stop);

    let mut alpha = vec![f64::NAN; dates.len()];
    let mut raw = vec![f64::NAN; dates.len()];
    let mut decisions = Vec::new();

    let mut start = first.with_day0(0).unwrap_or(first);
    let mut middle = add_months(start, config.review_months)?;
    let mut end = clamp(add_months(start, config.review_months + config.forward_months)?);

    while middle < last {
        match frame.best(config.base, config.method, start, middle) {
            Some(chosen) => {
                let follow = frame.span(middle, end);
                alpha[follow.clone()].copy_from_slice(&frame.alpha[chosen][follow.clone()]);
                raw[follow.clone()].copy_from_slice(&frame.raw[chosen][follow]);
                info!(
                    window = %start,
                    follow_from = %middle,
                    strategy = %frame.names[chosen],
                    "review picked strategy"
                );
                decisions.push(ReviewDecision {
                    window_start: start,
                    follow_from: middle,
                    strategy: frame.names[chosen].clone(),
                });
            }
            None => warn!(window = %start, "no strategy could be scored, holding cash"),
        }

        middle = end;
        start = sub_months(middle, config.review_months)?;
        end = clamp(add_months(middle, config.forward_months)?);
    }

    Ok(ReviewOutcome {
        alpha: compound(dates, &alpha, config.initial_wealth),
        raw: compound(dates, &raw, config.initial_wealth),
        decisions,
    })
}
