//! Daily price tables for the benchmark index and individual stocks.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::error::WealthError;

/// Which price of a daily bar a trade executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            other => Err(format!("unknown price field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl DailyBar {
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }
}

fn usable(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Benchmark index bars keyed by date.
#[derive(Debug, Clone, Default)]
pub struct IndexSeries {
    bars: BTreeMap<NaiveDate, DailyBar>,
}

impl IndexSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, bar: DailyBar) {
        self.bars.insert(date, bar);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn price(&self, date: NaiveDate, field: PriceField) -> Option<f64> {
        self.bars.get(&date).map(|bar| bar.price(field))
    }

    /// The index price used as a ratio denominator or numerator; a missing,
    /// zero or non-finite value is a precondition violation.
    pub fn require(&self, date: NaiveDate, field: PriceField) -> Result<f64, WealthError> {
        self.price(date, field)
            .filter(|&p| usable(p))
            .ok_or(WealthError::MissingIndexPrice { date, field })
    }
}

impl FromIterator<(NaiveDate, DailyBar)> for IndexSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DailyBar)>>(iter: I) -> Self {
        Self {
            bars: iter.into_iter().collect(),
        }
    }
}

/// Sparse per-ticker daily bars. Tickers are kept as strings so leading
/// zeros in exchange codes survive.
#[derive(Debug, Clone, Default)]
pub struct StockPrices {
    by_ticker: HashMap<String, BTreeMap<NaiveDate, DailyBar>>,
}

impl StockPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: &str, date: NaiveDate, bar: DailyBar) {
        self.by_ticker
            .entry(ticker.to_string())
            .or_default()
            .insert(date, bar);
    }

    pub fn bar(&self, date: NaiveDate, ticker: &str) -> Option<&DailyBar> {
        self.by_ticker.get(ticker).and_then(|bars| bars.get(&date))
    }

    /// Close price, or `None` when the stock has no usable bar that day
    /// (suspension, missing row or a corrupt zero).
    pub fn close(&self, date: NaiveDate, ticker: &str) -> Option<f64> {
        self.bar(date, ticker).map(|b| b.close).filter(|&p| usable(p))
    }

    pub fn ticker_count(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn bar_count(&self) -> usize {
        self.by_ticker.values().map(BTreeMap::len).sum()
    }
}

/// Everything a run reads, loaded up front so the day loop never blocks.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    trading_days: Vec<NaiveDate>,
    pub index: IndexSeries,
    pub stocks: StockPrices,
}

impl MarketData {
    /// Trading days are sorted and deduplicated here.
    pub fn new(mut trading_days: Vec<NaiveDate>, index: IndexSeries, stocks: StockPrices) -> Self {
        trading_days.sort_unstable();
        trading_days.dedup();
        MarketData {
            trading_days,
            index,
            stocks,
        }
    }

    pub fn trading_days(&self) -> &[NaiveDate] {
        &self.trading_days
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.trading_days.binary_search(&date).is_ok()
    }

    pub fn last_trading_day(&self) -> Option<NaiveDate> {
        self.trading_days.last().copied()
    }
}
