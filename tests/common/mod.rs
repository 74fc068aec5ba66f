#![allow(dead_code)]

use alphawealth::domain::config::SignalKey;
use alphawealth::domain::error::WealthError;
use alphawealth::domain::price::{DailyBar, IndexSeries, MarketData, PriceField, StockPrices};
use alphawealth::domain::review::{ReviewConfig, ReviewOutcome, StrategySeries};
use alphawealth::domain::signal::TradeSignal;
use alphawealth::domain::signal_generator::AnnouncementEvent;
use alphawealth::domain::simulator::SimulationResult;
use alphawealth::ports::data_port::DataPort;
use alphawealth::ports::result_port::ResultPort;
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub trading_days: Vec<NaiveDate>,
    pub index: IndexSeries,
    pub stocks: StockPrices,
    pub events: Vec<AnnouncementEvent>,
    pub signals: HashMap<SignalKey, Vec<TradeSignal>>,
    pub signal_loads: RefCell<Vec<SignalKey>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            trading_days: Vec::new(),
            index: IndexSeries::new(),
            stocks: StockPrices::new(),
            events: Vec::new(),
            signals: HashMap::new(),
            signal_loads: RefCell::new(Vec::new()),
        }
    }

    /// Trading days with a flat index at `index_level` on each of them.
    pub fn with_days(mut self, days: &[NaiveDate], index_level: f64) -> Self {
        for &d in days {
            self.trading_days.push(d);
            self.index.insert(d, flat_bar(index_level));
        }
        self
    }

    pub fn with_index(mut self, date: NaiveDate, bar: DailyBar) -> Self {
        self.index.insert(date, bar);
        self
    }

    pub fn with_stock(mut self, ticker: &str, date: NaiveDate, bar: DailyBar) -> Self {
        self.stocks.insert(ticker, date, bar);
        self
    }

    pub fn with_event(mut self, date: NaiveDate, ticker: &str) -> Self {
        self.events.push(AnnouncementEvent {
            date,
            ticker: ticker.to_string(),
        });
        self
    }

    pub fn with_signals(mut self, key: SignalKey, signals: Vec<TradeSignal>) -> Self {
        self.signals.insert(key, signals);
        self
    }
}

impl DataPort for MockDataPort {
    fn trading_days(&self) -> Result<Vec<NaiveDate>, WealthError> {
        Ok(self.trading_days.clone())
    }

    fn index_prices(&self) -> Result<IndexSeries, WealthError> {
        Ok(self.index.clone())
    }

    fn stock_prices(&self) -> Result<StockPrices, WealthError> {
        Ok(self.stocks.clone())
    }

    fn events(&self) -> Result<Vec<AnnouncementEvent>, WealthError> {
        Ok(self.events.clone())
    }

    fn signals(&self, key: SignalKey) -> Result<Vec<TradeSignal>, WealthError> {
        self.signal_loads.borrow_mut().push(key);
        self.signals
            .get(&key)
            .cloned()
            .ok_or_else(|| WealthError::data(format!("no signal table {}", key.file_name())))
    }
}

/// Records everything written to it; `runs` is what `load_runs` returns.
#[derive(Default)]
pub struct MockResultPort {
    pub written_runs: RefCell<Vec<SimulationResult>>,
    pub written_signals: RefCell<Vec<(SignalKey, Vec<TradeSignal>)>>,
    pub written_reviews: RefCell<Vec<(ReviewConfig, ReviewOutcome)>>,
    pub runs: Vec<StrategySeries>,
}

impl MockResultPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs(runs: Vec<StrategySeries>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }
}

impl ResultPort for MockResultPort {
    fn write_run(&self, result: &SimulationResult) -> Result<(), WealthError> {
        self.written_runs.borrow_mut().push(result.clone());
        Ok(())
    }

    fn write_signals(&self, key: SignalKey, signals: &[TradeSignal]) -> Result<(), WealthError> {
        self.written_signals
            .borrow_mut()
            .push((key, signals.to_vec()));
        Ok(())
    }

    fn write_review(
        &self,
        config: &ReviewConfig,
        outcome: &ReviewOutcome,
    ) -> Result<(), WealthError> {
        self.written_reviews
            .borrow_mut()
            .push((config.clone(), outcome.clone()));
        Ok(())
    }

    fn load_runs(&self) -> Result<Vec<StrategySeries>, WealthError> {
        Ok(self.runs.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn flat_bar(price: f64) -> DailyBar {
    DailyBar {
        open: price,
        high: price,
        low: price,
        close: price,
    }
}

pub fn bar(open: f64, high: f64, low: f64, close: f64) -> DailyBar {
    DailyBar {
        open,
        high,
        low,
        close,
    }
}

pub fn trade(
    ticker: &str,
    buy_date: NaiveDate,
    sell_date: NaiveDate,
    buy_price: f64,
    sell_price: f64,
) -> TradeSignal {
    TradeSignal {
        ticker: ticker.to_string(),
        buy_date: Some(buy_date),
        sell_date: Some(sell_date),
        buy_price: Some(buy_price),
        sell_price: Some(sell_price),
        buy_type: PriceField::Open,
        sell_type: Some(PriceField::Close),
    }
}

/// Consecutive weekdays starting at `start`.
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    use chrono::{Datelike, Weekday};
    start
        .iter_days()
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

pub fn market(port: &MockDataPort) -> MarketData {
    port.market_data().unwrap()
}
