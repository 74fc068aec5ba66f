//! CSV file data adapter.
//!
//! Expected layouts (header row required, columns by position):
//!
//! - trading days: `date`
//! - index prices: `date,open,high,low,close`
//! - stock prices: `date,ticker,open,high,low,close`
//! - events: `date,ticker`
//! - signals: `ticker,buy_date,sell_date,buy_price,sell_price,buy_type,sell_type`

use crate::domain::config::{DataConfig, SignalKey};
use crate::domain::error::WealthError;
use crate::domain::price::{DailyBar, IndexSeries, PriceField, StockPrices};
use crate::domain::signal::TradeSignal;
use crate::domain::signal_generator::AnnouncementEvent;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    config: DataConfig,
}

impl CsvAdapter {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }
}

fn read_records(path: &Path) -> Result<Vec<csv::StringRecord>, WealthError> {
    let content = fs::read_to_string(path).map_err(|e| WealthError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.records()
        .map(|result| {
            result.map_err(|e| WealthError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })
        })
        .collect()
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, WealthError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| WealthError::Data {
            reason: format!("missing {} column", name),
        })
}

pub(crate) fn parse_date(value: &str, name: &str) -> Result<NaiveDate, WealthError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| WealthError::Data {
        reason: format!("invalid {} '{}': {}", name, value, e),
    })
}

pub(crate) fn parse_f64(value: &str, name: &str) -> Result<f64, WealthError> {
    value.parse().map_err(|e| WealthError::Data {
        reason: format!("invalid {} value '{}': {}", name, value, e),
    })
}

fn optional<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> Result<T, WealthError>,
) -> Result<Option<T>, WealthError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

fn parse_price_field(value: &str, name: &str) -> Result<PriceField, WealthError> {
    value.parse().map_err(|e: String| WealthError::Data {
        reason: format!("invalid {}: {}", name, e),
    })
}

fn parse_bar(record: &csv::StringRecord, first: usize) -> Result<DailyBar, WealthError> {
    Ok(DailyBar {
        open: parse_f64(field(record, first, "open")?, "open")?,
        high: parse_f64(field(record, first + 1, "high")?, "high")?,
        low: parse_f64(field(record, first + 2, "low")?, "low")?,
        close: parse_f64(field(record, first + 3, "close")?, "close")?,
    })
}

pub(crate) fn parse_signal(record: &csv::StringRecord) -> Result<TradeSignal, WealthError> {
    let buy_type = optional(record.get(5), |v| parse_price_field(v, "buy_type"))?
        .unwrap_or(PriceField::Open);

    Ok(TradeSignal {
        ticker: field(record, 0, "ticker")?.to_string(),
        buy_date: optional(record.get(1), |v| parse_date(v, "buy_date"))?,
        sell_date: optional(record.get(2), |v| parse_date(v, "sell_date"))?,
        buy_price: optional(record.get(3), |v| parse_f64(v, "buy_price"))?,
        sell_price: optional(record.get(4), |v| parse_f64(v, "sell_price"))?,
        buy_type,
        sell_type: optional(record.get(6), |v| parse_price_field(v, "sell_type"))?,
    })
}

impl DataPort for CsvAdapter {
    fn trading_days(&self) -> Result<Vec<NaiveDate>, WealthError> {
        let path = &self.config.trading_days;
        let mut days = read_records(path)?
            .iter()
            .map(|record| parse_date(field(record, 0, "date")?, "date"))
            .collect::<Result<Vec<_>, _>>()?;
        days.sort_unstable();
        days.dedup();
        info!(path = %path.display(), days = days.len(), "loaded trading days");
        Ok(days)
    }

    fn index_prices(&self) -> Result<IndexSeries, WealthError> {
        let path = &self.config.index_prices;
        let index = read_records(path)?
            .iter()
            .map(|record| -> Result<(NaiveDate, DailyBar), WealthError> {
                Ok((parse_date(field(record, 0, "date")?, "date")?, parse_bar(record, 1)?))
            })
            .collect::<Result<IndexSeries, _>>()?;
        info!(path = %path.display(), bars = index.len(), "loaded index prices");
        Ok(index)
    }

    fn stock_prices(&self) -> Result<StockPrices, WealthError> {
        let path = &self.config.stock_prices;
        let mut prices = StockPrices::new();
        for record in read_records(path)? {
            let date = parse_date(field(&record, 0, "date")?, "date")?;
            let ticker = field(&record, 1, "ticker")?;
            prices.insert(ticker, date, parse_bar(&record, 2)?);
        }
        info!(
            path = %path.display(),
            tickers = prices.ticker_count(),
            bars = prices.bar_count(),
            "loaded stock prices"
        );
        Ok(prices)
    }

    fn events(&self) -> Result<Vec<AnnouncementEvent>, WealthError> {
        let path = self.config.events.as_ref().ok_or_else(|| WealthError::ConfigMissing {
            section: "data".into(),
            key: "events".into(),
        })?;
        let events = read_records(path)?
            .iter()
            .map(|record| -> Result<AnnouncementEvent, WealthError> {
                Ok(AnnouncementEvent {
                    date: parse_date(field(record, 0, "date")?, "date")?,
                    ticker: field(record, 1, "ticker")?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if events.is_empty() {
            warn!(path = %path.display(), "event table is empty");
        }
        Ok(events)
    }

    fn signals(&self, key: SignalKey) -> Result<Vec<TradeSignal>, WealthError> {
        let path = self.config.signals_dir.join(key.file_name());
        read_records(&path)?.iter().map(parse_signal).collect()
    }
}
