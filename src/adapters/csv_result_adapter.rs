//! CSV output adapter.
//!
//! Layout under the output directory:
//!
//! ```text
//! raw/{name}.csv       date,wealth
//! alpha/{name}.csv     date,wealth
//! ledger/{name}.csv    ticker,buy_date,sell_date,buy_price,sell_price,buy_type,sell_type,amount
//! review/{name}_alpha.csv, review/{name}_raw.csv, review/{name}_decisions.csv
//! ```
//!
//! Signal tables go to the signals directory as `hday{H}_sr{S}.csv`.

use crate::adapters::csv_adapter::{DATE_FORMAT, parse_date, parse_f64};
use crate::domain::config::SignalKey;
use crate::domain::error::WealthError;
use crate::domain::review::{ReviewConfig, ReviewOutcome, StrategySeries};
use crate::domain::series::{WealthPoint, WealthSeries};
use crate::domain::signal::TradeSignal;
use crate::domain::simulator::SimulationResult;
use crate::ports::result_port::ResultPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SIGNAL_HEADER: [&str; 7] = [
    "ticker",
    "buy_date",
    "sell_date",
    "buy_price",
    "sell_price",
    "buy_type",
    "sell_type",
];

pub struct CsvResultAdapter {
    output_dir: PathBuf,
    signals_dir: PathBuf,
}

fn csv_error(path: &Path, e: csv::Error) -> WealthError {
    WealthError::Data {
        reason: format!("CSV write error in {}: {}", path.display(), e),
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn fmt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn signal_row(signal: &TradeSignal) -> Vec<String> {
    vec![
        signal.ticker.clone(),
        fmt_date(signal.buy_date),
        fmt_date(signal.sell_date),
        fmt_num(signal.buy_price),
        fmt_num(signal.sell_price),
        signal.buy_type.to_string(),
        signal.sell_type.map(|t| t.to_string()).unwrap_or_default(),
    ]
}

fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<(), WealthError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(header).map_err(|e| csv_error(path, e))?;
    for row in rows {
        wtr.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    debug!(path = %path.display(), "wrote table");
    Ok(())
}

fn write_series(path: &Path, series: &WealthSeries) -> Result<(), WealthError> {
    write_rows(
        path,
        &["date", "wealth"],
        series
            .points()
            .iter()
            .map(|p| vec![p.date.format(DATE_FORMAT).to_string(), p.wealth.to_string()]),
    )
}

fn read_series(path: &Path) -> Result<WealthSeries, WealthError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| WealthError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    let mut points = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| WealthError::Data {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
        let (Some(date), Some(wealth)) = (record.get(0), record.get(1)) else {
            return Err(WealthError::data(format!(
                "{}: expected date,wealth columns",
                path.display()
            )));
        };
        points.push(WealthPoint {
            date: parse_date(date.trim(), "date")?,
            wealth: parse_f64(wealth.trim(), "wealth")?,
        });
    }
    Ok(WealthSeries::from_points(points))
}

impl CsvResultAdapter {
    pub fn new(output_dir: PathBuf, signals_dir: PathBuf) -> Self {
        Self {
            output_dir,
            signals_dir,
        }
    }

    fn table_path(&self, kind: &str, name: &str) -> PathBuf {
        self.output_dir.join(kind).join(format!("{}.csv", name))
    }
}

impl ResultPort for CsvResultAdapter {
    fn write_run(&self, result: &SimulationResult) -> Result<(), WealthError> {
        let name = result.name();
        write_series(&self.table_path("raw", &name), &result.raw)?;
        write_series(&self.table_path("alpha", &name), &result.alpha)?;

        let mut header = SIGNAL_HEADER.to_vec();
        header.push("amount");
        let rows = result.ledger.records().iter().map(|record| {
            let mut row = signal_row(&TradeSignal::from(record.trade.clone()));
            row.push(record.amount.to_string());
            row
        });
        write_rows(&self.table_path("ledger", &name), &header, rows)?;

        info!(
            run = %name,
            dir = %self.output_dir.display(),
            trades = result.ledger.len(),
            "wrote run outputs"
        );
        Ok(())
    }

    fn write_signals(&self, key: SignalKey, signals: &[TradeSignal]) -> Result<(), WealthError> {
        let path = self.signals_dir.join(key.file_name());
        write_rows(&path, &SIGNAL_HEADER, signals.iter().map(signal_row))?;
        info!(path = %path.display(), signals = signals.len(), "wrote signal table");
        Ok(())
    }

    fn write_review(
        &self,
        config: &ReviewConfig,
        outcome: &ReviewOutcome,
    ) -> Result<(), WealthError> {
        let name = config.series_name();
        write_series(
            &self.table_path("review", &format!("{}_alpha", name)),
            &outcome.alpha,
        )?;
        write_series(
            &self.table_path("review", &format!("{}_raw", name)),
            &outcome.raw,
        )?;
        write_rows(
            &self.table_path("review", &format!("{}_decisions", name)),
            &["window_start", "follow_from", "strategy"],
            outcome.decisions.iter().map(|d| {
                vec![
                    d.window_start.format(DATE_FORMAT).to_string(),
                    d.follow_from.format(DATE_FORMAT).to_string(),
                    d.strategy.clone(),
                ]
            }),
        )?;
        info!(review = %name, decisions = outcome.decisions.len(), "wrote review outputs");
        Ok(())
    }

    fn load_runs(&self) -> Result<Vec<StrategySeries>, WealthError> {
        let raw_dir = self.output_dir.join("raw");
        let entries = fs::read_dir(&raw_dir).map_err(|e| WealthError::Data {
            reason: format!("failed to read directory {}: {}", raw_dir.display(), e),
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();

        let mut runs = Vec::with_capacity(names.len());
        for name in names {
            let alpha_path = self.table_path("alpha", &name);
            if !alpha_path.exists() {
                debug!(run = %name, "no alpha series, skipping");
                continue;
            }
            runs.push(StrategySeries {
                raw: read_series(&self.table_path("raw", &name))?,
                alpha: read_series(&alpha_path)?,
                name,
            });
        }
        info!(runs = runs.len(), dir = %self.output_dir.display(), "loaded stored runs");
        Ok(runs)
    }
}
