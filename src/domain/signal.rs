//! Trade signals and the per-day feed the simulator consumes.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use super::error::WealthError;
use super::price::PriceField;

/// One row of a signal table. Fields other than the ticker may be absent:
/// the signal generator leaves them empty when an event produced no trade.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSignal {
    pub ticker: String,
    pub buy_date: Option<NaiveDate>,
    pub sell_date: Option<NaiveDate>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub buy_type: PriceField,
    pub sell_type: Option<PriceField>,
}

impl TradeSignal {
    /// A signal for an event that did not lead to a trade.
    pub fn no_trade(ticker: &str, buy_type: PriceField) -> Self {
        TradeSignal {
            ticker: ticker.to_string(),
            buy_date: None,
            sell_date: None,
            buy_price: None,
            sell_price: None,
            buy_type,
            sell_type: None,
        }
    }

    /// Resolve into a tradable row. `Ok(None)` for incomplete rows,
    /// `Err` for rows that are complete but contradictory.
    pub fn schedule(&self) -> Result<Option<ScheduledTrade>, WealthError> {
        let (Some(buy_date), Some(sell_date), Some(buy_price), Some(sell_price), Some(sell_type)) = (
            self.buy_date,
            self.sell_date,
            self.buy_price,
            self.sell_price,
            self.sell_type,
        ) else {
            return Ok(None);
        };
        if !buy_price.is_finite() || !sell_price.is_finite() {
            return Ok(None);
        }

        let invalid = |reason: String| WealthError::InvalidSignal {
            ticker: self.ticker.clone(),
            buy_date,
            reason,
        };
        if sell_date < buy_date {
            return Err(invalid(format!("sell date {sell_date} precedes buy date")));
        }
        if buy_price <= 0.0 {
            return Err(invalid(format!("buy price {buy_price} must be positive")));
        }
        if sell_price < 0.0 {
            return Err(invalid(format!("sell price {sell_price} is negative")));
        }

        Ok(Some(ScheduledTrade {
            ticker: self.ticker.clone(),
            buy_date,
            sell_date,
            buy_price,
            sell_price,
            buy_type: self.buy_type,
            sell_type,
        }))
    }
}

/// A fully specified round trip: buy on `buy_date`, sell on `sell_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTrade {
    pub ticker: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: f64,
    pub sell_price: f64,
    pub buy_type: PriceField,
    pub sell_type: PriceField,
}

impl From<ScheduledTrade> for TradeSignal {
    fn from(trade: ScheduledTrade) -> Self {
        TradeSignal {
            ticker: trade.ticker,
            buy_date: Some(trade.buy_date),
            sell_date: Some(trade.sell_date),
            buy_price: Some(trade.buy_price),
            sell_price: Some(trade.sell_price),
            buy_type: trade.buy_type,
            sell_type: Some(trade.sell_type),
        }
    }
}

/// Scheduled trades grouped by buy date, table order preserved within a day.
#[derive(Debug, Clone, Default)]
pub struct SignalBook {
    by_buy_date: BTreeMap<NaiveDate, Vec<ScheduledTrade>>,
    skipped: usize,
}

impl SignalBook {
    pub fn build(signals: &[TradeSignal]) -> Result<Self, WealthError> {
        let mut book = SignalBook::default();
        for signal in signals {
            match signal.schedule()? {
                Some(trade) => book.by_buy_date.entry(trade.buy_date).or_default().push(trade),
                None => {
                    debug!(ticker = %signal.ticker, "skipping signal without a trade");
                    book.skipped += 1;
                }
            }
        }
        Ok(book)
    }

    pub fn due_on(&self, date: NaiveDate) -> &[ScheduledTrade] {
        self.by_buy_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_buy_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_buy_date.is_empty()
    }

    /// Rows dropped because they carried no trade.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn signal(ticker: &str, buy: NaiveDate, sell: NaiveDate) -> TradeSignal {
        TradeSignal {
            ticker: ticker.into(),
            buy_date: Some(buy),
            sell_date: Some(sell),
            buy_price: Some(10.0),
            sell_price: Some(11.0),
            buy_type: PriceField::Open,
            sell_type: Some(PriceField::Close),
        }
    }

    #[test]
    fn complete_signal_schedules() {
        let trade = signal("000001", date(2016, 1, 4), date(2016, 1, 8))
            .schedule()
            .unwrap()
            .unwrap();
        assert_eq!(trade.ticker, "000001");
        assert_eq!(trade.sell_type, PriceField::Close);
        assert_eq!(trade.sell_date, date(2016, 1, 8));
    }

    #[test]
    fn incomplete_or_nan_signal_is_skipped() {
        assert!(TradeSignal::no_trade("000001", PriceField::Open)
            .schedule()
            .unwrap()
            .is_none());

        let mut s = signal("000001", date(2016, 1, 4), date(2016, 1, 8));
        s.sell_price = Some(f64::NAN);
        assert!(s.schedule().unwrap().is_none());
    }

    #[test]
    fn sell_before_buy_fails_fast() {
        let s = signal("000001", date(2016, 1, 8), date(2016, 1, 4));
        let err = s.schedule().unwrap_err();
        assert!(matches!(err, WealthError::InvalidSignal { ref ticker, .. } if ticker == "000001"));
    }

    #[test]
    fn zero_buy_price_fails_fast() {
        let mut s = signal("000001", date(2016, 1, 4), date(2016, 1, 8));
        s.buy_price = Some(0.0);
        assert!(s.schedule().is_err());
    }

    #[test]
    fn book_groups_by_buy_date_in_table_order() {
        let signals = vec![
            signal("B", date(2016, 1, 5), date(2016, 1, 8)),
            signal("A", date(2016, 1, 4), date(2016, 1, 8)),
            TradeSignal::no_trade("X", PriceField::Open),
            signal("C", date(2016, 1, 5), date(2016, 1, 7)),
        ];
        let book = SignalBook::build(&signals).unwrap();

        assert_eq!(book.len(), 3);
        assert_eq!(book.skipped(), 1);
        let tickers: Vec<_> = book
            .due_on(date(2016, 1, 5))
            .iter()
            .map(|t| t.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["B", "C"]);
        assert!(book.due_on(date(2016, 1, 6)).is_empty());
    }

    #[test]
    fn empty_table_builds_empty_book() {
        let book = SignalBook::build(&[]).unwrap();
        assert!(book.is_empty());
        assert_eq!(book.len(), 0);
    }
}
