//! Open positions indexed by scheduled sell date.
//!
//! Positions live in an arena addressed by [`PositionId`]; the date index only
//! holds ids, so closing a date is a single pop of its id list.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use super::position::OpenPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionId(usize);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Valuation {
    pub raw: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    arena: Vec<Option<OpenPosition>>,
    free: Vec<usize>,
    by_sell_date: BTreeMap<NaiveDate, Vec<PositionId>>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, sell_date: NaiveDate, position: OpenPosition) -> PositionId {
        let id = match self.free.pop() {
            Some(slot) => {
                self.arena[slot] = Some(position);
                PositionId(slot)
            }
            None => {
                self.arena.push(Some(position));
                PositionId(self.arena.len() - 1)
            }
        };
        self.by_sell_date.entry(sell_date).or_default().push(id);
        id
    }

    /// Remove and return everything scheduled to sell on `date`.
    pub fn close(&mut self, date: NaiveDate) -> Vec<OpenPosition> {
        let Some(ids) = self.by_sell_date.remove(&date) else {
            return Vec::new();
        };
        ids.into_iter()
            .filter_map(|PositionId(slot)| {
                let position = self.arena[slot].take();
                if position.is_some() {
                    self.free.push(slot);
                }
                position
            })
            .collect()
    }

    /// Value every position still open after `date`. `close_price` returns
    /// today's close for a ticker; when it has none the position's last mark
    /// is reused.
    pub fn mark_to_market<F>(&mut self, date: NaiveDate, index_close: f64, close_price: F) -> Valuation
    where
        F: Fn(&str) -> Option<f64>,
    {
        let PositionBook {
            arena, by_sell_date, ..
        } = self;

        let mut valuation = Valuation::default();
        for ids in by_sell_date.range((Excluded(date), Unbounded)).map(|(_, ids)| ids) {
            for &PositionId(slot) in ids {
                let Some(position) = arena[slot].as_mut() else {
                    continue;
                };
                let today = close_price(&position.ticker);
                let price = position.remark(today);
                valuation.raw += position.raw_value(price);
                valuation.alpha += position.alpha_value(price, index_close);
            }
        }
        valuation
    }

    pub fn open_count(&self) -> usize {
        self.by_sell_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sell_date.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PriceField;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(book: &PositionBook, id: PositionId) -> Option<&OpenPosition> {
        book.arena.get(id.0).and_then(Option::as_ref)
    }

    fn position(ticker: &str, amount: f64) -> OpenPosition {
        OpenPosition {
            ticker: ticker.into(),
            buy_price: 10.0,
            sell_price: 11.0,
            sell_type: PriceField::Close,
            raw_amount: amount,
            alpha_amount: amount,
            index_buy_price: 3_000.0,
            last_price: 10.0,
        }
    }

    #[test]
    fn open_and_close_by_sell_date() {
        let mut book = PositionBook::new();
        book.open(date(2016, 1, 8), position("A", 100.0));
        book.open(date(2016, 1, 8), position("B", 200.0));
        book.open(date(2016, 1, 11), position("C", 300.0));

        assert_eq!(book.open_count(), 3);

        let closed = book.close(date(2016, 1, 8));
        let tickers: Vec<_> = closed.iter().map(|p| p.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["A", "B"]);
        assert_eq!(book.open_count(), 1);
        assert!(book.close(date(2016, 1, 8)).is_empty());
        assert!(book.close(date(2016, 1, 9)).is_empty());

        let closed = book.close(date(2016, 1, 11));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].ticker, "C");
        assert!(book.is_empty());
    }

    #[test]
    fn closed_slots_are_reused() {
        let mut book = PositionBook::new();
        let first = book.open(date(2016, 1, 5), position("A", 100.0));
        book.close(date(2016, 1, 5));
        let second = book.open(date(2016, 1, 6), position("B", 100.0));
        assert_eq!(first, second);
        assert_eq!(slot(&book, second).unwrap().ticker, "B");
    }

    #[test]
    fn mark_to_market_only_counts_later_sell_dates() {
        let mut book = PositionBook::new();
        book.open(date(2016, 1, 5), position("A", 100.0));
        book.open(date(2016, 1, 6), position("B", 100.0));

        let v = book.mark_to_market(date(2016, 1, 5), 3_000.0, |_| Some(12.0));
        assert_relative_eq!(v.raw, 120.0);
        assert_relative_eq!(v.alpha, 120.0);
    }

    #[test]
    fn mark_to_market_hedges_index() {
        let mut book = PositionBook::new();
        book.open(date(2016, 1, 8), position("A", 1_000.0));

        let v = book.mark_to_market(date(2016, 1, 5), 3_300.0, |_| Some(11.0));
        assert_relative_eq!(v.raw, 1_100.0);
        assert_relative_eq!(v.alpha, 1_000.0);
    }

    #[test]
    fn missing_price_carries_forward() {
        let mut book = PositionBook::new();
        book.open(date(2016, 1, 8), position("A", 1_000.0));

        book.mark_to_market(date(2016, 1, 4), 3_000.0, |_| Some(12.0));
        let v = book.mark_to_market(date(2016, 1, 5), 3_000.0, |_| None);
        assert_relative_eq!(v.raw, 1_200.0);
        assert!(v.alpha.is_finite());

        let v = book.mark_to_market(date(2016, 1, 6), 3_000.0, |_| Some(9.0));
        assert_relative_eq!(v.raw, 900.0);
    }

    #[test]
    fn never_priced_position_marks_at_buy_price() {
        let mut book = PositionBook::new();
        book.open(date(2016, 1, 8), position("A", 1_000.0));
        let v = book.mark_to_market(date(2016, 1, 4), 3_000.0, |_| None);
        assert_relative_eq!(v.raw, 1_000.0);
        assert_relative_eq!(v.alpha, 1_000.0);
    }
}
