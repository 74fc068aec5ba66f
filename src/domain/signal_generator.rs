//! Turns announcement events into trade signals.
//!
//! A stock is bought on the first trading day after its announcement and held
//! for a fixed number of trading days, unless a trailing stop fires first: on
//! any day whose open falls below the running high by more than the stop-loss
//! rate, the position is sold at that day's close.

use chrono::NaiveDate;
use rayon::prelude::*;

use super::price::{MarketData, PriceField, StockPrices};
use super::signal::TradeSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementEvent {
    pub date: NaiveDate,
    pub ticker: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRule {
    pub holding_days: usize,
    /// Negative fraction: -0.10 sells once the open is 10% under the high.
    pub stop_loss: f64,
    pub buy_type: PriceField,
    pub sell_type: PriceField,
    /// Used when the scheduled sell day had no bar and the sale slips to
    /// the next day with one.
    pub fallback_sell_type: PriceField,
}

impl ExitRule {
    pub fn new(holding_days: usize, stop_loss: f64) -> Self {
        ExitRule {
            holding_days,
            stop_loss,
            buy_type: PriceField::Open,
            sell_type: PriceField::Close,
            fallback_sell_type: PriceField::Open,
        }
    }
}

/// Work out the round trip for one event. Returns a no-trade signal when
/// the calendar runs out or the stock never trades on the buy day.
pub fn trade_info(
    event: &AnnouncementEvent,
    rule: &ExitRule,
    trading_days: &[NaiveDate],
    stocks: &StockPrices,
) -> TradeSignal {
    let no_trade = TradeSignal::no_trade(&event.ticker, rule.buy_type);

    let start = trading_days.partition_point(|&d| d <= event.date);
    let candidates = &trading_days[start..];
    if rule.holding_days == 0 || candidates.len() < rule.holding_days {
        return no_trade;
    }

    let buy_date = candidates[0];
    let Some(buy_bar) = stocks.bar(buy_date, &event.ticker) else {
        return no_trade;
    };
    let buy_price = buy_bar.price(rule.buy_type);
    let scheduled = candidates[rule.holding_days - 1];
    let mut highest = buy_bar.high;

    for &day in &candidates[1..] {
        let Some(bar) = stocks.bar(day, &event.ticker) else {
            continue;
        };
        let rate = bar.open / highest - 1.0;

        let sell_type = if day > scheduled {
            Some(rule.fallback_sell_type)
        } else if day == scheduled || rate < rule.stop_loss {
            Some(rule.sell_type)
        } else {
            None
        };

        if let Some(sell_type) = sell_type {
            return TradeSignal {
                ticker: event.ticker.clone(),
                buy_date: Some(buy_date),
                sell_date: Some(day),
                buy_price: Some(buy_price),
                sell_price: Some(bar.price(sell_type)),
                buy_type: rule.buy_type,
                sell_type: Some(sell_type),
            };
        }
        highest = highest.max(bar.high);
    }

    no_trade
}

/// One signal per event, in event order.
pub fn generate_signals(
    events: &[AnnouncementEvent],
    rule: &ExitRule,
    market: &MarketData,
) -> Vec<TradeSignal> {
    events
        .par_iter()
        .map(|event| trade_info(event, rule, market.trading_days(), &market.stocks))
        .collect()
}
