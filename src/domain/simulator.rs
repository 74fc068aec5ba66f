//! Day-by-day wealth simulation.
//!
//! Each trading day runs three phases in a fixed order:
//!
//! 1. **Buy**: signals maturing today open positions while both capital pools
//!    have a free slot. A ticker already held is skipped. Once either pool is
//!    exhausted, the rest of the day's signals are dropped.
//! 2. **Sell**: positions scheduled for today are closed at their signal's
//!    sell price and proceeds return to the pools.
//! 3. **Valuation**: free cash plus the mark-to-market value of everything
//!    still open is recorded for both the raw and the index-hedged (alpha)
//!    portfolios.
//!
//! The transaction cost is charged once on the way in and once on the way
//! out. On the alpha leg the exit cost only scales the stock return, never
//! the index hedge.

use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info};

use super::capital_pool::CapitalPool;
use super::config::SimulationConfig;
use super::error::WealthError;
use super::ledger::TransactionLedger;
use super::position::OpenPosition;
use super::position_book::PositionBook;
use super::price::{MarketData, PriceField};
use super::series::WealthSeries;
use super::signal::{ScheduledTrade, SignalBook, TradeSignal};

/// Outcome of one run. Both series start with a seed point holding the
/// initial wealth, dated the day before the first trading day. An empty
/// calendar has no date to seed, so both series stay empty and
/// `final_raw`/`final_alpha` report the initial wealth.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub raw: WealthSeries,
    pub alpha: WealthSeries,
    pub ledger: TransactionLedger,
    /// Positions still held after the last trading day.
    pub open_positions: usize,
}

impl SimulationResult {
    pub fn name(&self) -> String {
        self.config.series_name()
    }

    pub fn final_raw(&self) -> f64 {
        self.raw
            .last()
            .map(|p| p.wealth)
            .unwrap_or(self.config.initial_wealth)
    }

    pub fn final_alpha(&self) -> f64 {
        self.alpha
            .last()
            .map(|p| p.wealth)
            .unwrap_or(self.config.initial_wealth)
    }
}

pub struct WealthSimulator<'a> {
    config: &'a SimulationConfig,
    market: &'a MarketData,
    raw_pool: CapitalPool,
    alpha_pool: CapitalPool,
    book: PositionBook,
    holdings: HashSet<String>,
    ledger: TransactionLedger,
    raw: WealthSeries,
    alpha: WealthSeries,
}

impl<'a> WealthSimulator<'a> {
    pub fn new(config: &'a SimulationConfig, market: &'a MarketData) -> Self {
        let days = market.trading_days().len() + 1;
        WealthSimulator {
            config,
            market,
            raw_pool: CapitalPool::new(config.portfolio_size, config.rebalance, config.initial_wealth),
            alpha_pool: CapitalPool::new(config.portfolio_size, config.rebalance, config.initial_wealth),
            book: PositionBook::new(),
            holdings: HashSet::new(),
            ledger: TransactionLedger::new(),
            raw: WealthSeries::with_capacity(days),
            alpha: WealthSeries::with_capacity(days),
        }
    }

    pub fn run(mut self, signals: &SignalBook) -> Result<SimulationResult, WealthError> {
        let name = self.config.series_name();
        let market = self.market;
        let trading_days = market.trading_days();
        info!(
            run = %name,
            days = trading_days.len(),
            signals = signals.len(),
            "starting simulation"
        );

        if let Some(seed) = trading_days.first().and_then(|d| d.pred_opt()) {
            self.raw.record(seed, self.raw_pool.total());
            self.alpha.record(seed, self.alpha_pool.total());
        }

        for &date in trading_days {
            self.buy(date, signals)?;
            self.sell(date)?;
            self.value(date)?;
        }

        let result = SimulationResult {
            config: self.config.clone(),
            raw: self.raw,
            alpha: self.alpha,
            ledger: self.ledger,
            open_positions: self.book.open_count(),
        };
        info!(
            run = %name,
            trades = result.ledger.len(),
            final_raw = result.final_raw(),
            final_alpha = result.final_alpha(),
            "simulation finished"
        );
        Ok(result)
    }

    fn has_capacity(&self) -> bool {
        self.raw_pool.has_capacity() && self.alpha_pool.has_capacity()
    }

    fn buy(&mut self, date: NaiveDate, signals: &SignalBook) -> Result<(), WealthError> {
        let cost = self.config.transaction_cost;
        for trade in signals.due_on(date) {
            if !self.has_capacity() {
                debug!(%date, "no free slot, dropping remaining signals");
                break;
            }
            if self.holdings.contains(&trade.ticker) {
                debug!(%date, ticker = %trade.ticker, "already held, skipping");
                continue;
            }
            self.check_sell_date(trade)?;
            let index_buy_price = self.market.index.require(date, trade.buy_type)?;

            let (Some(raw), Some(alpha)) =
                (self.raw_pool.withdraw_share(), self.alpha_pool.withdraw_share())
            else {
                break;
            };
            let raw_amount = raw * (1.0 - cost);
            let alpha_amount = alpha * (1.0 - cost);

            self.book.open(
                trade.sell_date,
                OpenPosition {
                    ticker: trade.ticker.clone(),
                    buy_price: trade.buy_price,
                    sell_price: trade.sell_price,
                    sell_type: trade.sell_type,
                    raw_amount,
                    alpha_amount,
                    index_buy_price,
                    last_price: trade.buy_price,
                },
            );
            self.holdings.insert(trade.ticker.clone());
            self.ledger.record(trade, raw_amount);
            debug!(%date, ticker = %trade.ticker, sell_date = %trade.sell_date, raw_amount, "bought");
        }
        Ok(())
    }

    /// A sell date inside the calendar must be a trading day, otherwise the
    /// position would never be closed. Dates past the end stay open and
    /// marked to market.
    fn check_sell_date(&self, trade: &ScheduledTrade) -> Result<(), WealthError> {
        let within = self
            .market
            .last_trading_day()
            .is_some_and(|last| trade.sell_date <= last);
        if within && !self.market.is_trading_day(trade.sell_date) {
            return Err(WealthError::SellDateOffCalendar {
                ticker: trade.ticker.clone(),
                sell_date: trade.sell_date,
            });
        }
        Ok(())
    }

    fn sell(&mut self, date: NaiveDate) -> Result<(), WealthError> {
        let cost = self.config.transaction_cost;
        for position in self.book.close(date) {
            let index_sell_price = self.market.index.require(date, position.sell_type)?;

            let raw = position.raw_proceeds(cost);
            let alpha = position.alpha_proceeds(cost, index_sell_price);
            self.raw_pool.deposit(raw);
            self.alpha_pool.deposit(alpha);
            self.holdings.remove(&position.ticker);
            debug!(%date, ticker = %position.ticker, raw, alpha, "sold");
        }
        Ok(())
    }

    fn value(&mut self, date: NaiveDate) -> Result<(), WealthError> {
        let mut raw = self.raw_pool.total();
        let mut alpha = self.alpha_pool.total();

        if !self.book.is_empty() {
            let index_close = self.market.index.require(date, PriceField::Close)?;
            let stocks = &self.market.stocks;
            let marked = self
                .book
                .mark_to_market(date, index_close, |ticker| stocks.close(date, ticker));
            raw += marked.raw;
            alpha += marked.alpha;
        }

        self.raw.record(date, raw);
        self.alpha.record(date, alpha);
        Ok(())
    }
}

/// Build the signal book and run one simulation.
pub fn simulate(
    config: &SimulationConfig,
    market: &MarketData,
    signals: &[TradeSignal],
) -> Result<SimulationResult, WealthError> {
    let book = SignalBook::build(signals)?;
    WealthSimulator::new(config, market).run(&book)
}
