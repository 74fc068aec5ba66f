//! Input table access port trait.

use crate::domain::config::SignalKey;
use crate::domain::error::WealthError;
use crate::domain::price::{IndexSeries, MarketData, StockPrices};
use crate::domain::signal::TradeSignal;
use crate::domain::signal_generator::AnnouncementEvent;
use chrono::NaiveDate;

pub trait DataPort {
    fn trading_days(&self) -> Result<Vec<NaiveDate>, WealthError>;

    fn index_prices(&self) -> Result<IndexSeries, WealthError>;

    fn stock_prices(&self) -> Result<StockPrices, WealthError>;

    fn events(&self) -> Result<Vec<AnnouncementEvent>, WealthError>;

    /// The signal table for one (holding days, stop loss) pair, in file
    /// order.
    fn signals(&self, key: SignalKey) -> Result<Vec<TradeSignal>, WealthError>;

    /// Default implementation: loads the three market tables one after the
    /// other.
    fn market_data(&self) -> Result<MarketData, WealthError> {
        Ok(MarketData::new(
            self.trading_days()?,
            self.index_prices()?,
            self.stock_prices()?,
        ))
    }
}
