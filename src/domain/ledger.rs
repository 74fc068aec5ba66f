//! Append-only record of executed buys.

use super::signal::ScheduledTrade;

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub trade: ScheduledTrade,
    /// Raw-pool capital committed after the buy-side cost.
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLedger {
    records: Vec<TransactionRecord>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: &ScheduledTrade, amount: f64) {
        self.records.push(TransactionRecord {
            trade: trade.clone(),
            amount,
        });
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_committed(&self) -> f64 {
        self.records.iter().map(|r| r.amount).sum()
    }
}
