//! Capital allocation across portfolio slots.
//!
//! Two disciplines share one interface:
//!
//! * **Non-rebalanced**: each slot carries its own cash and compounds
//!   independently. Withdrawing hands out the oldest slot whole; proceeds come
//!   back as a new slot at the end of the queue.
//! * **Rebalanced**: all free cash is pooled and every withdrawal takes an
//!   equal share of it across the free slots.
//!
//! The discipline is chosen once in [`CapitalPool::new`] and never changes.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum CapitalPool {
    NonRebalanced { slots: VecDeque<f64> },
    Rebalanced { free_money: f64, free_ports: usize },
}

impl CapitalPool {
    pub fn new(portfolio_size: usize, rebalance: bool, initial_wealth: f64) -> Self {
        if rebalance {
            CapitalPool::Rebalanced {
                free_money: initial_wealth,
                free_ports: portfolio_size,
            }
        } else {
            let share = if portfolio_size > 0 {
                initial_wealth / portfolio_size as f64
            } else {
                0.0
            };
            CapitalPool::NonRebalanced {
                slots: std::iter::repeat_n(share, portfolio_size).collect(),
            }
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.free_slots() > 0
    }

    pub fn free_slots(&self) -> usize {
        match self {
            CapitalPool::NonRebalanced { slots } => slots.len(),
            CapitalPool::Rebalanced { free_ports, .. } => *free_ports,
        }
    }

    /// Take one slot's worth of cash, or `None` when every slot is committed.
    pub fn withdraw_share(&mut self) -> Option<f64> {
        match self {
            CapitalPool::NonRebalanced { slots } => slots.pop_front(),
            CapitalPool::Rebalanced {
                free_money,
                free_ports,
            } => {
                if *free_ports == 0 {
                    return None;
                }
                let amount = *free_money / *free_ports as f64;
                *free_money -= amount;
                *free_ports -= 1;
                Some(amount)
            }
        }
    }

    /// Return realized proceeds, freeing one slot.
    pub fn deposit(&mut self, amount: f64) {
        match self {
            CapitalPool::NonRebalanced { slots } => slots.push_back(amount),
            CapitalPool::Rebalanced {
                free_money,
                free_ports,
            } => {
                *free_money += amount;
                *free_ports += 1;
            }
        }
    }

    /// Uncommitted cash.
    pub fn total(&self) -> f64 {
        match self {
            CapitalPool::NonRebalanced { slots } => slots.iter().sum(),
            CapitalPool::Rebalanced { free_money, .. } => *free_money,
        }
    }
}
