//! Open positions and their valuation against the benchmark index.

use super::price::PriceField;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub ticker: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub sell_type: PriceField,
    pub raw_amount: f64,
    pub alpha_amount: f64,
    pub index_buy_price: f64,
    pub last_price: f64,
}

impl OpenPosition {
    pub fn price_ratio(&self, price: f64) -> f64 {
        price / self.buy_price
    }

    pub fn index_ratio(&self, index_price: f64) -> f64 {
        index_price / self.index_buy_price
    }

    /// Record today's mark if there is one and return the price to value at.
    pub fn remark(&mut self, price: Option<f64>) -> f64 {
        if let Some(p) = price {
            self.last_price = p;
        }
        self.last_price
    }

    /// Raw-leg value at `price`.
    pub fn raw_value(&self, price: f64) -> f64 {
        self.raw_amount * self.price_ratio(price)
    }

    /// Alpha-leg value at `price` with the index at `index_price`: stock
    /// return minus index return on the committed amount.
    pub fn alpha_value(&self, price: f64, index_price: f64) -> f64 {
        self.alpha_amount * (self.price_ratio(price) - self.index_ratio(index_price) + 1.0)
    }

    /// Raw-leg proceeds of selling at the scheduled price, after cost.
    pub fn raw_proceeds(&self, cost: f64) -> f64 {
        self.raw_amount * self.price_ratio(self.sell_price) * (1.0 - cost)
    }

    /// Alpha-leg proceeds. Cost applies to the stock term only, not to the
    /// index hedge.
    pub fn alpha_proceeds(&self, cost: f64, index_sell_price: f64) -> f64 {
        self.alpha_amount
            * (self.price_ratio(self.sell_price) * (1.0 - cost)
                - self.index_ratio(index_sell_price)
                + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_position() -> OpenPosition {
        OpenPosition {
            ticker: "600000".into(),
            buy_price: 10.0,
            sell_price: 11.0,
            sell_type: PriceField::Close,
            raw_amount: 1_000.0,
            alpha_amount: 1_000.0,
            index_buy_price: 3_000.0,
            last_price: 10.0,
        }
    }

    #[test]
    fn remark_carries_last_price_forward() {
        let mut pos = sample_position();
        assert_eq!(pos.remark(Some(10.5)), 10.5);
        assert_eq!(pos.remark(None), 10.5);
        assert_eq!(pos.last_price, 10.5);
    }

    #[test]
    fn raw_value_scales_with_price() {
        let pos = sample_position();
        assert_relative_eq!(pos.raw_value(12.0), 1_200.0);
    }

    #[test]
    fn alpha_value_hedges_index_move() {
        let pos = sample_position();
        // stock +20%, index +10% -> +10% alpha
        assert_relative_eq!(pos.alpha_value(12.0, 3_300.0), 1_100.0);
        // stock flat, index down 10% -> +10% alpha
        assert_relative_eq!(pos.alpha_value(10.0, 2_700.0), 1_100.0);
    }

    #[test]
    fn proceeds_apply_cost_asymmetrically() {
        let pos = sample_position();
        let cost = 0.01;
        assert_relative_eq!(pos.raw_proceeds(cost), 1_000.0 * 1.1 * 0.99);
        // index flat: hedge term cancels, cost only on the stock term
        assert_relative_eq!(
            pos.alpha_proceeds(cost, 3_000.0),
            1_000.0 * (1.1 * 0.99 - 1.0 + 1.0)
        );
    }
}
