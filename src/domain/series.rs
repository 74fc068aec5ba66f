//! Dated wealth series.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WealthPoint {
    pub date: NaiveDate,
    pub wealth: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WealthSeries {
    points: Vec<WealthPoint>,
}

impl WealthSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WealthSeries {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(mut points: Vec<WealthPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        WealthSeries { points }
    }

    /// Append a value. Dates must be strictly increasing; a value for the
    /// date of the last point replaces it.
    pub fn record(&mut self, date: NaiveDate, wealth: f64) {
        match self.points.last_mut() {
            Some(last) if last.date == date => last.wealth = wealth,
            Some(last) => {
                debug_assert!(last.date < date, "wealth series dates must increase");
                self.points.push(WealthPoint { date, wealth });
            }
            None => self.points.push(WealthPoint { date, wealth }),
        }
    }

    pub fn points(&self) -> &[WealthPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&WealthPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&WealthPoint> {
        self.points.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].wealth)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.wealth)
    }
}
