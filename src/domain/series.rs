//! Ordered date-to-value series and return transforms.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// An ordered mapping of dates to real values: strictly increasing dates,
/// one value per date. Ingestion drops NaN values and keeps the first value
/// seen for a duplicate date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatedSeries {
    values: BTreeMap<NaiveDate, f64>,
}

impl DatedSeries {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut series = Self::new();
        for (date, value) in pairs {
            series.insert_first(date, value);
        }
        series
    }

    /// Insert unless the date is already present or the value is NaN.
    /// Returns whether the entry was stored.
    pub fn insert_first(&mut self, date: NaiveDate, value: f64) -> bool {
        if value.is_nan() || self.values.contains_key(&date) {
            return false;
        }
        self.values.insert(date, value);
        true
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.values.iter().next().map(|(&d, &v)| (d, v))
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.values.iter().next_back().map(|(&d, &v)| (d, v))
    }

    /// Most recent entry at or before `date` (floor lookup).
    pub fn latest_at(&self, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        self.values
            .range(..=date)
            .next_back()
            .map(|(&d, &v)| (d, v))
    }

    /// Sub-series with dates strictly before `date`.
    pub fn before(&self, date: NaiveDate) -> DatedSeries {
        DatedSeries {
            values: self
                .values
                .range(..date)
                .map(|(&d, &v)| (d, v))
                .collect(),
        }
    }

    /// Sub-series with dates at or after `date`.
    pub fn from_date(&self, date: NaiveDate) -> DatedSeries {
        DatedSeries {
            values: self
                .values
                .range(date..)
                .map(|(&d, &v)| (d, v))
                .collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.values.contains_key(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values.iter().map(|(&d, &v)| (d, v))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.values.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    /// Convert a price series to a simple-return series without mutating
    /// the source: the first entry becomes 0, each later entry becomes
    /// `p[i]/p[i-1] - 1`.
    pub fn to_returns(&self) -> DatedSeries {
        let mut returns = BTreeMap::new();
        let mut previous: Option<f64> = None;
        for (&date, &price) in &self.values {
            let r = match previous {
                Some(prev) => price / prev - 1.0,
                None => 0.0,
            };
            returns.insert(date, r);
            previous = Some(price);
        }
        DatedSeries { values: returns }
    }

    /// Sample variance (n-1 denominator); 0 for fewer than two points.
    pub fn sample_variance(&self) -> f64 {
        let n = self.values.len();
        if n < 2 {
            return 0.0;
        }
        let mean = self.values.values().sum::<f64>() / n as f64;
        self.values
            .values()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1) as f64
    }
}
