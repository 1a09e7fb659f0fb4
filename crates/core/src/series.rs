//! Per-product series and the shared product index.

use std::collections::HashMap;

use crate::domain::record::NormalizedRecord;

/// Number of most recent observations used for velocity-sensitive estimates.
pub const TRAILING_WINDOW: usize = 5;

/// All observations of one product, ascending by date. Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductSeries {
    product: String,
    records: Vec<NormalizedRecord>,
}

impl ProductSeries {
    /// Builds a series from records of a single product. Returns `None` for an
    /// empty slice; sorting is stable so equal dates keep their input order.
    pub fn from_records(product: impl Into<String>, mut records: Vec<NormalizedRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        records.sort_by_key(|record| record.date);
        Some(Self { product: product.into(), records })
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent observation.
    pub fn latest(&self) -> &NormalizedRecord {
        // Non-empty by construction.
        &self.records[self.records.len() - 1]
    }

    pub fn current_stock(&self) -> f64 {
        self.latest().stock
    }

    pub fn category(&self) -> &str {
        &self.latest().category
    }

    /// The last `min(k, len)` observations.
    pub fn trailing(&self, k: usize) -> &[NormalizedRecord] {
        let start = self.records.len().saturating_sub(k);
        &self.records[start..]
    }

    /// The first `min(k, len)` observations.
    pub fn leading(&self, k: usize) -> &[NormalizedRecord] {
        &self.records[..k.min(self.records.len())]
    }

    /// Mean `sold` over the trailing window.
    pub fn trailing_avg_sales(&self) -> f64 {
        mean_sold(self.trailing(TRAILING_WINDOW))
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|record| record.sold).sum()
    }
}

/// Mean of `sold`; zero for an empty slice.
pub fn mean_sold(records: &[NormalizedRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|record| record.sold).sum::<f64>() / records.len() as f64
}

/// Product → series map built once per analysis and shared by every component.
/// Iteration follows first appearance of each product in the input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesIndex {
    series: Vec<ProductSeries>,
    positions: HashMap<String, usize>,
}

impl SeriesIndex {
    pub fn build(records: &[NormalizedRecord]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<NormalizedRecord>> = HashMap::new();

        for record in records {
            let bucket = buckets.entry(record.product.clone()).or_insert_with(|| {
                order.push(record.product.clone());
                Vec::new()
            });
            bucket.push(record.clone());
        }

        let mut series = Vec::with_capacity(order.len());
        let mut positions = HashMap::with_capacity(order.len());
        for product in order {
            let bucket = buckets.remove(&product).unwrap_or_default();
            if let Some(built) = ProductSeries::from_records(product.clone(), bucket) {
                positions.insert(product, series.len());
                series.push(built);
            }
        }

        Self { series, positions }
    }

    pub fn series(&self) -> &[ProductSeries] {
        &self.series
    }

    pub fn get(&self, product: &str) -> Option<&ProductSeries> {
        self.positions.get(product).map(|&position| &self.series[position])
    }

    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(ProductSeries::product)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProductSeries> {
        self.series.iter()
    }
}

/// Partitions records by exact product id, each partition sorted by date.
pub fn group_by_product(records: &[NormalizedRecord]) -> Vec<ProductSeries> {
    SeriesIndex::build(records).series
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, NaiveDate};

    use crate::domain::record::{NormalizedRecord, Season};

    pub fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).expect("valid base date") + Duration::days(offset)
    }

    pub fn record(product: &str, offset: i64, sold: f64, stock: f64) -> NormalizedRecord {
        let date = day(offset);
        NormalizedRecord {
            date,
            product: product.to_owned(),
            sold,
            stock,
            category: "General".to_owned(),
            season: Season::from_date(date),
        }
    }

    /// Consecutive daily records starting at day 0.
    pub fn daily(product: &str, sold: &[f64], stock: &[f64]) -> Vec<NormalizedRecord> {
        sold.iter()
            .zip(stock)
            .enumerate()
            .map(|(offset, (&sold, &stock))| record(product, offset as i64, sold, stock))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{daily, record};
    use super::{group_by_product, mean_sold, ProductSeries, SeriesIndex};

    #[test]
    fn groups_by_exact_product_and_sorts_by_date() {
        let records = vec![
            record("Milk", 2, 1.0, 10.0),
            record("milk", 0, 9.0, 90.0),
            record("Milk", 0, 2.0, 12.0),
            record("Milk", 1, 3.0, 11.0),
        ];

        let series = group_by_product(&records);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].product(), "Milk");
        assert_eq!(series[1].product(), "milk");
        let sold: Vec<f64> = series[0].records().iter().map(|r| r.sold).collect();
        assert_eq!(sold, vec![2.0, 3.0, 1.0]);
        assert!(series
            .iter()
            .all(|s| s.records().windows(2).all(|pair| pair[0].date <= pair[1].date)));
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let records = vec![
            record("Tea", 1, 1.0, 1.0),
            record("Tea", 0, 2.0, 2.0),
            record("Tea", 1, 3.0, 3.0),
        ];

        let series = group_by_product(&records);
        let sold: Vec<f64> = series[0].records().iter().map(|r| r.sold).collect();
        assert_eq!(sold, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn partitions_cover_every_record_once() {
        let mut records = daily("A", &[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]);
        records.extend(daily("B", &[4.0], &[1.0]));
        records.extend(daily("A", &[7.0], &[2.0]));

        let index = SeriesIndex::build(&records);

        let total: usize = index.iter().map(ProductSeries::len).sum();
        assert_eq!(total, records.len());
        assert_eq!(index.products().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(index.get("A").map(ProductSeries::len), Some(4));
        assert!(index.get("C").is_none());
    }

    #[test]
    fn trailing_and_leading_windows_clamp_to_length() {
        let series = ProductSeries::from_records(
            "Diya",
            daily("Diya", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], &[0.0; 7]),
        )
        .expect("non-empty series");

        assert_eq!(series.trailing(5).len(), 5);
        assert_eq!(series.trailing(5)[0].sold, 3.0);
        assert_eq!(series.leading(3).len(), 3);
        assert_eq!(series.leading(10).len(), 7);
        assert!((series.trailing_avg_sales() - 5.0).abs() < f64::EPSILON);
        assert!((series.total_sales() - 28.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_has_no_series() {
        assert!(ProductSeries::from_records("X", Vec::new()).is_none());
        assert!(SeriesIndex::build(&[]).is_empty());
        assert_eq!(mean_sold(&[]), 0.0);
    }
}
