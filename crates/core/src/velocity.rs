//! Velocity ranking, sales-trend classification and per-category rollups.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::record::NormalizedRecord;
use crate::restock::NO_ESTIMATE_DAYS;
use crate::series::{mean_sold, ProductSeries, SeriesIndex};

/// Series shorter than this are left out of the ranking.
pub const MIN_VELOCITY_RECORDS: usize = 2;
/// Records compared at each end of the series for trend classification.
pub const TREND_WINDOW: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl SalesTrend {
    /// Compares the mean of the last three records against the first three.
    /// The windows overlap when the series has fewer than six records.
    pub fn classify(series: &ProductSeries) -> Self {
        let earliest = mean_sold(series.leading(TREND_WINDOW));
        let latest = mean_sold(series.trailing(TREND_WINDOW));
        match latest.partial_cmp(&earliest) {
            Some(Ordering::Greater) => Self::Increasing,
            Some(Ordering::Less) => Self::Decreasing,
            _ => Self::Stable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "Increasing",
            Self::Decreasing => "Decreasing",
            Self::Stable => "Stable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityRecord {
    pub product: String,
    pub category: String,
    pub total_sales: f64,
    /// Mean over the entire series, not the trailing window.
    pub avg_daily_sales: f64,
    pub current_stock: f64,
    pub sales_trend: SalesTrend,
    pub stock_turn_days: f64,
    pub performance_score: f64,
}

impl VelocityRecord {
    /// `None` for series below [`MIN_VELOCITY_RECORDS`].
    pub fn for_series(series: &ProductSeries) -> Option<Self> {
        if series.len() < MIN_VELOCITY_RECORDS {
            return None;
        }

        let total_sales = series.total_sales();
        let avg_daily_sales = total_sales / series.len() as f64;
        let current_stock = series.current_stock();
        let stock_turn_days =
            if avg_daily_sales > 0.0 { current_stock / avg_daily_sales } else { NO_ESTIMATE_DAYS };

        Some(Self {
            product: series.product().to_owned(),
            category: series.category().to_owned(),
            total_sales,
            avg_daily_sales,
            current_stock,
            sales_trend: SalesTrend::classify(series),
            stock_turn_days,
            performance_score: performance_score(total_sales, avg_daily_sales, current_stock),
        })
    }
}

/// `(total × avg) / max(stock, 1)`.
pub fn performance_score(total_sales: f64, avg_daily_sales: f64, current_stock: f64) -> f64 {
    (total_sales * avg_daily_sales) / current_stock.max(1.0)
}

/// Ranks products by performance score, descending; ties keep index order.
pub fn analyze_velocity(index: &SeriesIndex) -> Vec<VelocityRecord> {
    let mut ranking: Vec<VelocityRecord> = index.iter().filter_map(VelocityRecord::for_series).collect();
    ranking.sort_by(|a, b| b.performance_score.total_cmp(&a.performance_score));
    ranking
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category: String,
    pub total_sales: f64,
    pub record_count: usize,
    pub avg_performance_score: f64,
}

/// Per-category sales totals joined with the mean performance score of the
/// category's ranked products. Sorted by total sales, descending.
pub fn category_performance(
    records: &[NormalizedRecord],
    velocity: &[VelocityRecord],
) -> Vec<CategoryPerformance> {
    let mut order: Vec<CategoryPerformance> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let position = *positions.entry(record.category.as_str()).or_insert_with(|| {
            order.push(CategoryPerformance {
                category: record.category.clone(),
                total_sales: 0.0,
                record_count: 0,
                avg_performance_score: 0.0,
            });
            order.len() - 1
        });
        let entry = &mut order[position];
        entry.total_sales += record.sold;
        entry.record_count += 1;
    }

    for entry in &mut order {
        let scores: Vec<f64> = velocity
            .iter()
            .filter(|item| item.category == entry.category)
            .map(|item| item.performance_score)
            .collect();
        if !scores.is_empty() {
            entry.avg_performance_score = scores.iter().sum::<f64>() / scores.len() as f64;
        }
    }

    order.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    order
}

#[cfg(test)]
mod tests {
    use super::{analyze_velocity, category_performance, SalesTrend, VelocityRecord};
    use crate::restock::NO_ESTIMATE_DAYS;
    use crate::series::fixtures::{daily, record};
    use crate::series::{ProductSeries, SeriesIndex};

    fn series(product: &str, sold: &[f64], stock: &[f64]) -> ProductSeries {
        ProductSeries::from_records(product, daily(product, sold, stock)).expect("non-empty")
    }

    #[test]
    fn singletons_are_excluded_from_ranking() {
        let records = vec![record("Solo", 0, 4.0, 10.0)];

        assert!(analyze_velocity(&SeriesIndex::build(&records)).is_empty());
    }

    #[test]
    fn trend_compares_first_and_last_three() {
        let rising = series("Up", &[1.0, 1.0, 1.0, 5.0, 5.0, 5.0], &[9.0; 6]);
        let falling = series("Down", &[5.0, 5.0, 5.0, 1.0, 1.0, 1.0], &[9.0; 6]);
        // With two records both windows cover the whole series.
        let flat = series("Flat", &[1.0, 5.0], &[9.0, 9.0]);

        assert_eq!(SalesTrend::classify(&rising), SalesTrend::Increasing);
        assert_eq!(SalesTrend::classify(&falling), SalesTrend::Decreasing);
        assert_eq!(SalesTrend::classify(&flat), SalesTrend::Stable);
    }

    #[test]
    fn turn_days_use_full_series_average() {
        let item = series("Item", &[10.0, 10.0, 10.0, 10.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0], &[20.0; 10]);

        let velocity = VelocityRecord::for_series(&item).expect("ranked");

        assert_eq!(velocity.total_sales, 50.0);
        assert_eq!(velocity.avg_daily_sales, 5.0);
        assert_eq!(velocity.stock_turn_days, 4.0);
        assert_eq!(velocity.performance_score, 50.0 * 5.0 / 20.0);
    }

    #[test]
    fn zero_sales_uses_sentinel_and_stock_floor() {
        let idle = series("Idle", &[0.0, 0.0], &[0.0, 0.0]);

        let velocity = VelocityRecord::for_series(&idle).expect("ranked");

        assert_eq!(velocity.stock_turn_days, NO_ESTIMATE_DAYS);
        assert_eq!(velocity.performance_score, 0.0);
    }

    #[test]
    fn ranking_is_descending_and_stable_on_ties() {
        let mut records = daily("Slow", &[1.0, 1.0], &[10.0, 10.0]);
        records.extend(daily("Fast", &[10.0, 10.0], &[5.0, 5.0]));
        records.extend(daily("AlsoSlow", &[1.0, 1.0], &[10.0, 10.0]));

        let ranking = analyze_velocity(&SeriesIndex::build(&records));

        let order: Vec<&str> = ranking.iter().map(|item| item.product.as_str()).collect();
        assert_eq!(order, vec!["Fast", "Slow", "AlsoSlow"]);
    }

    #[test]
    fn category_rollup_sorts_by_total_sales() {
        let mut records = daily("Fast", &[10.0, 10.0], &[5.0, 5.0]);
        let mut lamp = daily("Lamp", &[1.0, 2.0], &[10.0, 10.0]);
        for record in &mut lamp {
            record.category = "Lighting".to_owned();
        }
        records.extend(lamp);
        let mut solo = record("Solo", 0, 30.0, 1.0);
        solo.category = "Gifts".to_owned();
        records.push(solo);
        let velocity = analyze_velocity(&SeriesIndex::build(&records));

        let rollup = category_performance(&records, &velocity);

        let names: Vec<&str> = rollup.iter().map(|entry| entry.category.as_str()).collect();
        assert_eq!(names, vec!["Gifts", "General", "Lighting"]);
        assert_eq!(rollup[0].record_count, 1);
        // "Solo" is unranked, so its category has no score.
        assert_eq!(rollup[0].avg_performance_score, 0.0);
        assert_eq!(rollup[1].avg_performance_score, 20.0 * 10.0 / 5.0);
        assert_eq!(rollup[2].avg_performance_score, 3.0 * 1.5 / 10.0);
    }
}
