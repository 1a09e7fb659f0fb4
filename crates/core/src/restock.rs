//! Restock prediction and stock-status classification.
//!
//! Both figures come from one [`DepletionEstimate`] per product so they are
//! computed from the same trailing-window velocity:
//!
//! * `restock_date` is the buffered "safe" date: raw days of stock minus a
//!   safety buffer tiered by how many days of cover remain.
//! * `days_until_restock` is the raw days-of-stock figure that drives the
//!   status tier, with `999` meaning "no meaningful estimate".

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::series::{ProductSeries, SeriesIndex};

/// Minimum observations before a restock date is predicted.
pub const MIN_PREDICTION_RECORDS: usize = 3;
/// Sentinel for "no actionable estimate".
pub const NO_ESTIMATE_DAYS: f64 = 999.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Moderate,
    Good,
}

impl StockStatus {
    /// Tier for a raw days-of-stock figure.
    pub fn classify(current_stock: f64, days_of_stock: f64) -> Self {
        if current_stock <= 0.0 {
            Self::OutOfStock
        } else if days_of_stock <= 2.0 {
            Self::Critical
        } else if days_of_stock <= 5.0 {
            Self::Low
        } else if days_of_stock <= 10.0 {
            Self::Moderate
        } else {
            Self::Good
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "OUT OF STOCK",
            Self::Critical => "CRITICAL (<=2 days)",
            Self::Low => "LOW (<=5 days)",
            Self::Moderate => "MODERATE (<=10 days)",
            Self::Good => "GOOD (>10 days)",
        }
    }
}

/// Why a restock date was or was not produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestockBasis {
    InsufficientData,
    OutOfStock,
    NoSalesTrend,
    Velocity { days_until_empty: f64, safety_buffer_days: u32 },
}

/// Shared depletion figures for one product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepletionEstimate {
    pub current_stock: f64,
    pub current_date: NaiveDate,
    pub avg_daily_sales: f64,
    /// Raw days of stock at the trailing average; `0` when out of stock,
    /// [`NO_ESTIMATE_DAYS`] when nothing is selling.
    pub days_of_stock: f64,
}

impl DepletionEstimate {
    pub fn for_series(series: &ProductSeries) -> Self {
        let latest = series.latest();
        let avg_daily_sales = series.trailing_avg_sales();
        let days_of_stock = if latest.stock <= 0.0 {
            0.0
        } else if avg_daily_sales > 0.0 {
            latest.stock / avg_daily_sales
        } else {
            NO_ESTIMATE_DAYS
        };

        Self {
            current_stock: latest.stock,
            current_date: latest.date,
            avg_daily_sales,
            days_of_stock,
        }
    }

    pub fn status(&self) -> StockStatus {
        StockStatus::classify(self.current_stock, self.days_of_stock)
    }
}

/// Safety buffer in days, tiered by remaining cover.
pub fn safety_buffer_days(current_stock: f64, avg_daily_sales: f64) -> u32 {
    if current_stock < avg_daily_sales * 3.0 {
        1
    } else if current_stock < avg_daily_sales * 7.0 {
        3
    } else {
        7
    }
}

/// Output of the predictor for one series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestockForecast {
    pub restock_date: Option<NaiveDate>,
    pub reason: String,
    pub basis: RestockBasis,
}

/// Predicts when the product needs replenishing.
pub fn predict_restock(series: &ProductSeries) -> RestockForecast {
    forecast_from(series, &DepletionEstimate::for_series(series))
}

fn forecast_from(series: &ProductSeries, estimate: &DepletionEstimate) -> RestockForecast {
    if series.len() < MIN_PREDICTION_RECORDS {
        return RestockForecast {
            restock_date: None,
            reason: "Insufficient data".to_owned(),
            basis: RestockBasis::InsufficientData,
        };
    }

    if estimate.current_stock <= 0.0 {
        return RestockForecast {
            restock_date: Some(estimate.current_date),
            reason: "Out of stock - restock immediately".to_owned(),
            basis: RestockBasis::OutOfStock,
        };
    }

    if estimate.avg_daily_sales <= 0.0 {
        return RestockForecast {
            restock_date: None,
            reason: "No sales trend available".to_owned(),
            basis: RestockBasis::NoSalesTrend,
        };
    }

    let days_until_empty = estimate.current_stock / estimate.avg_daily_sales;
    let buffer = safety_buffer_days(estimate.current_stock, estimate.avg_daily_sales);
    let restock_days = (days_until_empty - f64::from(buffer)).max(0.0);
    // Whole calendar days; saturates at the last representable date.
    let restock_date = estimate
        .current_date
        .checked_add_days(Days::new(restock_days.floor() as u64))
        .unwrap_or(NaiveDate::MAX);

    RestockForecast {
        restock_date: Some(restock_date),
        reason: format!("Based on {:.1} daily sales avg", estimate.avg_daily_sales),
        basis: RestockBasis::Velocity { days_until_empty, safety_buffer_days: buffer },
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestockPrediction {
    pub product: String,
    pub category: String,
    pub current_stock: f64,
    pub avg_daily_sales: f64,
    pub restock_date: Option<NaiveDate>,
    pub reason: String,
    pub days_until_restock: f64,
    pub status: StockStatus,
    pub basis: RestockBasis,
}

impl RestockPrediction {
    pub fn for_series(series: &ProductSeries) -> Self {
        let estimate = DepletionEstimate::for_series(series);
        let forecast = forecast_from(series, &estimate);

        Self {
            product: series.product().to_owned(),
            category: series.category().to_owned(),
            current_stock: estimate.current_stock,
            avg_daily_sales: estimate.avg_daily_sales,
            restock_date: forecast.restock_date,
            reason: forecast.reason,
            days_until_restock: estimate.days_of_stock,
            status: estimate.status(),
            basis: forecast.basis,
        }
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.current_stock <= 0.0
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock > 0.0 && self.current_stock < self.avg_daily_sales * 3.0
    }

    pub fn is_healthy(&self) -> bool {
        self.current_stock >= self.avg_daily_sales * 7.0
    }
}

/// One prediction per product, in index order.
pub fn predict_all(index: &SeriesIndex) -> Vec<RestockPrediction> {
    index
        .iter()
        .map(|series| {
            let prediction = RestockPrediction::for_series(series);
            debug!(
                event_name = "analysis.restock.predicted",
                product = %prediction.product,
                status = ?prediction.status,
                days_until_restock = prediction.days_until_restock,
                "restock prediction computed"
            );
            prediction
        })
        .collect()
}

/// Out-of-stock products first, then ascending days until restock.
pub fn sort_by_urgency(predictions: &mut [RestockPrediction]) {
    predictions.sort_by(|a, b| {
        b.is_out_of_stock()
            .cmp(&a.is_out_of_stock())
            .then_with(|| a.days_until_restock.total_cmp(&b.days_until_restock))
    });
}

/// Tier counts plus the coarse stock buckets used on dashboards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub by_status: BTreeMap<StockStatus, usize>,
    pub immediate_restock: usize,
    pub low_stock: usize,
    pub healthy: usize,
}

impl StatusSummary {
    pub fn from_predictions(predictions: &[RestockPrediction]) -> Self {
        let mut summary = Self::default();
        for prediction in predictions {
            *summary.by_status.entry(prediction.status).or_default() += 1;
            summary.immediate_restock += usize::from(prediction.is_out_of_stock());
            summary.low_stock += usize::from(prediction.is_low_stock());
            summary.healthy += usize::from(prediction.is_healthy());
        }
        summary
    }

    pub fn count(&self, status: StockStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        predict_all, predict_restock, safety_buffer_days, sort_by_urgency, RestockBasis,
        RestockPrediction, StatusSummary, StockStatus, NO_ESTIMATE_DAYS,
    };
    use crate::series::fixtures::{daily, day};
    use crate::series::{ProductSeries, SeriesIndex};

    fn series(product: &str, sold: &[f64], stock: &[f64]) -> ProductSeries {
        ProductSeries::from_records(product, daily(product, sold, stock)).expect("non-empty")
    }

    #[test]
    fn out_of_stock_restocks_on_last_observation() {
        let milk = series("Milk", &[2.0, 3.0, 5.0, 5.0], &[10.0, 8.0, 5.0, 0.0]);

        let forecast = predict_restock(&milk);

        assert_eq!(forecast.restock_date, Some(day(3)));
        assert!(forecast.reason.to_lowercase().contains("out of stock"));
        assert_eq!(forecast.basis, RestockBasis::OutOfStock);
    }

    #[test]
    fn fewer_than_three_records_is_insufficient() {
        let tea = series("Tea", &[2.0, 3.0], &[0.0, 0.0]);

        let forecast = predict_restock(&tea);

        assert_eq!(forecast.restock_date, None);
        assert_eq!(forecast.reason, "Insufficient data");
    }

    #[test]
    fn zero_sales_has_no_trend() {
        let fan = series("Fan", &[0.0, 0.0, 0.0], &[9.0, 9.0, 9.0]);

        let prediction = RestockPrediction::for_series(&fan);

        assert_eq!(prediction.restock_date, None);
        assert_eq!(prediction.reason, "No sales trend available");
        assert_eq!(prediction.days_until_restock, NO_ESTIMATE_DAYS);
        assert_eq!(prediction.status, StockStatus::Good);
    }

    #[test]
    fn buffer_tiers_follow_days_of_cover() {
        assert_eq!(safety_buffer_days(5.0, 2.0), 1);
        assert_eq!(safety_buffer_days(6.0, 2.0), 3);
        assert_eq!(safety_buffer_days(13.9, 2.0), 3);
        assert_eq!(safety_buffer_days(14.0, 2.0), 7);
    }

    #[test]
    fn velocity_prediction_subtracts_buffer_from_trailing_window() {
        // Early history sells 100/day; only the last five records count.
        let umbrella = series(
            "Umbrella",
            &[100.0, 100.0, 2.0, 2.0, 2.0, 2.0, 2.0],
            &[90.0, 80.0, 70.0, 60.0, 55.0, 52.0, 50.0],
        );

        let forecast = predict_restock(&umbrella);

        // 50 / 2 = 25 days of stock, buffer 7 → 18 days after the last record.
        assert_eq!(forecast.restock_date, Some(day(6 + 18)));
        assert_eq!(forecast.reason, "Based on 2.0 daily sales avg");
        assert!(matches!(
            forecast.basis,
            RestockBasis::Velocity { safety_buffer_days: 7, days_until_empty } if (days_until_empty - 25.0).abs() < 1e-9
        ));
    }

    #[test]
    fn restock_date_never_precedes_last_observation() {
        let diya = series("Diya", &[10.0, 10.0, 10.0], &[30.0, 20.0, 5.0]);

        let forecast = predict_restock(&diya);

        assert_eq!(forecast.restock_date, Some(day(2)));
    }

    #[test]
    fn status_tiers_use_raw_days_of_stock() {
        let critical = RestockPrediction::for_series(&series("A", &[5.0, 5.0, 5.0], &[9.0, 9.0, 10.0]));
        let low = RestockPrediction::for_series(&series("B", &[5.0, 5.0, 5.0], &[25.0, 25.0, 25.0]));
        let moderate = RestockPrediction::for_series(&series("C", &[5.0, 5.0, 5.0], &[50.0, 50.0, 50.0]));
        let good = RestockPrediction::for_series(&series("D", &[5.0, 5.0, 5.0], &[51.0, 51.0, 51.0]));
        let out = RestockPrediction::for_series(&series("E", &[5.0], &[-1.0]));

        assert_eq!(critical.status, StockStatus::Critical);
        assert_eq!(low.status, StockStatus::Low);
        assert_eq!(moderate.status, StockStatus::Moderate);
        assert_eq!(good.status, StockStatus::Good);
        assert_eq!(out.status, StockStatus::OutOfStock);
        assert_eq!(out.days_until_restock, 0.0);
        // Single record: status still classified, but no date predicted.
        assert_eq!(out.restock_date, None);
    }

    #[test]
    fn urgency_sort_puts_out_of_stock_first() {
        let mut records = daily("Good", &[1.0, 1.0, 1.0], &[50.0, 50.0, 50.0]);
        records.extend(daily("Empty", &[1.0, 1.0, 1.0], &[2.0, 1.0, 0.0]));
        records.extend(daily("Low", &[4.0, 4.0, 4.0], &[12.0, 10.0, 8.0]));
        let mut predictions = predict_all(&SeriesIndex::build(&records));

        sort_by_urgency(&mut predictions);

        let order: Vec<&str> = predictions.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(order, vec!["Empty", "Low", "Good"]);
    }

    #[test]
    fn summary_counts_tiers_and_buckets() {
        let mut records = daily("Good", &[1.0, 1.0, 1.0], &[50.0, 50.0, 50.0]);
        records.extend(daily("Empty", &[1.0, 1.0, 1.0], &[2.0, 1.0, 0.0]));
        records.extend(daily("Low", &[4.0, 4.0, 4.0], &[12.0, 10.0, 8.0]));
        let predictions = predict_all(&SeriesIndex::build(&records));

        let summary = StatusSummary::from_predictions(&predictions);

        assert_eq!(summary.count(StockStatus::OutOfStock), 1);
        assert_eq!(summary.count(StockStatus::Critical), 1);
        assert_eq!(summary.count(StockStatus::Good), 1);
        assert_eq!(summary.count(StockStatus::Low), 0);
        assert_eq!(summary.immediate_restock, 1);
        assert_eq!(summary.low_stock, 1);
        assert_eq!(summary.healthy, 1);
    }
}
