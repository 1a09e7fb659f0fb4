//! Dataset-wide rollups.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::record::NormalizedRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetricsSnapshot {
    pub total_sales: f64,
    pub avg_stock: f64,
    pub unique_products: usize,
    pub out_of_stock: usize,
    /// `total_sales` minus the prior period's; zero without a prior period.
    pub delta_sales: f64,
}

impl KeyMetricsSnapshot {
    /// Rolls up `current`, comparing against `prior` when supplied. An empty
    /// dataset yields zeros.
    pub fn compute(current: &[NormalizedRecord], prior: Option<&[NormalizedRecord]>) -> Self {
        let total_sales = total_sales(current);
        let avg_stock = if current.is_empty() {
            0.0
        } else {
            current.iter().map(|record| record.stock).sum::<f64>() / current.len() as f64
        };
        let unique_products =
            current.iter().map(|record| record.product.as_str()).collect::<HashSet<_>>().len();
        let out_of_stock = current.iter().filter(|record| record.stock <= 0.0).count();
        let delta_sales = prior.map(|prior| total_sales - self::total_sales(prior)).unwrap_or(0.0);

        Self { total_sales, avg_stock, unique_products, out_of_stock, delta_sales }
    }
}

fn total_sales(records: &[NormalizedRecord]) -> f64 {
    records.iter().map(|record| record.sold).sum()
}

#[cfg(test)]
mod tests {
    use super::KeyMetricsSnapshot;
    use crate::series::fixtures::{daily, record};

    #[test]
    fn empty_dataset_reports_zeros() {
        let snapshot = KeyMetricsSnapshot::compute(&[], None);

        assert_eq!(snapshot, KeyMetricsSnapshot::default());
    }

    #[test]
    fn rolls_up_current_period() {
        let mut records = daily("Milk", &[2.0, 3.0], &[10.0, 0.0]);
        records.push(record("Bread", 0, 5.0, -2.0));

        let snapshot = KeyMetricsSnapshot::compute(&records, None);

        assert_eq!(snapshot.total_sales, 10.0);
        assert!((snapshot.avg_stock - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.unique_products, 2);
        assert_eq!(snapshot.out_of_stock, 2);
        assert_eq!(snapshot.delta_sales, 0.0);
    }

    #[test]
    fn delta_compares_against_prior_period() {
        let current = daily("Milk", &[2.0, 3.0], &[10.0, 8.0]);
        let prior = daily("Milk", &[4.0, 4.0], &[10.0, 8.0]);

        let snapshot = KeyMetricsSnapshot::compute(&current, Some(&prior));

        assert_eq!(snapshot.delta_sales, -3.0);
    }
}
