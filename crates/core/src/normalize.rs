use tracing::warn;

use crate::domain::record::{
    parse_record_date, CategoryFallback, NormalizedRecord, RawRecord, Season,
};
use crate::errors::DomainError;

/// Turns raw rows into dated, categorized records.
///
/// Normalization is pure: the same rows and fallback always produce the same
/// output, including the category assigned to rows that arrive without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Normalizer {
    fallback: CategoryFallback,
}

impl Normalizer {
    pub fn new(fallback: CategoryFallback) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> CategoryFallback {
        self.fallback
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<NormalizedRecord, DomainError> {
        let invalid = |reason: String| DomainError::InvalidRecord {
            product: raw.product.clone(),
            reason,
        };

        let date = parse_record_date(&raw.date)
            .ok_or_else(|| invalid(format!("unparsable date `{}`", raw.date)))?;
        if !raw.sold.is_finite() || !raw.stock.is_finite() {
            return Err(invalid("sold and stock must be finite numbers".to_owned()));
        }

        let category = raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| self.fallback.category_for(&raw.product));

        Ok(NormalizedRecord {
            date,
            product: raw.product.clone(),
            sold: raw.sold,
            stock: raw.stock,
            category,
            season: Season::from_date(date),
        })
    }

    /// One result per input row, in input order.
    pub fn normalize_all(&self, raw: &[RawRecord]) -> Vec<Result<NormalizedRecord, DomainError>> {
        raw.iter().map(|record| self.normalize(record)).collect()
    }

    /// Normalizes every row that can be normalized, logging and skipping the rest.
    pub fn normalize_valid(&self, raw: &[RawRecord]) -> Vec<NormalizedRecord> {
        raw.iter()
            .filter_map(|record| match self.normalize(record) {
                Ok(normalized) => Some(normalized),
                Err(error) => {
                    warn!(event_name = "normalize.record.skipped", error = %error, "skipping record");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::Normalizer;
    use crate::domain::record::{CategoryFallback, RawRecord, Season, CATEGORIES};
    use crate::errors::DomainError;

    #[test]
    fn keeps_input_order_and_enriches_fields() {
        let raw = vec![
            RawRecord::new("2024-07-02", "Ice Cream", 4.0, 20.0).with_category("Frozen"),
            RawRecord::new("2024-01-15", "Blanket", 1.0, 5.0),
        ];

        let normalized = Normalizer::default().normalize_valid(&raw);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].product, "Ice Cream");
        assert_eq!(normalized[0].category, "Frozen");
        assert_eq!(normalized[0].season, Season::Summer);
        assert_eq!(normalized[0].date, NaiveDate::from_ymd_opt(2024, 7, 2).expect("date"));
        assert_eq!(normalized[1].category, "Uncategorized");
        assert_eq!(normalized[1].season, Season::Winter);
    }

    #[test]
    fn input_season_is_ignored_in_favor_of_date() {
        let mut raw = RawRecord::new("2024-07-02", "Fan", 1.0, 1.0);
        raw.season = Some("Winter".to_owned());

        let normalized = Normalizer::default().normalize(&raw).expect("normalizes");
        assert_eq!(normalized.season, Season::Summer);
    }

    #[test]
    fn hashed_fallback_is_deterministic_across_runs() {
        let raw = vec![RawRecord::new("2024-07-02", "Rangoli Colors", 1.0, 1.0)];
        let normalizer = Normalizer::new(CategoryFallback::Hashed);

        let first = normalizer.normalize_valid(&raw);
        let second = normalizer.normalize_valid(&raw);

        assert_eq!(first, second);
        assert!(CATEGORIES.contains(&first[0].category.as_str()));
    }

    #[test]
    fn blank_category_uses_fallback() {
        let raw = RawRecord::new("2024-07-02", "Fan", 1.0, 1.0).with_category("   ");
        let normalized = Normalizer::default().normalize(&raw).expect("normalizes");
        assert_eq!(normalized.category, "Uncategorized");
    }

    #[test]
    fn bad_rows_fail_individually() {
        let raw = vec![
            RawRecord::new("2024-07-02", "Fan", 1.0, 1.0),
            RawRecord::new("soon", "Cooler", 1.0, 1.0),
            RawRecord::new("2024-07-03", "Cooler", f64::NAN, 1.0),
        ];

        let results = Normalizer::default().normalize_all(&raw);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(DomainError::InvalidRecord { ref product, ref reason })
                if product == "Cooler" && reason.contains("soon")
        ));
        assert!(results[2].is_err());
        assert_eq!(Normalizer::default().normalize_valid(&raw).len(), 1);
    }
}
