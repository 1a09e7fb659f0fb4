//! One-call analysis over a normalized dataset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AppConfig, ConfigError, DEFAULT_FESTIVAL_HORIZON_DAYS};
use crate::domain::record::{NormalizedRecord, Season};
use crate::domain::reference::{UpcomingFestival, WeatherProfile};
use crate::metrics::KeyMetricsSnapshot;
use crate::recommend::{Recommendation, RecommendationEngine};
use crate::reference::ReferenceData;
use crate::restock::{predict_all, sort_by_urgency, RestockPrediction, StatusSummary};
use crate::series::SeriesIndex;
use crate::velocity::{analyze_velocity, category_performance, CategoryPerformance, VelocityRecord};

/// Record filters applied before analysis. All bounds are inclusive and every
/// unset field matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub season: Option<Season>,
    pub category: Option<String>,
}

impl DatasetFilter {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.season.is_none() && self.category.is_none()
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        self.from.map_or(true, |from| record.date >= from)
            && self.to.map_or(true, |to| record.date <= to)
            && self.season.map_or(true, |season| record.season == season)
            && self.category.as_deref().map_or(true, |category| record.category == category)
    }

    pub fn apply(&self, records: &[NormalizedRecord]) -> Vec<NormalizedRecord> {
        records.iter().filter(|record| self.matches(record)).cloned().collect()
    }
}

#[derive(Clone, Debug)]
pub struct AnalysisInput<'a> {
    pub records: &'a [NormalizedRecord],
    /// Prior-period records for the sales delta; not filtered.
    pub prior: Option<&'a [NormalizedRecord]>,
    pub today: NaiveDate,
    pub filter: DatasetFilter,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub generated_on: NaiveDate,
    pub season: Season,
    pub records_analyzed: usize,
    pub metrics: KeyMetricsSnapshot,
    pub status_summary: StatusSummary,
    /// Out-of-stock first, then ascending days until restock.
    pub predictions: Vec<RestockPrediction>,
    pub recommendations: Vec<Recommendation>,
    pub velocity: Vec<VelocityRecord>,
    pub category_performance: Vec<CategoryPerformance>,
    pub weather: WeatherProfile,
    pub upcoming_festivals: Vec<UpcomingFestival>,
}

pub struct InventoryAnalyzer {
    festival_horizon_days: u32,
    reference: ReferenceData,
    engine: RecommendationEngine,
}

impl InventoryAnalyzer {
    pub fn new(reference: ReferenceData, festival_horizon_days: u32) -> Self {
        Self { festival_horizon_days, reference, engine: RecommendationEngine::default() }
    }

    /// Loads the reference tables named by the configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let reference = ReferenceData::load(
            config.reference.festival_calendar.as_deref(),
            config.reference.weather_map.as_deref(),
        )?;
        Ok(Self::new(reference, config.analysis.festival_horizon_days))
    }

    pub fn with_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn festival_horizon_days(&self) -> u32 {
        self.festival_horizon_days
    }

    pub fn upcoming_festivals(&self, today: NaiveDate) -> Vec<UpcomingFestival> {
        self.reference.calendar.upcoming(today, self.festival_horizon_days)
    }

    pub fn weather_for(&self, today: NaiveDate) -> WeatherProfile {
        self.reference.weather.profile_for(Season::from_date(today))
    }

    pub fn recommend(&self, index: &SeriesIndex, today: NaiveDate) -> Vec<Recommendation> {
        self.engine.recommend(index, &self.upcoming_festivals(today), &self.weather_for(today))
    }

    pub fn analyze(&self, input: AnalysisInput<'_>) -> AnalysisReport {
        let filtered;
        let records = if input.filter.is_empty() {
            input.records
        } else {
            filtered = input.filter.apply(input.records);
            filtered.as_slice()
        };

        let index = SeriesIndex::build(records);
        let season = Season::from_date(input.today);
        let upcoming_festivals = self.upcoming_festivals(input.today);
        let weather = self.reference.weather.profile_for(season);

        let mut predictions = predict_all(&index);
        sort_by_urgency(&mut predictions);
        let status_summary = StatusSummary::from_predictions(&predictions);
        let recommendations = self.engine.recommend(&index, &upcoming_festivals, &weather);
        let velocity = analyze_velocity(&index);
        let category_performance = category_performance(records, &velocity);
        let metrics = KeyMetricsSnapshot::compute(records, input.prior);

        info!(
            event_name = "analysis.completed",
            records = records.len(),
            products = index.len(),
            recommendations = recommendations.len(),
            upcoming_festivals = upcoming_festivals.len(),
            "inventory analysis completed"
        );

        AnalysisReport {
            generated_on: input.today,
            season,
            records_analyzed: records.len(),
            metrics,
            status_summary,
            predictions,
            recommendations,
            velocity,
            category_performance,
            weather,
            upcoming_festivals,
        }
    }
}

impl Default for InventoryAnalyzer {
    fn default() -> Self {
        Self::new(ReferenceData::default(), DEFAULT_FESTIVAL_HORIZON_DAYS)
    }
}
