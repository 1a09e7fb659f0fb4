//! Recommendation engine: festival, weather and shortage rules over the shared
//! product index, merged into one advisory list.

pub mod evaluators;
pub mod index;
pub mod types;

use std::collections::HashSet;

use tracing::debug;

use crate::domain::reference::{UpcomingFestival, WeatherProfile};
use crate::series::SeriesIndex;

pub use self::evaluators::{
    EvaluationContext, FestivalEvaluator, RecommendationEvaluator, ShortageEvaluator,
    ShortageFlag, WeatherEvaluator,
};
pub use self::index::KeywordIndex;
pub use self::types::{Recommendation, RecommendationType, Shortfall, Urgency};

/// Runs its evaluators in order and concatenates their output. No global
/// re-sort is applied; callers group by urgency for display.
pub struct RecommendationEngine {
    evaluators: Vec<Box<dyn RecommendationEvaluator>>,
}

impl RecommendationEngine {
    /// An engine with no rules.
    pub fn empty() -> Self {
        Self { evaluators: Vec::new() }
    }

    pub fn with_evaluator(mut self, evaluator: impl RecommendationEvaluator + 'static) -> Self {
        self.evaluators.push(Box::new(evaluator));
        self
    }

    pub fn evaluator_names(&self) -> Vec<&'static str> {
        self.evaluators.iter().map(|evaluator| evaluator.name()).collect()
    }

    pub fn recommend(
        &self,
        series: &SeriesIndex,
        upcoming_festivals: &[UpcomingFestival],
        weather: &WeatherProfile,
    ) -> Vec<Recommendation> {
        let keywords = KeywordIndex::build(
            series.products(),
            upcoming_festivals
                .iter()
                .flat_map(|festival| festival.event.keywords.iter())
                .chain(weather.keywords.iter())
                .map(String::as_str),
        );
        let context = EvaluationContext { series, keywords: &keywords, upcoming_festivals, weather };

        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();
        for evaluator in &self.evaluators {
            let produced = evaluator.evaluate(&context);
            debug!(
                event_name = "analysis.recommend.evaluated",
                evaluator = evaluator.name(),
                produced = produced.len(),
                "recommendation evaluator finished"
            );
            for recommendation in produced {
                // Same-name events on different dates differ in their reason text.
                let key = (
                    recommendation.kind,
                    recommendation.title.clone(),
                    recommendation.reason.clone(),
                );
                if seen.insert(key) {
                    recommendations.push(recommendation);
                }
            }
        }
        recommendations
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::empty()
            .with_evaluator(FestivalEvaluator)
            .with_evaluator(WeatherEvaluator)
            .with_evaluator(ShortageEvaluator)
    }
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine").field("evaluators", &self.evaluator_names()).finish()
    }
}
