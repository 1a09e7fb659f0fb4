use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::domain::reference::{UpcomingFestival, WeatherProfile};
use crate::series::{ProductSeries, SeriesIndex};

use super::index::KeywordIndex;
use super::types::{Recommendation, RecommendationType, Shortfall, Urgency};

/// Days of cover targeted ahead of a festival.
pub const FESTIVAL_COVER_DAYS: f64 = 7.0;
/// Demand multiplier when the festival is at most this many days away.
pub const FESTIVAL_IMMINENT_DAYS: i64 = 3;
pub const FESTIVAL_IMMINENT_MULTIPLIER: f64 = 2.0;
pub const FESTIVAL_MULTIPLIER: f64 = 1.5;
pub const WEATHER_COVER_DAYS: f64 = 10.0;
pub const WEATHER_MULTIPLIER: f64 = 1.3;
/// Stock below this many days of trailing sales is flagged as low.
pub const LOW_STOCK_COVER_DAYS: f64 = 3.0;

/// Whole units for rationale text. Halves round up, so -2.5 shows as -2.
fn whole_units(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Everything an evaluator may read. Shared and immutable for one invocation.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    pub series: &'a SeriesIndex,
    pub keywords: &'a KeywordIndex,
    pub upcoming_festivals: &'a [UpcomingFestival],
    pub weather: &'a WeatherProfile,
}

impl<'a> EvaluationContext<'a> {
    fn matched_series<'k>(&self, keywords: impl IntoIterator<Item = &'k str>) -> Vec<&'a ProductSeries> {
        let series = self.series;
        self.keywords
            .matching(keywords)
            .into_iter()
            .filter_map(|product| series.get(product))
            .collect()
    }
}

/// A rule that turns the shared context into zero or more recommendations.
/// Finding nothing is not an error.
pub trait RecommendationEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, context: &EvaluationContext<'_>) -> Vec<Recommendation>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FestivalEvaluator;

impl FestivalEvaluator {
    pub fn multiplier(days_until: i64) -> f64 {
        if days_until <= FESTIVAL_IMMINENT_DAYS {
            FESTIVAL_IMMINENT_MULTIPLIER
        } else {
            FESTIVAL_MULTIPLIER
        }
    }

    pub fn urgency(days_until: i64) -> Urgency {
        if days_until <= FESTIVAL_IMMINENT_DAYS {
            Urgency::High
        } else if days_until <= 7 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    fn evaluate_festival(
        &self,
        context: &EvaluationContext<'_>,
        festival: &UpcomingFestival,
    ) -> Option<Recommendation> {
        let multiplier = Self::multiplier(festival.days_until);
        let shortfalls: Vec<Shortfall> = context
            .matched_series(festival.event.keywords.iter().map(String::as_str))
            .into_iter()
            .filter_map(|series| {
                let avg_sales = series.trailing_avg_sales();
                Shortfall::against_target(
                    series.product(),
                    series.current_stock(),
                    avg_sales,
                    avg_sales * multiplier * FESTIVAL_COVER_DAYS,
                )
            })
            .collect();

        if shortfalls.is_empty() {
            return None;
        }

        let mut reason = format!(
            "**{}** is coming in **{} days**!\n\n",
            festival.event.name, festival.days_until
        );
        for item in &shortfalls {
            let _ = write!(
                reason,
                "- **{}**: Current stock {} units\n  - Average daily sales: {:.1} units\n  - Recommended stock: {} units\n  - **BUY {} more units** for festival demand!\n\n",
                item.product,
                whole_units(item.current_stock),
                item.avg_sales,
                whole_units(item.target_stock),
                whole_units(item.shortfall),
            );
        }

        Some(Recommendation {
            kind: RecommendationType::Festival,
            title: format!("{} Preparation", festival.event.name),
            reason: reason.trim_end().to_owned(),
            action_needed: Some(shortfalls.iter().map(|item| item.shortfall).sum()),
            products: shortfalls.into_iter().map(|item| item.product).collect(),
            urgency: Self::urgency(festival.days_until),
        })
    }
}

impl RecommendationEvaluator for FestivalEvaluator {
    fn name(&self) -> &'static str {
        "festival"
    }

    /// One recommendation per upcoming festival with at least one shortfall,
    /// in festival-date order.
    fn evaluate(&self, context: &EvaluationContext<'_>) -> Vec<Recommendation> {
        context
            .upcoming_festivals
            .iter()
            .filter_map(|festival| self.evaluate_festival(context, festival))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WeatherEvaluator;

impl RecommendationEvaluator for WeatherEvaluator {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn evaluate(&self, context: &EvaluationContext<'_>) -> Vec<Recommendation> {
        let weather = context.weather;
        let shortfalls: Vec<Shortfall> = context
            .matched_series(weather.keywords.iter().map(String::as_str))
            .into_iter()
            .filter_map(|series| {
                let avg_sales = series.trailing_avg_sales();
                Shortfall::against_target(
                    series.product(),
                    series.current_stock(),
                    avg_sales,
                    avg_sales * WEATHER_MULTIPLIER * WEATHER_COVER_DAYS,
                )
            })
            .collect();

        if shortfalls.is_empty() {
            return Vec::new();
        }

        let mut reason = format!("**{}**\n\n", weather.forecast);
        for item in &shortfalls {
            let _ = write!(
                reason,
                "- **{}**: Stock up for {} weather\n  - Current stock: {} units\n  - **Increase by {} units** for weather demand\n\n",
                item.product,
                weather.condition,
                whole_units(item.current_stock),
                whole_units(item.shortfall),
            );
        }

        vec![Recommendation {
            kind: RecommendationType::Weather,
            title: format!("{} Weather Preparation", weather.condition.title()),
            reason: reason.trim_end().to_owned(),
            products: shortfalls.into_iter().map(|item| item.product).collect(),
            urgency: Urgency::Medium,
            action_needed: None,
        }]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShortageFlag {
    OutOfStock,
    LowStock,
}

impl ShortageFlag {
    /// Flag for one series, judged on its trailing-window sales.
    pub fn for_series(series: &ProductSeries) -> Option<Self> {
        let stock = series.current_stock();
        let avg_sales = series.trailing_avg_sales();
        if stock <= 0.0 {
            Some(Self::OutOfStock)
        } else if avg_sales > 0.0 && stock < avg_sales * LOW_STOCK_COVER_DAYS {
            Some(Self::LowStock)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "OUT OF STOCK",
            Self::LowStock => "LOW STOCK",
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShortageEvaluator;

impl RecommendationEvaluator for ShortageEvaluator {
    fn name(&self) -> &'static str {
        "shortage"
    }

    /// Aggregates every flagged product into a single critical alert.
    fn evaluate(&self, context: &EvaluationContext<'_>) -> Vec<Recommendation> {
        let mut reason = String::from("**URGENT STOCK ALERTS**\n\n");
        let mut products = Vec::new();

        for series in context.series.iter() {
            let Some(flag) = ShortageFlag::for_series(series) else {
                continue;
            };
            let avg_sales = series.trailing_avg_sales();
            let action = match flag {
                ShortageFlag::OutOfStock => "Restock immediately!".to_owned(),
                ShortageFlag::LowStock => {
                    format!("Only {:.1} days left", series.current_stock() / avg_sales)
                }
            };
            let _ = write!(
                reason,
                "- **{}**: {}\n  - {}\n  - Average daily sales: {:.1} units\n\n",
                series.product(),
                flag.label(),
                action,
                avg_sales,
            );
            products.push(series.product().to_owned());
        }

        if products.is_empty() {
            return Vec::new();
        }

        vec![Recommendation {
            kind: RecommendationType::Urgent,
            title: "Critical Stock Shortages".to_owned(),
            reason: reason.trim_end().to_owned(),
            products,
            urgency: Urgency::Critical,
            action_needed: None,
        }]
    }
}
