pub mod analysis;
pub mod config;
pub mod domain;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod metrics;
pub mod normalize;
pub mod recommend;
pub mod reference;
pub mod restock;
pub mod series;
pub mod velocity;

pub use analysis::{AnalysisInput, AnalysisReport, DatasetFilter, InventoryAnalyzer};
pub use domain::record::{CategoryFallback, NormalizedRecord, RawRecord, Season};
pub use domain::reference::{FestivalEvent, UpcomingFestival, WeatherCondition, WeatherProfile};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use export::ExportKind;
pub use ingest::{Dataset, IngestOutcome, RejectedRow};
pub use metrics::KeyMetricsSnapshot;
pub use normalize::Normalizer;
pub use recommend::{
    Recommendation, RecommendationEngine, RecommendationEvaluator, RecommendationType, Urgency,
};
pub use reference::{FestivalCalendar, ReferenceData, WeatherMap};
pub use restock::{RestockPrediction, StatusSummary, StockStatus};
pub use series::{ProductSeries, SeriesIndex};
pub use velocity::{CategoryPerformance, SalesTrend, VelocityRecord};
