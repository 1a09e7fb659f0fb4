use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecommendationType {
    Festival,
    Weather,
    Urgent,
    Historical,
}

impl RecommendationType {
    pub const ALL: [Self; 4] = [Self::Festival, Self::Weather, Self::Urgent, Self::Historical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Festival => "Festival",
            Self::Weather => "Weather",
            Self::Urgent => "Urgent",
            Self::Historical => "Historical",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered from most to least pressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl Urgency {
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    /// Markdown-flavoured rationale: bold names, one bullet per product.
    pub reason: String,
    pub products: Vec<String>,
    pub urgency: Urgency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_needed: Option<f64>,
}

impl Recommendation {
    /// Rationale with the `**` emphasis markers removed.
    pub fn plain_reason(&self) -> String {
        self.reason.replace("**", "")
    }
}

/// One product whose stock falls short of a target level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub product: String,
    pub current_stock: f64,
    pub avg_sales: f64,
    pub target_stock: f64,
    pub shortfall: f64,
}

impl Shortfall {
    /// `None` when stock already covers the target.
    pub fn against_target(
        product: &str,
        current_stock: f64,
        avg_sales: f64,
        target_stock: f64,
    ) -> Option<Self> {
        (current_stock < target_stock).then(|| Self {
            product: product.to_owned(),
            current_stock,
            avg_sales,
            target_stock,
            shortfall: target_stock - current_stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Recommendation, RecommendationType, Shortfall, Urgency};

    #[test]
    fn shortfall_only_when_below_target() {
        assert!(Shortfall::against_target("Diya", 140.0, 10.0, 140.0).is_none());

        let short = Shortfall::against_target("Diya", 50.0, 10.0, 140.0).expect("short");
        assert_eq!(short.shortfall, 90.0);
    }

    #[test]
    fn serializes_kind_as_type_field() {
        let recommendation = Recommendation {
            kind: RecommendationType::Urgent,
            title: "Critical Stock Shortages".to_owned(),
            reason: "- **Milk**: OUT OF STOCK".to_owned(),
            products: vec!["Milk".to_owned()],
            urgency: Urgency::Critical,
            action_needed: None,
        };

        let json = serde_json::to_value(&recommendation).expect("serialize");

        assert_eq!(json["type"], "Urgent");
        assert_eq!(json["urgency"], "Critical");
        assert!(json.get("action_needed").is_none());
        assert_eq!(recommendation.plain_reason(), "- Milk: OUT OF STOCK");
    }

    #[test]
    fn urgency_orders_most_pressing_first() {
        let mut levels = vec![Urgency::Low, Urgency::Critical, Urgency::Medium, Urgency::High];
        levels.sort();
        assert_eq!(levels, Urgency::ALL.to_vec());
    }
}
