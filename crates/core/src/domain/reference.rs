use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar event whose keyword tokens are matched against product names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalEvent {
    pub date: NaiveDate,
    pub name: String,
    pub keywords: Vec<String>,
}

/// A festival that falls inside the planning horizon, relative to "today".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingFestival {
    #[serde(flatten)]
    pub event: FestivalEvent,
    pub days_until: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Hot,
    Cold,
    Rainy,
}

impl WeatherCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Cold => "cold",
            Self::Rainy => "rainy",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Cold => "Cold",
            Self::Rainy => "Rainy",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The weather signal for the current season.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherProfile {
    pub condition: WeatherCondition,
    pub keywords: Vec<String>,
    pub forecast: String,
}
