//! Static reference tables consumed by the recommendation engine.
//!
//! Both tables are injected configuration: the built-in versions ship with the
//! crate, and either can be replaced by a TOML file at startup. Neither is
//! mutated after loading, so one instance can back any number of analyses.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::record::Season;
use crate::domain::reference::{FestivalEvent, UpcomingFestival, WeatherCondition, WeatherProfile};

const BUILTIN_FESTIVALS: &[(&str, &str, &[&str])] = &[
    (
        "2024-10-31",
        "Diwali",
        &["sweet", "laddu", "jamun", "diya", "lamp", "light", "decoration", "rangoli", "candle"],
    ),
    ("2024-11-15", "Bhai Dooj", &["sweet", "gift", "flower", "tilak", "dry fruit", "laddu"]),
    (
        "2024-12-25",
        "Christmas",
        &["cake", "wine", "gift", "decoration", "tree", "star", "wrapping"],
    ),
    ("2025-01-14", "Makar Sankranti", &["sesame", "til", "jaggery", "kite", "sweet", "laddu"]),
    ("2025-02-26", "Maha Shivratri", &["milk", "honey", "fruit", "flower", "bel", "leaves"]),
    (
        "2025-03-13",
        "Holi",
        &["color", "gulal", "sweet", "gujiya", "thandai", "water", "gun", "balloon"],
    ),
    (
        "2025-08-30",
        "Janmashtami",
        &["butter", "milk", "sweet", "flower", "krishna", "idol", "flute"],
    ),
    (
        "2025-09-05",
        "Ganesh Chaturthi",
        &["modak", "flower", "decoration", "sweet", "fruit", "ganesh", "idol", "coconut"],
    ),
    ("2025-10-10", "Dussehra", &["sweet", "flower", "decoration", "traditional", "clothes"]),
];

const HOT_KEYWORDS: &[&str] =
    &["ice", "cream", "cold", "drink", "fan", "cooler", "cotton", "sunscreen", "water"];
const COLD_KEYWORDS: &[&str] =
    &["heater", "warm", "blanket", "hot", "coffee", "tea", "winter", "jacket", "coat"];
const RAINY_KEYWORDS: &[&str] = &["umbrella", "raincoat", "boot", "hot", "warm", "waterproof"];

fn owned(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|keyword| (*keyword).to_owned()).collect()
}

/// Festival calendar, kept sorted by date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalCalendar {
    events: Vec<FestivalEvent>,
}

impl FestivalCalendar {
    pub fn new(mut events: Vec<FestivalEvent>) -> Self {
        events.sort_by_key(|event| event.date);
        Self { events }
    }

    pub fn builtin() -> Self {
        let events = BUILTIN_FESTIVALS
            .iter()
            .filter_map(|(date, name, keywords)| {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|date| FestivalEvent {
                    date,
                    name: (*name).to_owned(),
                    keywords: owned(keywords),
                })
            })
            .collect();
        Self::new(events)
    }

    /// Parses a calendar of `[[festival]]` tables with `date`, `name` and `keywords`.
    pub fn from_toml_str(raw: &str) -> Result<Self, String> {
        let file: CalendarFile = toml::from_str(raw).map_err(|error| error.to_string())?;
        let mut events = Vec::with_capacity(file.festival.len());

        for entry in file.festival {
            let date = NaiveDate::parse_from_str(entry.date.trim(), "%Y-%m-%d").map_err(|_| {
                format!("festival `{}` has invalid date `{}` (expected YYYY-MM-DD)", entry.name, entry.date)
            })?;
            if entry.keywords.iter().all(|keyword| keyword.trim().is_empty()) {
                return Err(format!("festival `{}` must list at least one keyword", entry.name));
            }
            events.push(FestivalEvent {
                date,
                name: entry.name,
                keywords: entry
                    .keywords
                    .into_iter()
                    .map(|keyword| keyword.trim().to_owned())
                    .filter(|keyword| !keyword.is_empty())
                    .collect(),
            });
        }

        Ok(Self::new(events))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw).map_err(|message| {
            ConfigError::Validation(format!("festival calendar `{}`: {message}", path.display()))
        })
    }

    pub fn events(&self) -> &[FestivalEvent] {
        &self.events
    }

    /// Festivals between `today` and `today + horizon_days`, both inclusive,
    /// nearest first.
    pub fn upcoming(&self, today: NaiveDate, horizon_days: u32) -> Vec<UpcomingFestival> {
        let mut upcoming: Vec<UpcomingFestival> = self
            .events
            .iter()
            .filter_map(|event| {
                let days_until = (event.date - today).num_days();
                (0..=i64::from(horizon_days))
                    .contains(&days_until)
                    .then(|| UpcomingFestival { event: event.clone(), days_until })
            })
            .collect();
        upcoming.sort_by_key(|festival| festival.days_until);
        upcoming
    }
}

impl Default for FestivalCalendar {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Condition → keyword table for the seasonal weather signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherMap {
    pub hot: Vec<String>,
    pub cold: Vec<String>,
    pub rainy: Vec<String>,
}

impl WeatherMap {
    pub fn builtin() -> Self {
        Self { hot: owned(HOT_KEYWORDS), cold: owned(COLD_KEYWORDS), rainy: owned(RAINY_KEYWORDS) }
    }

    /// Parses `[hot]`, `[cold]` and `[rainy]` tables, each with a `keywords`
    /// list. Omitted conditions keep their built-in keywords.
    pub fn from_toml_str(raw: &str) -> Result<Self, String> {
        let file: WeatherFile = toml::from_str(raw).map_err(|error| error.to_string())?;
        let mut map = Self::builtin();
        if let Some(hot) = file.hot {
            map.hot = hot.keywords;
        }
        if let Some(cold) = file.cold {
            map.cold = cold.keywords;
        }
        if let Some(rainy) = file.rainy {
            map.rainy = rainy.keywords;
        }
        Ok(map)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw).map_err(|message| {
            ConfigError::Validation(format!("weather map `{}`: {message}", path.display()))
        })
    }

    pub fn keywords(&self, condition: WeatherCondition) -> &[String] {
        match condition {
            WeatherCondition::Hot => &self.hot,
            WeatherCondition::Cold => &self.cold,
            WeatherCondition::Rainy => &self.rainy,
        }
    }

    pub fn profile_for(&self, season: Season) -> WeatherProfile {
        let (condition, forecast) = match season {
            Season::Summer => {
                (WeatherCondition::Hot, "Summer season - Hot weather expected".to_owned())
            }
            Season::Winter => {
                (WeatherCondition::Cold, "Winter season - Cold weather expected".to_owned())
            }
            Season::Spring | Season::Autumn => {
                (WeatherCondition::Rainy, format!("{season} season - Variable weather expected"))
            }
        };

        WeatherProfile { condition, keywords: self.keywords(condition).to_vec(), forecast }
    }
}

impl Default for WeatherMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Both reference tables, loaded once per process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub calendar: FestivalCalendar,
    pub weather: WeatherMap,
}

impl ReferenceData {
    pub fn new(calendar: FestivalCalendar, weather: WeatherMap) -> Self {
        Self { calendar, weather }
    }

    /// Loads each table from its path, falling back to the built-in table.
    pub fn load(
        festival_calendar: Option<&Path>,
        weather_map: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let calendar = match festival_calendar {
            Some(path) => FestivalCalendar::load(path)?,
            None => FestivalCalendar::builtin(),
        };
        let weather = match weather_map {
            Some(path) => WeatherMap::load(path)?,
            None => WeatherMap::builtin(),
        };
        Ok(Self { calendar, weather })
    }
}

#[derive(Debug, Deserialize)]
struct CalendarFile {
    #[serde(default)]
    festival: Vec<CalendarEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarEntry {
    date: String,
    name: String,
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherFile {
    hot: Option<WeatherEntry>,
    cold: Option<WeatherEntry>,
    rainy: Option<WeatherEntry>,
}

#[derive(Debug, Deserialize)]
struct WeatherEntry {
    keywords: Vec<String>,
}
