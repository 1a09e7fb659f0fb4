use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Category assigned when the source row carries none and the fallback is
/// [`CategoryFallback::Uncategorized`].
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Fixed category list used by [`CategoryFallback::Hashed`].
pub const CATEGORIES: &[&str] = &[
    "Vegetables",
    "Fruits",
    "Grains",
    "Dairy",
    "Meat",
    "Seafood",
    "Oils",
    "Sweets",
    "Festival Items",
    "Clothing",
    "Electronics",
    "Home",
    "Beverages",
    "Frozen",
    "Cosmetics",
    "Flowers",
];

/// One observation as supplied by the data source, before validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: String,
    pub product: String,
    pub sold: f64,
    pub stock: f64,
    pub category: Option<String>,
    pub season: Option<String>,
    pub restock_date: Option<String>,
}

impl RawRecord {
    pub fn new(date: impl Into<String>, product: impl Into<String>, sold: f64, stock: f64) -> Self {
        Self {
            date: date.into(),
            product: product.into(),
            sold,
            stock,
            category: None,
            season: None,
            restock_date: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A validated, dated and categorized observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub date: NaiveDate,
    pub product: String,
    pub sold: f64,
    pub stock: f64,
    pub category: String,
    pub season: Season,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Dec-Feb winter, Mar-May spring, Jun-Aug summer, Sep-Nov autumn.
    pub fn from_date(date: NaiveDate) -> Self {
        match date.month() {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Season {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "summer" => Ok(Self::Summer),
            "autumn" | "fall" => Ok(Self::Autumn),
            other => Err(format!(
                "unsupported season `{other}` (expected winter|spring|summer|autumn)"
            )),
        }
    }
}

/// How a category is chosen for rows that arrive without one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFallback {
    #[default]
    Uncategorized,
    /// Stable SHA-256 bucket of the product id into [`CATEGORIES`].
    Hashed,
}

impl CategoryFallback {
    pub fn category_for(&self, product: &str) -> String {
        match self {
            Self::Uncategorized => UNCATEGORIZED.to_owned(),
            Self::Hashed => {
                let digest = Sha256::digest(product.as_bytes());
                let mut bucket = [0u8; 8];
                bucket.copy_from_slice(&digest[..8]);
                let index = (u64::from_be_bytes(bucket) % CATEGORIES.len() as u64) as usize;
                CATEGORIES[index].to_owned()
            }
        }
    }
}

impl std::str::FromStr for CategoryFallback {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uncategorized" => Ok(Self::Uncategorized),
            "hashed" => Ok(Self::Hashed),
            other => {
                Err(format!("unsupported category fallback `{other}` (expected uncategorized|hashed)"))
            }
        }
    }
}

/// Parses the date column of a data row.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and ISO timestamps (`YYYY-MM-DDTHH:MM:SS`,
/// with or without a trailing offset); the time part is discarded.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp.date());
        }
    }

    chrono::DateTime::parse_from_rfc3339(value).ok().map(|timestamp| timestamp.date_naive())
}
