use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

/// One row from a user's exported tables
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilmRecord {
    /// Film title as exported (casing and punctuation preserved)
    #[serde(default)]
    pub title: String,
    /// Release year, kept as text
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: Option<String>,
    /// External reference for the film
    #[serde(default)]
    pub uri: Option<String>,
    /// Star rating, only present for rows from the ratings table
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    /// Date logged, only present for rows from the watched table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watched_date: Option<String>,
}

impl FilmRecord {
    /// Creates a record with only a title and year
    pub fn new(title: impl Into<String>, year: Option<&str>) -> Self {
        Self {
            title: title.into(),
            year: year.map(str::to_string),
            ..Self::default()
        }
    }

    /// Sets the rating
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Sets the external reference
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Matching identity of this record
    pub fn key(&self) -> FilmKey {
        FilmKey::new(&self.title, self.year.as_deref())
    }

    /// Rating as a number, with missing or non-finite values treated as zero.
    ///
    /// Any finite value passes through unchanged, whatever its range. Infinities and
    /// NaN become zero since JSON responses cannot carry them.
    pub fn rating_or_zero(&self) -> f64 {
        match self.rating {
            Some(rating) if rating.is_finite() => rating,
            _ => 0.0,
        }
    }
}

/// Per-user collection of exported films, partitioned by source table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserDataset {
    #[serde(default)]
    pub ratings: Vec<FilmRecord>,
    #[serde(default)]
    pub watched: Vec<FilmRecord>,
    #[serde(default)]
    pub watchlist: Vec<FilmRecord>,
}

/// Heuristic identity used to match films across two datasets.
///
/// Built from the title lowercased and stripped to `[a-z0-9]`, followed by `_` and
/// the trimmed year. Distinct films may collide; they are then treated as the same.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilmKey(String);

impl FilmKey {
    pub fn new(title: &str, year: Option<&str>) -> Self {
        let year = year.map(str::trim).unwrap_or_default();
        Self(format!("{}_{}", normalize_title(title), year))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FilmKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercases a title and drops everything but ASCII letters and digits
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Parses a rating cell; blank or non-numeric text yields `None`
pub fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|r| r.is_finite())
}

/// Stored documents may carry ratings as numbers, strings, or null
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseValue::Number(n)) if n.is_finite() => Some(n),
        Some(LooseValue::Text(s)) => parse_rating(&s),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseValue::Text(s)) => Some(s),
        Some(LooseValue::Number(n)) if n.fract() == 0.0 => Some(format!("{}", n as i64)),
        Some(LooseValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
