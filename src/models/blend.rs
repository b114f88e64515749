use serde::{Deserialize, Serialize};

use super::FilmRecord;

/// A film both users rated, with display fields taken from the first user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommonFilm {
    pub title: String,
    pub year: Option<String>,
    pub uri: Option<String>,
    pub rating_a: f64,
    pub rating_b: f64,
    pub avg_rating: f64,
}

/// A highly rated film from one user that the other has not rated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFilm {
    pub title: String,
    pub year: Option<String>,
    pub uri: Option<String>,
    pub rating: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    /// Films the second user loved that the first has not rated
    pub for_a: Vec<RecommendedFilm>,
    /// Films the first user loved that the second has not rated
    pub for_b: Vec<RecommendedFilm>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlendStats {
    pub total_common_watched: usize,
    pub total_common_favorites: usize,
    /// Size of the returned watchlist overlap, not of the full intersection
    pub total_common_watchlist: usize,
    pub user_a_rated_count: usize,
    pub user_b_rated_count: usize,
}

/// Comparison of two users' film data
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlendResult {
    pub top_common_films: Vec<CommonFilm>,
    pub common_favorites: Vec<CommonFilm>,
    pub recommendations: Recommendations,
    pub common_watchlist: Vec<FilmRecord>,
    pub stats: BlendStats,
}
