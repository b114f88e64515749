use std::collections::BTreeMap;

use crate::models::{
    BlendResult, BlendStats, CommonFilm, FilmKey, FilmRecord, RecommendedFilm, Recommendations,
    UserDataset,
};

const TOP_COMMON_LIMIT: usize = 15;
const FAVORITES_LIMIT: usize = 10;
const RECOMMENDATIONS_LIMIT: usize = 10;
const WATCHLIST_LIMIT: usize = 5;
const FAVORITE_THRESHOLD: f64 = 4.0;

type FilmIndex<'a> = BTreeMap<FilmKey, &'a FilmRecord>;

/// Compares two users' film data.
///
/// Films are matched by [`FilmKey`]. Display fields of shared films always come from
/// `a`. Indices are ordered by key and every sort is stable, so entries with equal
/// ratings come out in ascending key order and repeated calls give identical results.
pub fn blend(a: &UserDataset, b: &UserDataset) -> BlendResult {
    let ratings_a = index_by_key(&a.ratings);
    let ratings_b = index_by_key(&b.ratings);
    let watchlist_a = index_by_key(&a.watchlist);
    let watchlist_b = index_by_key(&b.watchlist);

    let mut common_watched = common_watched(&ratings_a, &ratings_b);

    let favorites: Vec<&CommonFilm> = common_watched
        .iter()
        .filter(|f| f.rating_a >= FAVORITE_THRESHOLD && f.rating_b >= FAVORITE_THRESHOLD)
        .collect();
    let total_common_favorites = favorites.len();
    let common_favorites: Vec<CommonFilm> = favorites
        .into_iter()
        .take(FAVORITES_LIMIT)
        .cloned()
        .collect();

    let common_watchlist: Vec<FilmRecord> = watchlist_a
        .iter()
        .filter(|(key, _)| watchlist_b.contains_key(*key))
        .take(WATCHLIST_LIMIT)
        .map(|(_, film)| (*film).clone())
        .collect();

    let stats = BlendStats {
        total_common_watched: common_watched.len(),
        total_common_favorites,
        total_common_watchlist: common_watchlist.len(),
        user_a_rated_count: ratings_a.len(),
        user_b_rated_count: ratings_b.len(),
    };

    common_watched.truncate(TOP_COMMON_LIMIT);

    BlendResult {
        top_common_films: common_watched,
        common_favorites,
        recommendations: Recommendations {
            for_a: recommend(&ratings_b, &ratings_a),
            for_b: recommend(&ratings_a, &ratings_b),
        },
        common_watchlist,
        stats,
    }
}

/// Later records overwrite earlier ones with the same key
fn index_by_key(films: &[FilmRecord]) -> FilmIndex<'_> {
    let mut index = FilmIndex::new();
    for film in films {
        index.insert(film.key(), film);
    }
    index
}

/// All films rated by both users, best average first
fn common_watched(ratings_a: &FilmIndex<'_>, ratings_b: &FilmIndex<'_>) -> Vec<CommonFilm> {
    let mut common: Vec<CommonFilm> = ratings_a
        .iter()
        .filter_map(|(key, film_a)| {
            let film_b = ratings_b.get(key)?;
            let rating_a = film_a.rating_or_zero();
            let rating_b = film_b.rating_or_zero();

            Some(CommonFilm {
                title: film_a.title.clone(),
                year: film_a.year.clone(),
                uri: film_a.uri.clone(),
                rating_a,
                rating_b,
                avg_rating: rating_a / 2.0 + rating_b / 2.0,
            })
        })
        .collect();

    common.sort_by(|x, y| y.avg_rating.total_cmp(&x.avg_rating));
    common
}

/// Films `source` rated at least 4.0 that `target` has not rated
fn recommend(source: &FilmIndex<'_>, target: &FilmIndex<'_>) -> Vec<RecommendedFilm> {
    let mut picks: Vec<RecommendedFilm> = source
        .iter()
        .filter(|(key, _)| !target.contains_key(*key))
        .map(|(_, film)| RecommendedFilm {
            title: film.title.clone(),
            year: film.year.clone(),
            uri: film.uri.clone(),
            rating: film.rating_or_zero(),
        })
        .filter(|film| film.rating >= FAVORITE_THRESHOLD)
        .collect();

    picks.sort_by(|x, y| y.rating.total_cmp(&x.rating));
    picks.truncate(RECOMMENDATIONS_LIMIT);
    picks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(title: &str, year: &str, rating: f64) -> FilmRecord {
        FilmRecord::new(title, Some(year)).with_rating(rating)
    }

    fn dataset(ratings: Vec<FilmRecord>) -> UserDataset {
        UserDataset {
            ratings,
            ..UserDataset::default()
        }
    }

    fn with_watchlist(mut data: UserDataset, titles: &[&str]) -> UserDataset {
        data.watchlist = titles
            .iter()
            .map(|t| FilmRecord::new(*t, Some("2000")))
            .collect();
        data
    }

    /// `count` films rated `rating`, titled with a shared prefix
    fn many(prefix: &str, count: usize, rating: f64) -> Vec<FilmRecord> {
        (0..count)
            .map(|i| rated(&format!("{} {:02}", prefix, i), "2000", rating))
            .collect()
    }

    #[test]
    fn test_empty_datasets() {
        let result = blend(&UserDataset::default(), &UserDataset::default());
        assert_eq!(result, BlendResult::default());
    }

    #[test]
    fn test_disjoint_users() {
        let a = dataset(vec![rated("X", "2001", 5.0)]);
        let b = dataset(vec![rated("Y", "2002", 5.0)]);

        let result = blend(&a, &b);

        assert!(result.top_common_films.is_empty());
        assert_eq!(result.stats.total_common_watched, 0);
        assert_eq!(result.recommendations.for_a.len(), 1);
        assert_eq!(result.recommendations.for_a[0].title, "Y");
        assert_eq!(result.recommendations.for_a[0].rating, 5.0);
        assert_eq!(result.recommendations.for_b.len(), 1);
        assert_eq!(result.recommendations.for_b[0].title, "X");
    }

    #[test]
    fn test_exact_overlap() {
        let a = dataset(vec![rated("Arrival", "2016", 4.5)]);
        let b = dataset(vec![rated("arrival", "2016", 5.0)]);

        let result = blend(&a, &b);

        assert_eq!(result.top_common_films.len(), 1);
        let film = &result.top_common_films[0];
        assert_eq!(film.title, "Arrival");
        assert_eq!(film.rating_a, 4.5);
        assert_eq!(film.rating_b, 5.0);
        assert_eq!(film.avg_rating, 4.75);
        assert_eq!(result.common_favorites, result.top_common_films);
        assert!(result.recommendations.for_a.is_empty());
        assert!(result.recommendations.for_b.is_empty());
    }

    #[test]
    fn test_display_fields_come_from_first_user() {
        let a = dataset(vec![rated("Arrival", "2016", 4.5).with_uri("a://arrival")]);
        let b = dataset(vec![rated("ARRIVAL!", "2016", 5.0).with_uri("b://arrival")]);

        let ab = blend(&a, &b);
        let ba = blend(&b, &a);

        assert_eq!(ab.top_common_films[0].title, "Arrival");
        assert_eq!(ab.top_common_films[0].uri.as_deref(), Some("a://arrival"));
        assert_eq!(ba.top_common_films[0].title, "ARRIVAL!");
        assert_eq!(ba.top_common_films[0].rating_a, 5.0);
    }

    #[test]
    fn test_below_favorite_threshold() {
        let a = dataset(vec![rated("Tenet", "2020", 3.5)]);
        let b = dataset(vec![rated("Tenet", "2020", 4.5)]);

        let result = blend(&a, &b);

        assert_eq!(result.top_common_films.len(), 1);
        assert_eq!(result.top_common_films[0].avg_rating, 4.0);
        assert!(result.common_favorites.is_empty());
        assert_eq!(result.stats.total_common_favorites, 0);
    }

    #[test]
    fn test_missing_rating_is_zero_and_never_favorite() {
        let a = dataset(vec![FilmRecord::new("Heat", Some("1995"))]);
        let b = dataset(vec![rated("Heat", "1995", 5.0)]);

        let result = blend(&a, &b);

        let film = &result.top_common_films[0];
        assert_eq!(film.rating_a, 0.0);
        assert_eq!(film.avg_rating, 2.5);
        assert!(result.common_favorites.is_empty());
    }

    #[test]
    fn test_unrated_films_are_not_recommended() {
        let a = dataset(vec![]);
        let b = dataset(vec![
            FilmRecord::new("Unrated", Some("2010")),
            rated("Liked", "2010", 4.0),
            rated("Meh", "2010", 3.5),
        ]);

        let result = blend(&a, &b);

        let titles: Vec<&str> = result
            .recommendations
            .for_a
            .iter()
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Liked"]);
    }

    #[test]
    fn test_sorted_by_average_descending() {
        let a = dataset(vec![
            rated("Low", "2000", 2.0),
            rated("High", "2000", 5.0),
            rated("Mid", "2000", 3.0),
        ]);
        let b = dataset(vec![
            rated("Mid", "2000", 4.0),
            rated("Low", "2000", 1.0),
            rated("High", "2000", 4.5),
        ]);

        let result = blend(&a, &b);

        let averages: Vec<f64> = result.top_common_films.iter().map(|f| f.avg_rating).collect();
        assert_eq!(averages, vec![4.75, 3.5, 1.5]);
    }

    #[test]
    fn test_ratings_outside_usual_scale() {
        let a = dataset(vec![
            rated("Loud", "2000", 7.0),
            rated("Sour", "2000", -1.0),
            rated("Flat", "2000", 0.0),
            rated("Mine", "2000", 9.5),
        ]);
        let b = dataset(vec![
            rated("Loud", "2000", 3.0),
            rated("Sour", "2000", 10.0),
            rated("Flat", "2000", 0.0),
            rated("Theirs", "2000", -3.0),
            rated("Huge", "2000", 12.0),
        ]);

        let result = blend(&a, &b);

        let averages: Vec<(&str, f64)> = result
            .top_common_films
            .iter()
            .map(|f| (f.title.as_str(), f.avg_rating))
            .collect();
        assert_eq!(averages, vec![("Loud", 5.0), ("Sour", 4.5), ("Flat", 0.0)]);
        assert!(result.common_favorites.is_empty());

        let for_a: Vec<&str> = result
            .recommendations
            .for_a
            .iter()
            .map(|f| f.title.as_str())
            .collect();
        assert_eq!(for_a, vec!["Huge"]);
        assert_eq!(result.recommendations.for_a[0].rating, 12.0);
        assert_eq!(result.recommendations.for_b[0].title, "Mine");
        assert_eq!(result.recommendations.for_b[0].rating, 9.5);
    }

    #[test]
    fn test_extreme_ratings_average_without_overflow() {
        let a = dataset(vec![rated("Big", "2000", f64::MAX)]);
        let b = dataset(vec![
            rated("Big", "2000", f64::MAX),
            rated("Endless", "2000", f64::INFINITY),
        ]);

        let result = blend(&a, &b);

        assert_eq!(result.top_common_films[0].avg_rating, f64::MAX);
        assert_eq!(result.common_favorites.len(), 1);
        assert!(result.recommendations.for_a.is_empty());
    }

    #[test]
    fn test_ties_ordered_by_key() {
        let a = dataset(vec![rated("Zodiac", "2007", 4.0), rated("Alien", "1979", 4.0)]);
        let b = dataset(vec![rated("Alien", "1979", 4.0), rated("Zodiac", "2007", 4.0)]);

        let result = blend(&a, &b);

        assert_eq!(result.top_common_films[0].title, "Alien");
        assert_eq!(result.top_common_films[1].title, "Zodiac");
    }

    #[test]
    fn test_bounds_enforced_and_stats_count_full_lists() {
        let shared = many("Shared", 20, 4.5);
        let mut a = shared.clone();
        a.extend(many("Only A", 12, 5.0));
        let mut b = shared;
        b.extend(many("Only B", 12, 4.0));

        let watchlist: Vec<String> = (0..8).map(|i| format!("Wish {}", i)).collect();
        let watchlist: Vec<&str> = watchlist.iter().map(String::as_str).collect();
        let a = with_watchlist(dataset(a), &watchlist);
        let b = with_watchlist(dataset(b), &watchlist);

        let result = blend(&a, &b);

        assert_eq!(result.top_common_films.len(), 15);
        assert_eq!(result.common_favorites.len(), 10);
        assert_eq!(result.recommendations.for_a.len(), 10);
        assert_eq!(result.recommendations.for_b.len(), 10);
        assert_eq!(result.common_watchlist.len(), 5);

        assert_eq!(result.stats.total_common_watched, 20);
        assert_eq!(result.stats.total_common_favorites, 20);
        assert_eq!(result.stats.total_common_watchlist, 5);
        assert_eq!(result.stats.user_a_rated_count, 32);
        assert_eq!(result.stats.user_b_rated_count, 32);
    }

    #[test]
    fn test_favorites_are_subset_of_common_watched() {
        let a = dataset(vec![
            rated("A", "1", 4.0),
            rated("B", "2", 5.0),
            rated("C", "3", 3.0),
            rated("D", "4", 4.5),
        ]);
        let b = dataset(vec![
            rated("A", "1", 4.0),
            rated("B", "2", 3.5),
            rated("C", "3", 5.0),
            rated("D", "4", 5.0),
        ]);

        let result = blend(&a, &b);

        assert_eq!(result.common_favorites.len(), 2);
        for favorite in &result.common_favorites {
            assert!(result.top_common_films.contains(favorite));
            assert!(favorite.rating_a >= 4.0 && favorite.rating_b >= 4.0);
        }
        assert_eq!(result.common_favorites[0].title, "D");
    }

    #[test]
    fn test_duplicate_keys_last_record_wins() {
        let a = dataset(vec![
            rated("Solaris", "1972", 2.0),
            rated("SOLARIS", "1972", 5.0),
        ]);
        let b = dataset(vec![rated("Solaris", "1972", 5.0)]);

        let result = blend(&a, &b);

        assert_eq!(result.stats.user_a_rated_count, 1);
        assert_eq!(result.top_common_films.len(), 1);
        assert_eq!(result.top_common_films[0].title, "SOLARIS");
        assert_eq!(result.top_common_films[0].rating_a, 5.0);
    }

    #[test]
    fn test_same_title_different_year_not_matched() {
        let a = dataset(vec![rated("Dune", "1984", 4.0)]);
        let b = dataset(vec![rated("Dune", "2021", 4.0)]);

        let result = blend(&a, &b);

        assert!(result.top_common_films.is_empty());
        assert_eq!(result.recommendations.for_a[0].year.as_deref(), Some("2021"));
    }

    #[test]
    fn test_common_watchlist_uses_first_user_records() {
        let mut a = with_watchlist(UserDataset::default(), &["Past Lives", "Aftersun"]);
        a.watchlist[0].uri = Some("a://past-lives".to_string());
        let b = with_watchlist(UserDataset::default(), &["past lives", "Perfect Days"]);

        let result = blend(&a, &b);

        assert_eq!(result.common_watchlist.len(), 1);
        assert_eq!(result.common_watchlist[0].title, "Past Lives");
        assert_eq!(
            result.common_watchlist[0].uri.as_deref(),
            Some("a://past-lives")
        );
        assert_eq!(result.stats.total_common_watchlist, 1);
    }

    #[test]
    fn test_watched_table_is_ignored() {
        let mut a = dataset(vec![]);
        a.watched = vec![FilmRecord::new("Heat", Some("1995"))];
        let b = dataset(vec![rated("Heat", "1995", 5.0)]);

        let result = blend(&a, &b);

        assert!(result.top_common_films.is_empty());
        assert_eq!(result.recommendations.for_a.len(), 1);
    }

    #[test]
    fn test_swapping_users_swaps_recommendations() {
        let a = dataset(vec![
            rated("Shared", "2000", 4.0),
            rated("A1", "2000", 4.5),
            rated("A2", "2000", 5.0),
        ]);
        let b = dataset(vec![rated("Shared", "2000", 3.0), rated("B1", "2000", 4.0)]);

        let ab = blend(&a, &b);
        let ba = blend(&b, &a);

        assert_eq!(ab.recommendations.for_a, ba.recommendations.for_b);
        assert_eq!(ab.recommendations.for_b, ba.recommendations.for_a);
        assert_eq!(ab.stats.total_common_watched, ba.stats.total_common_watched);
    }

    #[test]
    fn test_blend_is_deterministic() {
        let a = dataset(many("Film", 30, 4.0));
        let b = dataset(many("Film", 30, 4.5));

        assert_eq!(blend(&a, &b), blend(&a, &b));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let a = dataset(vec![rated("X", "1", 5.0), rated("x", "1", 1.0)]);
        let b = dataset(vec![rated("X", "1", 5.0)]);
        let (a_before, b_before) = (a.clone(), b.clone());

        blend(&a, &b);

        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }
}
