//! Favorites-DNA Analyzer, aggregation steps only (§4.5 steps 2-4). Step 1
//! (enrichment of favorites lacking cast/crew/genres) is an upstream call
//! and lives in the `sources` crate; by the time a `FavoriteItem` reaches
//! `analyze`, it is expected to already be enriched where possible. This
//! step is pure and CPU-bound, per the concurrency model in §5.

use metadata_model::{temporal_weight, days_since, ContentDna, FavoriteItem, RankedPerson, RatingPatterns};
use std::collections::HashMap;

const TOP_CAST_PER_FAVORITE: usize = 5;
const TOP_PEOPLE_LIMIT: usize = 10;

/// Aggregates a user's favorites into their content DNA. An empty input
/// yields an all-empty DNA (§4.5).
pub fn analyze(favorites: &[FavoriteItem], now_unix: i64) -> ContentDna {
    if favorites.is_empty() {
        return ContentDna::default();
    }

    let mut actor_weights: HashMap<String, f64> = HashMap::new();
    let mut director_weights: HashMap<String, f64> = HashMap::new();
    let mut genre_weights: HashMap<u32, f64> = HashMap::new();
    let mut decade_weights: HashMap<u16, f64> = HashMap::new();

    let mut ratings = Vec::new();

    for favorite in favorites {
        let weight = temporal_weight(days_since(favorite.added_at, now_unix));

        for cast in favorite.cast.iter().take(TOP_CAST_PER_FAVORITE) {
            *actor_weights.entry(cast.name.clone()).or_insert(0.0) += weight;
        }
        for crew in favorite.crew.iter().filter(|c| c.job.eq_ignore_ascii_case("director")) {
            *director_weights.entry(crew.name.clone()).or_insert(0.0) += weight;
        }
        for genre in &favorite.genres {
            *genre_weights.entry(*genre).or_insert(0.0) += weight;
        }
        if let Some(decade) = decade_of(favorite.release_date.as_deref()) {
            *decade_weights.entry(decade).or_insert(0.0) += weight;
        }

        if let Some(vote_average) = favorite.vote_average {
            ratings.push(vote_average);
        }
    }

    ContentDna {
        preferred_actors: rank(actor_weights),
        preferred_directors: rank(director_weights),
        genre_distribution: round_map(genre_weights),
        decade_preferences: decade_weights.into_iter().map(|(k, v)| (k, round2(v))).collect(),
        rating_patterns: rating_patterns(&ratings),
    }
}

fn rank(weights: HashMap<String, f64>) -> Vec<RankedPerson> {
    let mut people: Vec<_> = weights
        .into_iter()
        .map(|(name, frequency)| RankedPerson {
            name,
            frequency: round2(frequency),
        })
        .collect();
    people.sort_by(|a, b| b.frequency.partial_cmp(&a.frequency).unwrap().then(a.name.cmp(&b.name)));
    people.truncate(TOP_PEOPLE_LIMIT);
    people
}

fn round_map(weights: HashMap<u32, f64>) -> HashMap<u32, f64> {
    weights.into_iter().map(|(k, v)| (k, round2(v))).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn decade_of(release_date: Option<&str>) -> Option<u16> {
    let year: u16 = release_date?.get(0..4)?.parse().ok()?;
    Some((year / 10) * 10)
}

fn rating_patterns(ratings: &[f64]) -> RatingPatterns {
    if ratings.is_empty() {
        return RatingPatterns::default();
    }
    let count = ratings.len();
    let sum: f64 = ratings.iter().sum();
    let min = ratings.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = ratings.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    RatingPatterns {
        average: sum / count as f64,
        count,
        min,
        max,
    }
}
