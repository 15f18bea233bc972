//! Scoring Engine (§4.8): a pure function of a candidate, the user's
//! preferences, their content DNA, favorites, and watchlist. CPU-bound only
//! — no suspension points here, per §5.

use crate::semantic::{extract_movie_text, extract_user_preference_text, similarity};
use metadata_model::{
    Candidate, ContentDna, DealBreaker, DiscoveryPreference, FavoriteItem, GenreId,
    InternationalContentPreference, RuntimePreference, ScoreBreakdown, ScoredCandidate,
    UserPreferences, WatchlistItem, DEAL_BREAKER_VETO,
};
use metadata_model::temporal_weight;
use rayon::prelude::*;
use std::collections::HashSet;

const WEIGHT_GENRE: f64 = 0.35;
const WEIGHT_SEMANTIC: f64 = 0.20;
const WEIGHT_SIMILARITY: f64 = 0.20;
const WEIGHT_CONTEXT: f64 = 0.10;
const WEIGHT_DISCOVERY: f64 = 0.10;
const WEIGHT_QUALITY: f64 = 0.05;

const VIOLENCE_GENRES: [GenreId; 4] = [28, 27, 53, 80];
const SLOW_PACE_GENRES: [GenreId; 3] = [18, 36, 99];

/// Only the favorites that fit within this cap are used for the direct
/// content-similarity bonus ("top-10 favorites" in §4.8); favorites beyond
/// it still contribute to the DNA aggregate upstream in §4.5.
const TOP_FAVORITES_FOR_SIMILARITY: usize = 10;

pub struct ScoringInputs<'a> {
    pub preferences: &'a UserPreferences,
    pub dna: &'a ContentDna,
    pub favorites: &'a [FavoriteItem],
    pub watchlist: &'a [WatchlistItem],
    pub now_unix: i64,
}

/// Scores one candidate. `genre_names` resolves a genre id to its display
/// name, used both for the semantic text extraction and the recommendation
/// reason.
pub fn score_candidate(
    candidate: &Candidate,
    inputs: &ScoringInputs,
    genre_names: &dyn Fn(GenreId) -> Option<&'static str>,
) -> ScoredCandidate {
    if let Some(tag) = deal_breaker_veto(candidate, inputs.preferences) {
        return ScoredCandidate {
            candidate: candidate.clone(),
            score: DEAL_BREAKER_VETO,
            score_breakdown: ScoreBreakdown {
                deal_breaker: DEAL_BREAKER_VETO,
                ..Default::default()
            },
            recommendation_reason: format!("vetoed:{tag}"),
        };
    }

    let genre = genre_factor(candidate, inputs.preferences);
    let semantic = semantic_factor(candidate, inputs, genre_names);
    let sim = similarity_factor(candidate, inputs);
    let context = context_factor(candidate, inputs.preferences);
    let discovery = discovery_factor(candidate, inputs.preferences);
    let quality = quality_factor(candidate);

    let breakdown = ScoreBreakdown {
        genre,
        deal_breaker: 0.0,
        semantic,
        similarity: sim,
        context,
        discovery,
        quality,
    };

    let score = WEIGHT_GENRE * genre
        + WEIGHT_SEMANTIC * semantic
        + WEIGHT_SIMILARITY * sim
        + WEIGHT_CONTEXT * context
        + WEIGHT_DISCOVERY * discovery
        + WEIGHT_QUALITY * quality;

    ScoredCandidate {
        candidate: candidate.clone(),
        score,
        score_breakdown: breakdown,
        recommendation_reason: recommendation_reason(candidate, &breakdown, genre_names, inputs.preferences),
    }
}

/// Scores every candidate in parallel (§5: "per-candidate scoring" is
/// CPU-bound fan-out, so this uses rayon rather than an async task pool).
pub fn score_all(
    candidates: &[Candidate],
    inputs: &ScoringInputs,
    genre_names: &(dyn Fn(GenreId) -> Option<&'static str> + Sync),
) -> Vec<ScoredCandidate> {
    candidates
        .par_iter()
        .map(|candidate| score_candidate(candidate, inputs, genre_names))
        .collect()
}

fn deal_breaker_veto(candidate: &Candidate, preferences: &UserPreferences) -> Option<&'static str> {
    let has_violence_genre = candidate.genres.iter().any(|g| VIOLENCE_GENRES.contains(g));
    let has_slow_pace_genre = candidate.genres.iter().any(|g| SLOW_PACE_GENRES.contains(g));

    if preferences.deal_breakers.contains(&DealBreaker::Violence)
        && has_violence_genre
        && candidate.vote_average > 7.0
    {
        return Some("violence");
    }
    if preferences.deal_breakers.contains(&DealBreaker::SexualContent) && candidate.adult {
        return Some("sexualContent");
    }
    if preferences.deal_breakers.contains(&DealBreaker::Profanity) && candidate.adult {
        return Some("profanity");
    }
    if preferences.deal_breakers.contains(&DealBreaker::SlowPace)
        && has_slow_pace_genre
        && candidate.runtime.is_some_and(|r| r > 150)
    {
        return Some("slowPace");
    }
    if preferences.deal_breakers.contains(&DealBreaker::Subtitles) && candidate.original_language != "en" {
        return Some("subtitles");
    }
    None
}

fn genre_factor(candidate: &Candidate, preferences: &UserPreferences) -> f64 {
    let ratings: Vec<f64> = candidate
        .genres
        .iter()
        .filter_map(|g| preferences.genre_ratings.get(g))
        .map(|&r| r as f64 * 10.0)
        .collect();
    if ratings.is_empty() {
        50.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    }
}

/// The "enhanced user profile" is built from the content DNA's top actors,
/// directors, and genre names; when that's too thin, the free-text
/// preference fields (§4.3 fallbackPrefText) stand in instead.
fn semantic_factor(
    candidate: &Candidate,
    inputs: &ScoringInputs,
    genre_names: &dyn Fn(GenreId) -> Option<&'static str>,
) -> f64 {
    let mut dna_text_parts: Vec<String> = Vec::new();
    dna_text_parts.extend(inputs.dna.preferred_actors.iter().map(|p| p.name.clone()));
    dna_text_parts.extend(inputs.dna.preferred_directors.iter().map(|p| p.name.clone()));
    dna_text_parts.extend(
        inputs
            .dna
            .genre_distribution
            .keys()
            .filter_map(|g| genre_names(*g))
            .map(str::to_string),
    );
    let dna_text = dna_text_parts.join(" ");

    let user_text = if dna_text.len() >= 10 {
        dna_text
    } else {
        extract_user_preference_text(inputs.preferences)
    };
    let movie_text = extract_movie_text(candidate, genre_names);

    if user_text.len() < 10 || movie_text.len() < 10 {
        return 50.0;
    }
    100.0 * similarity(&user_text, &movie_text)
}

fn similarity_factor(candidate: &Candidate, inputs: &ScoringInputs) -> f64 {
    let mut bonus = 0.0;

    if let Some(actor) = inputs
        .dna
        .preferred_actors
        .iter()
        .find(|a| candidate.cast.iter().any(|c| c.name == a.name))
    {
        bonus += (actor.frequency * 15.0).min(25.0);
    }

    if let Some(director) = inputs
        .dna
        .preferred_directors
        .iter()
        .find(|d| candidate.directors().any(|name| name == d.name))
    {
        bonus += (director.frequency * 20.0).min(35.0);
    }

    if !candidate.genres.is_empty() {
        let aligned: f64 = candidate
            .genres
            .iter()
            .filter_map(|g| inputs.dna.genre_distribution.get(g))
            .sum();
        bonus += (aligned * 10.0 / candidate.genres.len() as f64).min(20.0);
    }

    let top_favorites = inputs.favorites.iter().take(TOP_FAVORITES_FOR_SIMILARITY);
    let max_similarity = top_favorites
        .map(|fav| pairwise_content_similarity(candidate, fav))
        .fold(0.0_f64, f64::max);
    bonus += max_similarity * 25.0;

    let legacy = &inputs.preferences.favorite_people;
    if legacy
        .actors
        .iter()
        .any(|name| candidate.cast.iter().any(|c| c.name.eq_ignore_ascii_case(name)))
    {
        bonus += 20.0;
    }
    if legacy
        .directors
        .iter()
        .any(|name| candidate.directors().any(|d| d.eq_ignore_ascii_case(name)))
    {
        bonus += 25.0;
    }

    let watchlist_bonus: f64 = inputs
        .watchlist
        .iter()
        .filter_map(|item| {
            let sim = watchlist_content_similarity(candidate, item);
            if sim > 0.6 {
                let weight = temporal_weight(item.added_at.map(|ts| {
                    ((inputs.now_unix - ts).max(0) as f64) / 86_400.0
                }));
                Some(sim * 20.0 * weight)
            } else {
                None
            }
        })
        .sum::<f64>()
        .min(50.0);
    bonus += watchlist_bonus;

    bonus.clamp(0.0, 100.0)
}

/// `0.4 * genreJaccard + 0.3 * castOverlap + 0.3 * (shared director ? 1 : 0)`.
fn pairwise_content_similarity(candidate: &Candidate, favorite: &FavoriteItem) -> f64 {
    let genre_jaccard = jaccard(&candidate.genres, &favorite.genres);

    let candidate_cast: HashSet<&str> = candidate.cast.iter().take(10).map(|c| c.name.as_str()).collect();
    let favorite_cast: HashSet<&str> = favorite.cast.iter().take(10).map(|c| c.name.as_str()).collect();
    let cast_overlap = if candidate_cast.is_empty() || favorite_cast.is_empty() {
        0.0
    } else {
        let intersection = candidate_cast.intersection(&favorite_cast).count();
        let larger = candidate_cast.len().max(favorite_cast.len());
        intersection as f64 / larger as f64
    };

    let shared_director = candidate.directors().any(|name| {
        favorite
            .crew
            .iter()
            .any(|c| c.job.eq_ignore_ascii_case("director") && c.name == name)
    });

    0.4 * genre_jaccard + 0.3 * cast_overlap + 0.3 * if shared_director { 1.0 } else { 0.0 }
}

/// `WatchlistItem` carries only id/type/title/addedAt (§3) — no genre or
/// cast data — so its pairwise content-similarity degrades to title-text
/// similarity rather than the full genre/cast/director formula above.
fn watchlist_content_similarity(candidate: &Candidate, item: &WatchlistItem) -> f64 {
    if candidate.id == item.media_id {
        return 1.0;
    }
    similarity(&candidate.title, &item.title)
}

fn jaccard(a: &[GenreId], b: &[GenreId]) -> f64 {
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn runtime_bucket_matches(runtime: Option<u32>, preference: RuntimePreference) -> bool {
    match (runtime, preference) {
        (Some(r), RuntimePreference::Short) => r < 90,
        (Some(r), RuntimePreference::Medium) => (90..=120).contains(&r),
        (Some(r), RuntimePreference::Long) => r > 120,
        (None, _) => false,
    }
}

fn context_factor(candidate: &Candidate, preferences: &UserPreferences) -> f64 {
    let mut score = 0.0;
    if let Some(pref) = preferences.runtime_preference {
        if runtime_bucket_matches(candidate.runtime, pref) {
            score += 20.0;
        }
    }
    let is_english = candidate.original_language == "en";
    match preferences.international_content_preference {
        Some(InternationalContentPreference::EnglishPreferred) if is_english => score += 15.0,
        Some(InternationalContentPreference::VeryOpen) if !is_english => score += 15.0,
        _ => {}
    }
    score
}

fn discovery_factor(candidate: &Candidate, preferences: &UserPreferences) -> f64 {
    let mut score = 0.0;
    let wants = |flag: DiscoveryPreference| preferences.content_discovery_preference.contains(&flag);

    if candidate.popularity > 50.0 && wants(DiscoveryPreference::Trending) {
        score += 20.0;
    }
    if candidate.vote_count < 500 && candidate.vote_average > 7.0 && wants(DiscoveryPreference::HiddenGems) {
        score += 25.0;
    }
    if candidate.vote_average > 8.0 && candidate.vote_count > 1000 && wants(DiscoveryPreference::AwardWinning) {
        score += 30.0;
    }
    score
}

const QUALITY_PRIOR_COUNT: f64 = 25.0;
const QUALITY_PRIOR_MEAN: f64 = 6.0;

fn quality_factor(candidate: &Candidate) -> f64 {
    let n = candidate.vote_count as f64;
    let weighted = (n / (n + QUALITY_PRIOR_COUNT)) * candidate.vote_average
        + (QUALITY_PRIOR_COUNT / (n + QUALITY_PRIOR_COUNT)) * QUALITY_PRIOR_MEAN;
    (weighted * 10.0).clamp(0.0, 100.0)
}

fn recommendation_reason(
    candidate: &Candidate,
    breakdown: &ScoreBreakdown,
    genre_names: &dyn Fn(GenreId) -> Option<&'static str>,
    preferences: &UserPreferences,
) -> String {
    let mut reasons = Vec::new();

    if breakdown.genre > 70.0 {
        let names: Vec<&str> = candidate.genres.iter().filter_map(|g| genre_names(*g)).collect();
        if !names.is_empty() {
            reasons.push(names.join("/"));
        }
    }
    if breakdown.semantic > 70.0 {
        reasons.push("Matches your content preferences perfectly".to_string());
    } else if breakdown.semantic > 60.0 {
        reasons.push("Aligns well with your interests".to_string());
    }
    if breakdown.similarity > 70.0 {
        reasons.push("Similar to your favorites".to_string());
    }
    if breakdown.quality > 80.0 {
        reasons.push(format!("Highly rated ({:.1}/10)", candidate.vote_average));
    }
    if breakdown.discovery > 0.0 {
        if preferences.content_discovery_preference.contains(&DiscoveryPreference::Trending)
            && candidate.popularity > 50.0
        {
            reasons.push("Currently trending".to_string());
        }
        if preferences.content_discovery_preference.contains(&DiscoveryPreference::HiddenGems)
            && candidate.vote_count < 500
            && candidate.vote_average > 7.0
        {
            reasons.push("Hidden gem you might love".to_string());
        }
    }

    if reasons.is_empty() {
        "Personalized for you".to_string()
    } else {
        reasons.join(" • ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_model::MediaType;

    fn genre_names(id: GenreId) -> Option<&'static str> {
        match id {
            28 => Some("Action"),
            18 => Some("Drama"),
            _ => None,
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            id: 1,
            media_type: MediaType::Movie,
            title: "Test Movie".to_string(),
            overview: "An overview long enough to pass the floor".to_string(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.5,
            vote_count: 1200,
            popularity: 80.0,
            release_date: Some("2015-01-01".to_string()),
            original_language: "en".to_string(),
            adult: false,
            genres: vec![28],
            runtime: Some(110),
            cast: Vec::new(),
            crew: Vec::new(),
            keywords: Vec::new(),
        }
    }

    fn default_inputs(preferences: &UserPreferences, dna: &ContentDna) -> ScoringInputs<'_> {
        ScoringInputs {
            preferences,
            dna,
            favorites: &[],
            watchlist: &[],
            now_unix: 0,
        }
    }

    #[test]
    fn violence_deal_breaker_vetoes_high_rated_action() {
        let mut preferences = UserPreferences::default();
        preferences.deal_breakers.insert(DealBreaker::Violence);
        let dna = ContentDna::default();
        let inputs = default_inputs(&preferences, &dna);
        let scored = score_candidate(&candidate(), &inputs, &genre_names);
        assert_eq!(scored.score, DEAL_BREAKER_VETO);
    }

    #[test]
    fn subtitles_deal_breaker_vetoes_non_english() {
        let mut preferences = UserPreferences::default();
        preferences.deal_breakers.insert(DealBreaker::Subtitles);
        let dna = ContentDna::default();
        let inputs = default_inputs(&preferences, &dna);
        let mut c = candidate();
        c.original_language = "fr".to_string();
        c.vote_average = 5.0;
        let scored = score_candidate(&c, &inputs, &genre_names);
        assert_eq!(scored.score, DEAL_BREAKER_VETO);
    }

    #[test]
    fn genre_factor_defaults_to_fifty_without_ratings() {
        let preferences = UserPreferences::default();
        assert_eq!(genre_factor(&candidate(), &preferences), 50.0);
    }

    #[test]
    fn genre_factor_uses_rating_times_ten() {
        let mut preferences = UserPreferences::default();
        preferences.genre_ratings.insert(28, 8);
        assert_eq!(genre_factor(&candidate(), &preferences), 80.0);
    }

    #[test]
    fn quality_factor_shrinks_toward_prior_for_low_counts() {
        let mut c = candidate();
        c.vote_count = 0;
        c.vote_average = 10.0;
        assert_eq!(quality_factor(&c), 60.0);
    }

    #[test]
    fn no_veto_scores_sum_to_weighted_total() {
        let preferences = UserPreferences::default();
        let dna = ContentDna::default();
        let inputs = default_inputs(&preferences, &dna);
        let scored = score_candidate(&candidate(), &inputs, &genre_names);
        assert!(scored.score > 0.0);
        assert_ne!(scored.score, DEAL_BREAKER_VETO);
    }
}
