//! Integration tests for the pipeline crate.
//!
//! These exercise the favorites-DNA analyzer, the scoring engine, and the
//! diversity selector together against a realistic candidate set, the way
//! the orchestrator chains them in a single request.

use metadata_model::{
    CastMember, Candidate, ContentDna, CrewMember, DealBreaker, FavoriteItem, MediaType,
    UserPreferences,
};
use pipeline::{analyze, score_all, select_diverse, ScoringInputs};

fn genre_name(id: u32) -> Option<&'static str> {
    match id {
        28 => Some("Action"),
        18 => Some("Drama"),
        35 => Some("Comedy"),
        27 => Some("Horror"),
        _ => None,
    }
}

fn candidate(id: i64, genre: u32, year: &str, vote_average: f64, vote_count: u32) -> Candidate {
    Candidate {
        id,
        media_type: MediaType::Movie,
        title: format!("Movie {id}"),
        overview: "A gripping tale of adventure, loss, and redemption".to_string(),
        poster_path: None,
        backdrop_path: None,
        vote_average,
        vote_count,
        popularity: 60.0,
        release_date: Some(format!("{year}-06-01")),
        original_language: "en".to_string(),
        adult: false,
        genres: vec![genre],
        runtime: Some(110),
        cast: vec![CastMember { name: "Keanu Reeves".to_string(), order: 0 }],
        crew: vec![CrewMember { name: "Lana Wachowski".to_string(), job: "Director".to_string() }],
        keywords: Vec::new(),
    }
}

fn favorite() -> FavoriteItem {
    FavoriteItem {
        media_id: 603,
        media_type: MediaType::Movie,
        title: "The Matrix".to_string(),
        added_at: Some(1_700_000_000 - 7 * 86_400),
        genres: vec![28],
        cast: vec![CastMember { name: "Keanu Reeves".to_string(), order: 0 }],
        crew: vec![CrewMember { name: "Lana Wachowski".to_string(), job: "Director".to_string() }],
        vote_average: Some(8.2),
        release_date: Some("1999-03-31".to_string()),
    }
}

/// Scores a realistic candidate set — some matching the user's favorite
/// actor/director, one vetoed by a deal-breaker, several spanning genres and
/// decades — then runs the diversity selector, as the orchestrator would.
#[test]
fn scoring_and_diversity_selection_end_to_end() {
    let favorites = vec![favorite()];
    let now_unix = 1_700_000_000;
    let dna = analyze(&favorites, now_unix);

    let mut preferences = UserPreferences::default();
    preferences.genre_ratings.insert(28, 9);
    preferences.deal_breakers.insert(DealBreaker::Violence);

    let candidates = vec![
        candidate(1, 28, "2015", 7.5, 1200),  // shares actor+director with the favorite
        candidate(2, 18, "1995", 7.0, 800),   // different genre/decade, no overlap
        candidate(3, 35, "2020", 6.5, 300),   // comedy, recent
        candidate(4, 27, "2018", 8.5, 2000),  // horror with high rating -> vetoed
    ];

    let inputs = ScoringInputs {
        preferences: &preferences,
        dna: &dna,
        favorites: &favorites,
        watchlist: &[],
        now_unix,
    };

    let scored = score_all(&candidates, &inputs, &genre_name);
    assert_eq!(scored.len(), 4);

    let vetoed = scored.iter().find(|s| s.candidate.id == 4).unwrap();
    assert_eq!(vetoed.score, metadata_model::DEAL_BREAKER_VETO);

    let favorite_match = scored.iter().find(|s| s.candidate.id == 1).unwrap();
    assert!(
        favorite_match.score_breakdown.similarity > 0.0,
        "candidate sharing the favorite's actor and director should get a similarity bonus"
    );

    let mut ranked: Vec<_> = scored.into_iter().filter(|s| s.score > -500.0).collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    assert_eq!(ranked.len(), 3, "the vetoed horror candidate must not reach selection");

    let selected = select_diverse(&ranked, 3);
    assert_eq!(selected.len(), 3);
    assert!(selected.iter().all(|s| s.candidate.id != 4));
}

#[test]
fn empty_favorites_and_preferences_still_yields_a_sane_ranking() {
    let preferences = UserPreferences::default();
    let dna = ContentDna::default();
    let candidates = vec![
        candidate(1, 28, "2015", 7.5, 1200),
        candidate(2, 18, "1995", 7.0, 800),
    ];

    let inputs = ScoringInputs {
        preferences: &preferences,
        dna: &dna,
        favorites: &[],
        watchlist: &[],
        now_unix: 1_700_000_000,
    };

    let scored = score_all(&candidates, &inputs, &genre_name);
    assert!(scored.iter().all(|s| s.score > 0.0));

    let mut ranked = scored;
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    let selected = select_diverse(&ranked, 2);
    assert_eq!(selected.len(), 2);
}
