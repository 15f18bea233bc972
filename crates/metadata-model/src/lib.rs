//! # metadata-model
//!
//! Shared data model for the recommendation engine: the user/favorites/
//! watchlist shapes the Preference Store Adapter reads, the `Candidate` as it
//! moves through discovery → enrichment → scoring, the derived content-DNA
//! aggregate, the request-scoped metadata cache, and the trait contracts for
//! the external preference/persistent-cache collaborators.

pub mod cache;
pub mod decay;
pub mod error;
pub mod store;
pub mod types;

pub use cache::RequestScopedCache;
pub use decay::temporal_weight;
pub use error::{RecommendationError, Result};
pub use store::{PersistentCache, PreferenceStore};
pub use types::{
    Candidate, CastMember, ContentDna, CrewMember, DealBreaker, DiscoveryPreference,
    FavoriteItem, FavoritePeople, GenreId, InternationalContentPreference, MediaId, MediaType,
    MediaTypeFilter, RankedPerson, RatingPatterns, RecommendationRequest, RecommendationResponse,
    RecommendationResponseItem, RuntimePreference, ScheduledCacheItem, ScoreBreakdown,
    ScoredCandidate, UserBundle, UserPreferences, WatchlistItem, DEAL_BREAKER_VETO, HARD_CAP,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn effective_limit_clamps_to_hard_cap() {
        let req = RecommendationRequest {
            user_id: "u1".to_string(),
            media_type: MediaTypeFilter::Both,
            exclude: HashSet::new(),
            limit: 50,
            inline_preferences: None,
        };
        assert_eq!(req.effective_limit(), HARD_CAP);
    }

    #[test]
    fn effective_limit_at_least_one() {
        let req = RecommendationRequest {
            user_id: "u1".to_string(),
            media_type: MediaTypeFilter::Movie,
            exclude: HashSet::new(),
            limit: 0,
            inline_preferences: None,
        };
        assert_eq!(req.effective_limit(), 1);
    }

    #[test]
    fn media_type_filter_both_expands_to_both_types() {
        assert_eq!(
            MediaTypeFilter::Both.expand(),
            &[MediaType::Movie, MediaType::Tv]
        );
    }

    #[test]
    fn candidate_decade_from_release_date() {
        let candidate = Candidate {
            id: 1,
            media_type: MediaType::Movie,
            title: "T".to_string(),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.0,
            vote_count: 100,
            popularity: 10.0,
            release_date: Some("1994-09-23".to_string()),
            original_language: "en".to_string(),
            adult: false,
            genres: vec![18],
            runtime: Some(142),
            cast: Vec::new(),
            crew: Vec::new(),
            keywords: Vec::new(),
        };
        assert_eq!(candidate.release_year(), Some(1994));
        assert_eq!(candidate.decade(), Some(1990));
    }
}
