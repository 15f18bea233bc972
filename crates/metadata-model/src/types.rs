//! Core domain types for the recommendation engine.
//!
//! These mirror the entities in the data model: user preferences and history,
//! candidates as they move through discovery/enrichment/scoring, the derived
//! "content DNA" of a user's favorites, and the request/response shapes at the
//! recommendation endpoint.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Unique identifier for a movie or TV title, as assigned by the upstream
/// metadata API.
pub type MediaId = i64;

/// Genre identifiers are the upstream API's numeric genre ids (e.g. Action = 28).
pub type GenreId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `mediaType` request parameter: either a concrete type or "both".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTypeFilter {
    Movie,
    Tv,
    Both,
}

impl MediaTypeFilter {
    /// The concrete media types this filter expands to.
    pub fn expand(&self) -> &'static [MediaType] {
        match self {
            MediaTypeFilter::Movie => &[MediaType::Movie],
            MediaTypeFilter::Tv => &[MediaType::Tv],
            MediaTypeFilter::Both => &[MediaType::Movie, MediaType::Tv],
        }
    }
}

impl Default for MediaTypeFilter {
    fn default() -> Self {
        MediaTypeFilter::Both
    }
}

/// A deal-breaker tag a user can set to veto matching candidates outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DealBreaker {
    Violence,
    SexualContent,
    Profanity,
    SlowPace,
    Subtitles,
}

/// A discovery-strategy preference flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscoveryPreference {
    Trending,
    HiddenGems,
    AwardWinning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimePreference {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InternationalContentPreference {
    EnglishPreferred,
    VeryOpen,
}

/// Legacy free-text favorite-people fields, kept alongside the richer
/// favorites-DNA analysis as a fallback match source (§4.8 "Legacy fallback").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritePeople {
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub genre_ratings: HashMap<GenreId, u8>,
    #[serde(default)]
    pub deal_breakers: HashSet<DealBreaker>,
    #[serde(default)]
    pub favorite_content: Vec<String>,
    #[serde(default)]
    pub mood_preferences: Vec<String>,
    #[serde(default)]
    pub content_discovery_preference: HashSet<DiscoveryPreference>,
    pub runtime_preference: Option<RuntimePreference>,
    pub international_content_preference: Option<InternationalContentPreference>,
    #[serde(default)]
    pub favorite_people: FavoritePeople,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.genre_ratings.is_empty()
            && self.deal_breakers.is_empty()
            && self.favorite_content.is_empty()
            && self.mood_preferences.is_empty()
            && self.content_discovery_preference.is_empty()
            && self.runtime_preference.is_none()
            && self.international_content_preference.is_none()
            && self.favorite_people.actors.is_empty()
            && self.favorite_people.directors.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    /// Billing order; lower is more prominent. Used to take the top-10/top-5.
    pub order: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

/// A single favorited title, optionally enriched with full metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub media_id: MediaId,
    pub media_type: MediaType,
    pub title: String,
    /// Unix epoch seconds; `None` defaults to a temporal weight of 0.5.
    pub added_at: Option<i64>,
    #[serde(default)]
    pub genres: Vec<GenreId>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
}

impl FavoriteItem {
    /// Whether this favorite still needs a `detail` enrichment pass.
    pub fn needs_enrichment(&self) -> bool {
        self.cast.is_empty() && self.crew.is_empty() && self.genres.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub media_id: MediaId,
    pub media_type: MediaType,
    pub title: String,
    pub added_at: Option<i64>,
}

/// A normalized item emerging from a discovery strategy, possibly later
/// enriched with credits/keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: MediaId,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: u32,
    pub popularity: f64,
    pub release_date: Option<String>,
    pub original_language: String,
    pub adult: bool,
    pub genres: Vec<GenreId>,
    pub runtime: Option<u32>,
    /// Top-billed cast, at most 10.
    #[serde(default)]
    pub cast: Vec<CastMember>,
    /// At most 10 crew entries (directors are the ones scoring cares about).
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Candidate {
    pub fn directors(&self) -> impl Iterator<Item = &str> {
        self.crew
            .iter()
            .filter(|c| c.job.eq_ignore_ascii_case("director"))
            .map(|c| c.name.as_str())
    }

    pub fn release_year(&self) -> Option<u16> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok())
    }

    pub fn decade(&self) -> Option<u16> {
        self.release_year().map(|y| (y / 10) * 10)
    }

    pub fn is_enriched(&self) -> bool {
        !self.cast.is_empty() || !self.crew.is_empty() || !self.keywords.is_empty()
    }
}

/// Per-factor score breakdown, each clamped to [0, 100] except `deal_breaker`
/// which is either 0 or the veto sentinel -1000.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub genre: f64,
    pub deal_breaker: f64,
    pub semantic: f64,
    pub similarity: f64,
    pub context: f64,
    pub discovery: f64,
    pub quality: f64,
}

pub const DEAL_BREAKER_VETO: f64 = -1000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub recommendation_reason: String,
}

/// A ranked actor or director with its aggregated, temporally-weighted
/// frequency across a user's favorites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPerson {
    pub name: String,
    pub frequency: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatingPatterns {
    pub average: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

/// The derived, per-request aggregate of a user's favorites: not persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDna {
    pub preferred_actors: Vec<RankedPerson>,
    pub preferred_directors: Vec<RankedPerson>,
    pub genre_distribution: HashMap<GenreId, f64>,
    pub decade_preferences: HashMap<u16, f64>,
    pub rating_patterns: RatingPatterns,
}

/// A bundle of everything the Preference Store Adapter reads for one user.
#[derive(Debug, Clone, Default)]
pub struct UserBundle {
    pub preferences: UserPreferences,
    pub favorites: Vec<FavoriteItem>,
    pub watchlist: Vec<WatchlistItem>,
}

/// One fully processed recommendation, shaped for the response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponseItem {
    pub media_id: String,
    pub id: String,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<String>,
    pub popularity: f64,
    pub media_type: MediaType,
    /// Genre names joined by "|", matching the wire contract in §6.
    pub genres: String,
    pub score: f64,
    pub recommendation_reason: String,
    pub processing_time: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub items: Vec<RecommendationResponseItem>,
    pub source: String,
    pub user_preferences: UserPreferences,
}

/// A parsed, validated recommendation request. Exclude ids are canonicalized
/// to a `HashSet<MediaId>` at this boundary, resolving the open question in
/// spec §9 about mixed string/integer exclude representations.
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub media_type: MediaTypeFilter,
    pub exclude: HashSet<MediaId>,
    pub limit: u8,
    pub inline_preferences: Option<UserPreferences>,
}

/// One item written by the Scheduled Cache Populator (§4.11) into the
/// persistent, 7-day-TTL cache. `cache_key` is `category#mediaType#id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCacheItem {
    pub cache_key: String,
    pub content_id: MediaId,
    pub content_type: MediaType,
    pub category: String,
    pub candidate: Candidate,
    pub fetched_at: i64,
    pub expires_at: i64,
    pub source: String,
}

pub const HARD_CAP: u8 = 9;

impl RecommendationRequest {
    /// The effective result bound: `min(requestedLimit, hardCap=9)`.
    pub fn effective_limit(&self) -> u8 {
        self.limit.min(HARD_CAP).max(1)
    }
}
