//! The Candidate Discoverer (§4.6): fans out across discovery strategies in
//! parallel, normalizes their hits into `Candidate`s, deduplicates by id, and
//! stops once `maxCandidates` is reached (insertion order wins for the cap).

use std::collections::{HashMap, HashSet};
use std::future::Future;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use metadata_client::{DiscoverParams, MetadataClient, MetadataClientError, SortBy, TrendingScope};
use metadata_model::{
    Candidate, DiscoveryPreference, GenreId, MediaId, MediaType, MediaTypeFilter, UserPreferences,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

/// Candidate set is bounded at this size regardless of how many strategies
/// fire; insertion order (the order strategies' results are merged in)
/// decides who gets in when the cap is hit.
pub const MAX_CANDIDATES: usize = 80;

const SIMILAR_TOP_N: usize = 10;
const TOP_GENRE_COUNT: usize = 5;
const HIDDEN_GEMS_VOTE_COUNT_MIN: u32 = 50;
const HIDDEN_GEMS_VOTE_COUNT_MAX: u32 = 500;
const AWARD_WINNING_VOTE_COUNT_MIN: u32 = 1000;

pub struct Discoverer {
    client: Arc<MetadataClient>,
}

impl Discoverer {
    pub fn new(client: Arc<MetadataClient>) -> Self {
        Self { client }
    }

    /// Runs every applicable strategy in parallel (expanded over both media
    /// types when `media_filter` is `Both`), drops excluded ids, dedups by
    /// id, and caps the result at `MAX_CANDIDATES`.
    #[instrument(skip(self, preferences, exclude, cancel))]
    pub async fn discover(
        &self,
        media_filter: MediaTypeFilter,
        preferences: &UserPreferences,
        exclude: &HashSet<MediaId>,
        cancel: &CancellationToken,
    ) -> Vec<Candidate> {
        let mut tasks: Vec<BoxFuture<'static, Vec<Candidate>>> = Vec::new();

        for &media_type in media_filter.expand() {
            if !preferences.genre_ratings.is_empty() {
                for genre in top_genres(&preferences.genre_ratings, TOP_GENRE_COUNT) {
                    tasks.push(
                        spawn(genre_strategy(self.client.clone(), media_type, genre, cancel.clone())),
                    );
                }
            }

            for title in preferences.favorite_content.iter().take(3) {
                tasks.push(spawn(similar_to_favorite_strategy(
                    self.client.clone(),
                    media_type,
                    title.clone(),
                    cancel.clone(),
                )));
            }

            if preferences
                .content_discovery_preference
                .contains(&DiscoveryPreference::Trending)
            {
                tasks.push(spawn(trending_strategy(self.client.clone(), media_type, cancel.clone())));
            }
            if preferences
                .content_discovery_preference
                .contains(&DiscoveryPreference::HiddenGems)
            {
                tasks.push(spawn(hidden_gems_strategy(
                    self.client.clone(),
                    media_type,
                    cancel.clone(),
                )));
            }
            if preferences
                .content_discovery_preference
                .contains(&DiscoveryPreference::AwardWinning)
            {
                tasks.push(spawn(award_winning_strategy(
                    self.client.clone(),
                    media_type,
                    cancel.clone(),
                )));
            }

            // Always-on fallback so the caller never ends up empty-handed
            // just because no discovery preferences were set.
            tasks.push(spawn(popular_strategy(self.client.clone(), media_type, cancel.clone())));
        }

        let batches = join_all(tasks).await;
        dedup_and_cap(batches, exclude)
    }
}

fn spawn(fut: impl Future<Output = Vec<Candidate>> + Send + 'static) -> BoxFuture<'static, Vec<Candidate>> {
    fut.boxed()
}

fn dedup_and_cap(batches: Vec<Vec<Candidate>>, exclude: &HashSet<MediaId>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for batch in batches {
        for candidate in batch {
            if out.len() >= MAX_CANDIDATES {
                return out;
            }
            if exclude.contains(&candidate.id) {
                continue;
            }
            if !seen.insert(candidate.id) {
                continue;
            }
            out.push(candidate);
        }
    }
    out
}

fn top_genres(ratings: &HashMap<GenreId, u8>, n: usize) -> Vec<GenreId> {
    let mut pairs: Vec<_> = ratings.iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    pairs.into_iter().take(n).map(|(genre, _)| *genre).collect()
}

fn trending_scope(media_type: MediaType) -> TrendingScope {
    match media_type {
        MediaType::Movie => TrendingScope::Movie,
        MediaType::Tv => TrendingScope::Tv,
    }
}

async fn run_or_empty<F>(label: &str, fut: F) -> Vec<Candidate>
where
    F: Future<Output = Result<Vec<Candidate>, MetadataClientError>>,
{
    match fut.await {
        Ok(candidates) => candidates,
        Err(error) => {
            warn!(strategy = label, %error, "discovery strategy failed, contributing no candidates");
            Vec::new()
        }
    }
}

async fn genre_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    genre: GenreId,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let params = DiscoverParams {
        with_genres: Some(vec![genre]),
        page: 1,
        sort_by: SortBy::PopularityDesc,
        vote_count_gte: None,
        vote_count_lte: None,
    };
    run_or_empty("top_rated_genre", client.discover(media_type, params, &cancel)).await
}

async fn trending_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let scope = trending_scope(media_type);
    let mut out = Vec::new();
    for page in 1..=2u32 {
        out.extend(run_or_empty("trending", client.trending(scope, page, &cancel)).await);
    }
    out
}

async fn hidden_gems_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for page in 1..=2u32 {
        let params = DiscoverParams {
            with_genres: None,
            page,
            sort_by: SortBy::VoteAverageDesc,
            vote_count_gte: Some(HIDDEN_GEMS_VOTE_COUNT_MIN),
            vote_count_lte: Some(HIDDEN_GEMS_VOTE_COUNT_MAX),
        };
        out.extend(run_or_empty("hidden_gems", client.discover(media_type, params, &cancel)).await);
    }
    out
}

async fn award_winning_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for page in 1..=2u32 {
        let params = DiscoverParams {
            with_genres: None,
            page,
            sort_by: SortBy::VoteAverageDesc,
            vote_count_gte: Some(AWARD_WINNING_VOTE_COUNT_MIN),
            vote_count_lte: None,
        };
        out.extend(run_or_empty("award_winning", client.discover(media_type, params, &cancel)).await);
    }
    out
}

async fn popular_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for page in 1..=3u32 {
        out.extend(run_or_empty("popular", client.popular(media_type, page, &cancel)).await);
    }
    out
}

async fn similar_to_favorite_strategy(
    client: Arc<MetadataClient>,
    media_type: MediaType,
    title: String,
    cancel: CancellationToken,
) -> Vec<Candidate> {
    let hit = match client.search(media_type, &title, &cancel).await {
        Ok(Some(hit)) => hit,
        Ok(None) => return Vec::new(),
        Err(error) => {
            warn!(strategy = "similar_to_favorite", %error, title, "search failed");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    out.extend(
        run_or_empty("similar_to_favorite:similar", client.similar(media_type, hit.id, &cancel))
            .await
            .into_iter()
            .take(SIMILAR_TOP_N),
    );
    out.extend(
        run_or_empty(
            "similar_to_favorite:recommendations",
            client.recommendations(media_type, hit.id, &cancel),
        )
        .await
        .into_iter()
        .take(SIMILAR_TOP_N),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: MediaId) -> Candidate {
        Candidate {
            id,
            media_type: MediaType::Movie,
            title: format!("title-{id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average: 7.0,
            vote_count: 100,
            popularity: 10.0,
            release_date: None,
            original_language: "en".to_string(),
            adult: false,
            genres: Vec::new(),
            runtime: None,
            cast: Vec::new(),
            crew: Vec::new(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn dedup_and_cap_preserves_first_insertion_order() {
        let batches = vec![vec![candidate(1), candidate(2)], vec![candidate(2), candidate(3)]];
        let out = dedup_and_cap(batches, &HashSet::new());
        let ids: Vec<_> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn dedup_and_cap_drops_excluded_ids() {
        let batches = vec![vec![candidate(1), candidate(2), candidate(3)]];
        let mut exclude = HashSet::new();
        exclude.insert(2);
        let out = dedup_and_cap(batches, &exclude);
        let ids: Vec<_> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn dedup_and_cap_stops_at_max_candidates() {
        let batch: Vec<_> = (0..(MAX_CANDIDATES as i64 + 20)).map(candidate).collect();
        let out = dedup_and_cap(vec![batch], &HashSet::new());
        assert_eq!(out.len(), MAX_CANDIDATES);
    }

    #[test]
    fn top_genres_respects_rating_order_and_limit() {
        let mut ratings = HashMap::new();
        ratings.insert(28u32, 9u8);
        ratings.insert(18u32, 10u8);
        ratings.insert(35u32, 5u8);
        ratings.insert(27u32, 8u8);
        ratings.insert(80u32, 7u8);
        ratings.insert(99u32, 6u8);
        let top = top_genres(&ratings, 5);
        assert_eq!(top, vec![18, 28, 27, 80, 99]);
    }
}
