//! Scheduled Cache Populator (§4.11): a background job, independent of any
//! single request, that pre-warms the persistent cache so request-path
//! lookups have a better chance of a warm hit. Driven on a schedule by
//! [`crate::populator_driver`].

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metadata_client::{DiscoverParams, MetadataClient, SortBy, TrendingScope};
use metadata_model::{Candidate, MediaType, PersistentCache};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

const SEVEN_DAYS: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Writes are chunked to this size to respect the persistent cache's
/// documented batch limit (§6, "batch writes up to 25 items").
const BATCH_WRITE_SIZE: usize = 25;

/// Not user-specific: the fixed set of generally popular genres the weekly
/// job seeds regardless of which user eventually benefits from the warm
/// cache entry.
const POPULAR_GENRES: [u32; 5] = [28, 35, 18, 53, 12]; // Action, Comedy, Drama, Thriller, Adventure

const HIDDEN_GEMS_VOTE_COUNT_MIN: u32 = 50;
const HIDDEN_GEMS_VOTE_COUNT_MAX: u32 = 500;
const AWARD_WINNING_VOTE_COUNT_MIN: u32 = 1000;

pub struct Populator {
    client: Arc<MetadataClient>,
    cache: Arc<dyn PersistentCache>,
}

impl Populator {
    pub fn new(client: Arc<MetadataClient>, cache: Arc<dyn PersistentCache>) -> Self {
        Self { client, cache }
    }

    /// Popular (movie+tv, 2 pages each) and trending (movie, tv, mixed; 1
    /// page each).
    #[instrument(skip(self, cancel))]
    pub async fn run_daily(&self, cancel: &CancellationToken) {
        for &media_type in &[MediaType::Movie, MediaType::Tv] {
            for page in 1..=2 {
                match self.client.popular(media_type, page, cancel).await {
                    Ok(items) => self.write_category("popular", media_type, items).await,
                    Err(error) => warn!(%error, %media_type, page, "daily populator: popular fetch failed"),
                }
            }
        }

        for scope in [TrendingScope::Movie, TrendingScope::Tv, TrendingScope::All] {
            let fallback_type = match scope {
                TrendingScope::Tv => MediaType::Tv,
                _ => MediaType::Movie,
            };
            match self.client.trending(scope, 1, cancel).await {
                Ok(items) => self.write_category("trending", fallback_type, items).await,
                Err(error) => warn!(%error, "daily populator: trending fetch failed"),
            }
        }

        info!("daily populator run complete");
    }

    /// Genre (top 5 popular genres × both types × 1 page), hidden gems (both
    /// types), award-winning (both types).
    #[instrument(skip(self, cancel))]
    pub async fn run_weekly(&self, cancel: &CancellationToken) {
        for &media_type in &[MediaType::Movie, MediaType::Tv] {
            for &genre in &POPULAR_GENRES {
                let params = DiscoverParams {
                    with_genres: Some(vec![genre]),
                    page: 1,
                    ..Default::default()
                };
                match self.client.discover(media_type, params, cancel).await {
                    Ok(items) => self.write_category("genre", media_type, items).await,
                    Err(error) => warn!(%error, %media_type, genre, "weekly populator: genre fetch failed"),
                }
            }

            let hidden_gems = DiscoverParams {
                page: 1,
                sort_by: SortBy::VoteAverageDesc,
                vote_count_gte: Some(HIDDEN_GEMS_VOTE_COUNT_MIN),
                vote_count_lte: Some(HIDDEN_GEMS_VOTE_COUNT_MAX),
                ..Default::default()
            };
            match self.client.discover(media_type, hidden_gems, cancel).await {
                Ok(items) => self.write_category("hidden_gems", media_type, items).await,
                Err(error) => warn!(%error, %media_type, "weekly populator: hidden gems fetch failed"),
            }

            let award_winning = DiscoverParams {
                page: 1,
                sort_by: SortBy::VoteAverageDesc,
                vote_count_gte: Some(AWARD_WINNING_VOTE_COUNT_MIN),
                ..Default::default()
            };
            match self.client.discover(media_type, award_winning, cancel).await {
                Ok(items) => self.write_category("award_winning", media_type, items).await,
                Err(error) => warn!(%error, %media_type, "weekly populator: award-winning fetch failed"),
            }
        }

        info!("weekly populator run complete");
    }

    pub async fn run_full(&self, cancel: &CancellationToken) {
        self.run_daily(cancel).await;
        self.run_weekly(cancel).await;
    }

    async fn write_category(&self, category: &str, media_type: MediaType, candidates: Vec<Candidate>) {
        if candidates.is_empty() {
            return;
        }
        let now = now_unix();
        let items: Vec<_> = candidates
            .into_iter()
            .map(|candidate| {
                let cache_key = format!("{category}#{media_type}#{}", candidate.id);
                metadata_model::ScheduledCacheItem {
                    cache_key,
                    content_id: candidate.id,
                    content_type: media_type,
                    category: category.to_string(),
                    candidate,
                    fetched_at: now,
                    expires_at: now + SEVEN_DAYS.as_secs() as i64,
                    source: "populator".to_string(),
                }
            })
            .collect();

        for chunk in items.chunks(BATCH_WRITE_SIZE) {
            self.write_batch(chunk.to_vec()).await;
        }
    }

    /// Falls back to per-item writes when the batch write fails (§4.11).
    async fn write_batch(&self, items: Vec<metadata_model::ScheduledCacheItem>) {
        let count = items.len();
        if let Err(error) = self.cache.batch_put(items.clone()).await {
            warn!(%error, count, "batch write failed, falling back to per-item writes");
            for item in items {
                if let Err(error) = self.cache.put(item).await {
                    warn!(%error, "per-item populator write failed");
                }
            }
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference_store::InMemoryPersistentCache;
    use metadata_client::MetadataClientConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn populator_against(server: &MockServer) -> (Populator, Arc<InMemoryPersistentCache>) {
        let config = MetadataClientConfig {
            base_url: server.uri(),
            api_key: "key".to_string(),
            ..Default::default()
        };
        let client = Arc::new(MetadataClient::populator(config));
        let cache = Arc::new(InMemoryPersistentCache::new());
        (Populator::new(client, cache.clone()), cache)
    }

    #[tokio::test]
    async fn run_daily_writes_popular_and_trending_items_to_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"id": 1, "title": "A", "genre_ids": [28]}]
            })))
            .mount(&server)
            .await;

        let (populator, cache) = populator_against(&server).await;
        let cancel = CancellationToken::new();
        populator.run_daily(&cancel).await;

        assert!(!cache.is_empty());
    }

    #[tokio::test]
    async fn run_weekly_writes_genre_and_hidden_gems_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"id": 2, "title": "B", "genre_ids": [18]}]
            })))
            .mount(&server)
            .await;

        let (populator, cache) = populator_against(&server).await;
        let cancel = CancellationToken::new();
        populator.run_weekly(&cancel).await;

        assert!(!cache.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_does_not_panic_and_leaves_cache_partially_populated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (populator, cache) = populator_against(&server).await;
        let cancel = CancellationToken::new();
        populator.run_daily(&cancel).await;

        assert!(cache.is_empty());
    }
}
