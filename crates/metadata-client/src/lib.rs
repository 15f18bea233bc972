//! External Metadata Client (§4.1): wraps the upstream movie/TV metadata API.
//!
//! Every operation times out at 20s, reports a typed [`MetadataClientError`]
//! rather than retrying, and goes through `cached_get`, which consults the
//! request-scoped cache (§4.2) before submitting through a [`RateLimiter`]
//! (§5). The request-path client and the scheduled-populator client are two
//! separate `MetadataClient` instances sharing one cache and each carrying
//! its own limiter, per the design note in spec §9 ("shared per-module
//! mutable limiter → explicit limiter value").

pub mod error;
pub mod limiter;
pub mod raw;

pub use error::{MetadataClientError, Result};
pub use limiter::RateLimiter;
pub use raw::{DetailedItem, RawItem};

use std::sync::Arc;
use std::time::Duration;

use metadata_model::{Candidate, MediaId, MediaType, RequestScopedCache};
use raw::RawPage;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

const CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// Sort order for the "hidden gems" / "award winning" discover strategies.
#[derive(Debug, Clone, Copy)]
pub enum SortBy {
    VoteAverageDesc,
    PopularityDesc,
}

impl SortBy {
    fn as_query(&self) -> &'static str {
        match self {
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::PopularityDesc => "popularity.desc",
        }
    }
}

impl Default for SortBy {
    fn default() -> Self {
        SortBy::PopularityDesc
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoverParams {
    pub with_genres: Option<Vec<u32>>,
    pub page: u32,
    pub sort_by: SortBy,
    pub vote_count_gte: Option<u32>,
    pub vote_count_lte: Option<u32>,
}

/// "movie", "tv", or "all" for `/trending/{scope}/week`.
#[derive(Debug, Clone, Copy)]
pub enum TrendingScope {
    Movie,
    Tv,
    All,
}

impl TrendingScope {
    fn as_path(&self) -> &'static str {
        match self {
            TrendingScope::Movie => "movie",
            TrendingScope::Tv => "tv",
            TrendingScope::All => "all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for MetadataClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            api_key: String::new(),
            cache_ttl: Duration::from_secs(5 * 60),
            cache_capacity: 100,
        }
    }
}

pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Arc<RequestScopedCache<Value>>,
    limiter: RateLimiter,
}

impl MetadataClient {
    pub fn new(config: MetadataClientConfig, limiter: RateLimiter) -> Self {
        let cache = Arc::new(RequestScopedCache::new(config.cache_ttl, config.cache_capacity));
        Self::with_cache(config, cache, limiter)
    }

    /// Builds a client sharing an existing cache instance, so the
    /// request-path and populator clients can share the one process-wide
    /// cache (§4.2) while carrying distinct rate limiters.
    pub fn with_cache(
        config: MetadataClientConfig,
        cache: Arc<RequestScopedCache<Value>>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
            api_key: config.api_key,
            cache,
            limiter,
        }
    }

    pub fn request_path(config: MetadataClientConfig) -> Self {
        Self::new(config, RateLimiter::request_path())
    }

    pub fn populator(config: MetadataClientConfig) -> Self {
        Self::new(config, RateLimiter::populator())
    }

    #[instrument(skip(self, cancel))]
    pub async fn popular(
        &self,
        media_type: MediaType,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let url = format!("{}/{}/popular?page={}", self.base_url, media_type, page);
        let page: RawPage = self.cached_get_typed(&url, cancel).await?;
        Ok(page
            .results
            .into_iter()
            .map(|r| r.into_candidate(media_type))
            .collect())
    }

    #[instrument(skip(self, cancel))]
    pub async fn trending(
        &self,
        scope: TrendingScope,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let url = format!(
            "{}/trending/{}/week?page={}",
            self.base_url,
            scope.as_path(),
            page
        );
        let raw: RawPage = self.cached_get_typed(&url, cancel).await?;
        let fallback_type = match scope {
            TrendingScope::Tv => MediaType::Tv,
            _ => MediaType::Movie,
        };
        Ok(raw
            .results
            .into_iter()
            .map(|r| r.into_candidate(fallback_type))
            .collect())
    }

    #[instrument(skip(self, params, cancel))]
    pub async fn discover(
        &self,
        media_type: MediaType,
        params: DiscoverParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let mut url = format!(
            "{}/discover/{}?page={}&sort_by={}",
            self.base_url,
            media_type,
            params.page,
            params.sort_by.as_query()
        );
        if let Some(genres) = &params.with_genres {
            let joined = genres
                .iter()
                .map(|g| g.to_string())
                .collect::<Vec<_>>()
                .join(",");
            url.push_str(&format!("&with_genres={}", urlencoding::encode(&joined)));
        }
        if let Some(min) = params.vote_count_gte {
            url.push_str(&format!("&vote_count.gte={}", min));
        }
        if let Some(max) = params.vote_count_lte {
            url.push_str(&format!("&vote_count.lte={}", max));
        }
        let raw: RawPage = self.cached_get_typed(&url, cancel).await?;
        Ok(raw
            .results
            .into_iter()
            .map(|r| r.into_candidate(media_type))
            .collect())
    }

    /// Uses the first hit of a text search, per §4.1.
    #[instrument(skip(self, cancel))]
    pub async fn search(
        &self,
        media_type: MediaType,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Candidate>> {
        let url = format!(
            "{}/search/{}?query={}",
            self.base_url,
            media_type,
            urlencoding::encode(query)
        );
        let raw: RawPage = self.cached_get_typed(&url, cancel).await?;
        Ok(raw
            .results
            .into_iter()
            .next()
            .map(|r| r.into_candidate(media_type)))
    }

    #[instrument(skip(self, cancel))]
    pub async fn similar(
        &self,
        media_type: MediaType,
        id: MediaId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let url = format!("{}/{}/{}/similar", self.base_url, media_type, id);
        let raw: RawPage = self.cached_get_typed(&url, cancel).await?;
        Ok(raw
            .results
            .into_iter()
            .map(|r| r.into_candidate(media_type))
            .collect())
    }

    #[instrument(skip(self, cancel))]
    pub async fn recommendations(
        &self,
        media_type: MediaType,
        id: MediaId,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let url = format!("{}/{}/{}/recommendations", self.base_url, media_type, id);
        let raw: RawPage = self.cached_get_typed(&url, cancel).await?;
        Ok(raw
            .results
            .into_iter()
            .map(|r| r.into_candidate(media_type))
            .collect())
    }

    /// Full detail with credits and keywords appended, per §4.1.
    #[instrument(skip(self, cancel))]
    pub async fn detail(
        &self,
        media_type: MediaType,
        id: MediaId,
        cancel: &CancellationToken,
    ) -> Result<Candidate> {
        let url = format!(
            "{}/{}/{}?append_to_response=credits,keywords",
            self.base_url, media_type, id
        );
        let raw: DetailedItem = self.cached_get_typed(&url, cancel).await?;
        Ok(raw.into_candidate(media_type))
    }

    async fn cached_get_typed<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let value = self.cached_get(url, cancel).await?;
        serde_json::from_value(value).map_err(|e| MetadataClientError::NetworkError(e.to_string()))
    }

    /// First consults the request-scoped cache with the credential-scrubbed
    /// URL; on a miss, submits through the rate limiter and caches the
    /// result on success (§4.1, §4.2).
    async fn cached_get(&self, url: &str, cancel: &CancellationToken) -> Result<Value> {
        let key = Self::scrub_key(url, &self.api_key);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let fetch = async {
            let _permit = self.limiter.acquire().await;
            self.http
                .get(url)
                .query(&[("api_key", self.api_key.as_str())])
                .send()
                .await
        };

        let timed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MetadataClientError::Canceled),
            result = tokio::time::timeout(CALL_TIMEOUT, fetch) => result,
        };

        let response = match timed {
            Ok(inner) => inner,
            Err(_elapsed) => return Err(MetadataClientError::Timeout),
        };

        let response = response.map_err(|e| {
            if e.is_timeout() {
                MetadataClientError::Timeout
            } else {
                MetadataClientError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            warn!(url = %key, "upstream rate limited this request");
            return Err(MetadataClientError::RateLimited);
        }
        if !status.is_success() {
            return Err(MetadataClientError::UpstreamError(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MetadataClientError::NetworkError(e.to_string()))?;
        self.cache.insert(key, body.clone());
        Ok(body)
    }

    /// Canonicalizes a URL for caching by replacing the API key value with a
    /// placeholder, matching the data model's "urlKey (API key scrubbed)".
    fn scrub_key(url: &str, api_key: &str) -> String {
        if api_key.is_empty() {
            url.to_string()
        } else {
            url.replace(api_key, "<api_key>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> MetadataClientConfig {
        MetadataClientConfig {
            base_url,
            api_key: "secret".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn popular_deserializes_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"id": 1, "title": "A", "genre_ids": [28]},
                    {"id": 2, "title": "B", "genre_ids": [18]},
                ]
            })))
            .mount(&server)
            .await;

        let client = MetadataClient::request_path(test_config(server.uri()));
        let cancel = CancellationToken::new();
        let results = client.popular(MediaType::Movie, 1, &cancel).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "A");
    }

    #[tokio::test]
    async fn repeated_calls_hit_the_cache_not_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"id": 1, "title": "A", "genre_ids": []}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MetadataClient::request_path(test_config(server.uri()));
        let cancel = CancellationToken::new();
        client.popular(MediaType::Movie, 1, &cancel).await.unwrap();
        client.popular(MediaType::Movie, 1, &cancel).await.unwrap();
        // wiremock's `.expect(1)` assertion (checked on server drop) verifies
        // the second call served from the request-scoped cache.
    }

    #[tokio::test]
    async fn rate_limited_status_maps_to_rate_limited_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = MetadataClient::request_path(test_config(server.uri()));
        let cancel = CancellationToken::new();
        let err = client.popular(MediaType::Movie, 1, &cancel).await.unwrap_err();
        assert!(matches!(err, MetadataClientError::RateLimited));
    }

    #[tokio::test]
    async fn server_error_maps_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = MetadataClient::request_path(test_config(server.uri()));
        let cancel = CancellationToken::new();
        let err = client.popular(MediaType::Movie, 1, &cancel).await.unwrap_err();
        assert!(matches!(err, MetadataClientError::UpstreamError(503)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn cancellation_short_circuits_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        let client = MetadataClient::request_path(test_config(server.uri()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client.popular(MediaType::Movie, 1, &cancel).await.unwrap_err();
        assert!(matches!(err, MetadataClientError::Canceled));
    }

    #[test]
    fn scrub_key_redacts_credential() {
        let url = "https://api.example.com/movie/popular?api_key=abc123&page=1";
        let scrubbed = MetadataClient::scrub_key(url, "abc123");
        assert!(!scrubbed.contains("abc123"));
        assert!(scrubbed.contains("<api_key>"));
    }
}
