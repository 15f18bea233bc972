//! Error type for the external metadata client (§4.1).
//!
//! Every client operation reports one of these kinds instead of raising; the
//! caller (a discovery strategy, the enricher, the DNA analyzer) decides
//! whether to swallow the failure and proceed with a partial result.

use metadata_model::RecommendationError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MetadataClientError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned status {0}")]
    UpstreamError(u16),

    #[error("rate limited by upstream")]
    RateLimited,

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("request canceled")]
    Canceled,
}

impl MetadataClientError {
    /// Whether this is a 429 or a 5xx: the caller never retries (§4.1), it
    /// just treats the strategy as having contributed nothing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MetadataClientError::Timeout
                | MetadataClientError::RateLimited
                | MetadataClientError::NetworkError(_)
                | MetadataClientError::UpstreamError(500..=599)
        )
    }
}

/// Maps a client-level failure onto the orchestrator-level error kinds (§7).
/// `Canceled` becomes `InternalError` only in the sense that it is never
/// surfaced standalone — callers treat it as "stop fetching", not as a
/// response-level failure.
impl From<MetadataClientError> for RecommendationError {
    fn from(err: MetadataClientError) -> Self {
        match err {
            MetadataClientError::Timeout | MetadataClientError::RateLimited => {
                RecommendationError::UpstreamTransient(err.to_string())
            }
            MetadataClientError::NetworkError(_) => {
                RecommendationError::UpstreamTransient(err.to_string())
            }
            MetadataClientError::UpstreamError(status) if status >= 500 || status == 429 => {
                RecommendationError::UpstreamTransient(err.to_string())
            }
            MetadataClientError::UpstreamError(_) => {
                RecommendationError::UpstreamPermanent(err.to_string())
            }
            MetadataClientError::Canceled => RecommendationError::InternalError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataClientError>;
