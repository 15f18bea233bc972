//! Error types shared across the recommendation engine crates.

use thiserror::Error;

/// The error kinds the core signals at the orchestrator boundary.
///
/// Upstream failures (`UpstreamTransient`, `UpstreamPermanent`, `StoreUnavailable`)
/// degrade the quality of a response; they are never surfaced as a failed request.
/// Only `InvalidRequest` and `InternalError` result in a non-200 response.
#[derive(Error, Debug)]
pub enum RecommendationError {
    /// Unparseable body, bad `limit`, non-numeric exclude ids.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Surfaced by the auth collaborator; never originated inside this crate.
    #[error("unauthorized")]
    Unauthorized,

    /// Timeout, 5xx, or rate-limited response from the upstream metadata API.
    #[error("upstream transient error: {0}")]
    UpstreamTransient(String),

    /// 4xx other than 429 from the upstream metadata API.
    #[error("upstream permanent error: {0}")]
    UpstreamPermanent(String),

    /// Preference, favorites, or watchlist store unreachable.
    #[error("preference store unavailable: {0}")]
    StoreUnavailable(String),

    /// Anything else; bubbles to the caller with no sensitive detail attached.
    #[error("internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, RecommendationError>;
