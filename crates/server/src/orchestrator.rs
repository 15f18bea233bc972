//! Pipeline Orchestrator (§4.10): the one place that knows the full shape of
//! a recommendation request. Everything else in this workspace is a
//! collaborator it calls in sequence, timing each stage and degrading
//! gracefully instead of failing the request when a stage comes back empty.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use metadata_client::MetadataClient;
use metadata_model::{
    PreferenceStore, RecommendationRequest, RecommendationResponse, RecommendationResponseItem,
    Result, UserBundle,
};
use sources::{enrich_candidates, enrich_favorites, pre_filter, Discoverer};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::genres;

/// Degraded-but-200 response source tag (§6).
const SOURCE_GET: &str = "personalized_lambda";
/// Used when the caller supplied inline preferences instead of relying on
/// the preference store (§6 describes the request as arriving "via query
/// parameters or a JSON body"; this distinguishes the two paths the way a
/// POST-with-body request differs from a GET).
const SOURCE_POST: &str = "personalized_lambda_post";

pub struct RecommendationOrchestrator {
    client: Arc<MetadataClient>,
    preference_store: Arc<dyn PreferenceStore>,
    discoverer: Discoverer,
    deadline: Duration,
}

impl RecommendationOrchestrator {
    pub fn new(
        client: Arc<MetadataClient>,
        preference_store: Arc<dyn PreferenceStore>,
        deadline: Duration,
    ) -> Self {
        let discoverer = Discoverer::new(client.clone());
        Self {
            client,
            preference_store,
            discoverer,
            deadline,
        }
    }

    /// Runs the full pipeline for one request. Never raises except for
    /// `InvalidRequest`/`InternalError` (§4.10); upstream and store failures
    /// degrade the result in place instead.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let overall_start = Instant::now();
        let cancel = CancellationToken::new();
        let deadline_guard = self.spawn_deadline_timer(cancel.clone());

        let bundle = self.load_user_bundle(request).await;
        let used_inline_preferences = request
            .inline_preferences
            .as_ref()
            .is_some_and(|p| !p.is_empty());

        let stage2_start = Instant::now();
        let candidates = self
            .discoverer
            .discover(request.media_type, &bundle.preferences, &request.exclude, &cancel)
            .await;
        info!(stage = "discover", count = candidates.len(), elapsed = ?stage2_start.elapsed());

        let stage3_start = Instant::now();
        let filtered = pre_filter(candidates, &bundle.preferences);
        let enriched = enrich_candidates(&self.client, filtered, &cancel).await;
        info!(stage = "enrich", count = enriched.len(), elapsed = ?stage3_start.elapsed());

        let stage4_start = Instant::now();
        let scored = self.score(&bundle, &enriched, &cancel).await;
        info!(stage = "score", count = scored.len(), elapsed = ?stage4_start.elapsed());

        let mut ranked: Vec<_> = scored.into_iter().filter(|s| s.score > -500.0).collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let selected = pipeline::select_diverse(&ranked, request.effective_limit() as usize);

        deadline_guard.abort();

        let elapsed_ms = overall_start.elapsed().as_millis() as u64;
        let items = selected
            .into_iter()
            .map(|scored| shape_response_item(scored, elapsed_ms))
            .collect();

        info!(
            total_elapsed = ?overall_start.elapsed(),
            returned = %used_inline_preferences,
            "recommendation pipeline complete"
        );

        Ok(RecommendationResponse {
            items,
            source: if used_inline_preferences { SOURCE_POST } else { SOURCE_GET }.to_string(),
            user_preferences: bundle.preferences,
        })
    }

    /// Always reads favorites/watchlist from the store; inline preferences
    /// (when present and non-empty) only override the `preferences` field of
    /// the loaded bundle, per the request contract in §6.
    async fn load_user_bundle(&self, request: &RecommendationRequest) -> UserBundle {
        let stage1_start = Instant::now();
        let mut bundle = match self.preference_store.load_user_bundle(&request.user_id).await {
            Ok(bundle) => bundle,
            Err(error) => {
                warn!(%error, "preference store unavailable, proceeding with empty bundle");
                UserBundle::default()
            }
        };
        info!(stage = "load_user_bundle", elapsed = ?stage1_start.elapsed());

        if let Some(inline) = &request.inline_preferences {
            if !inline.is_empty() {
                bundle.preferences = inline.clone();
            }
        }
        bundle
    }

    async fn score(
        &self,
        bundle: &UserBundle,
        candidates: &[metadata_model::Candidate],
        cancel: &CancellationToken,
    ) -> Vec<metadata_model::ScoredCandidate> {
        let favorites = enrich_favorites(&self.client, bundle.favorites.clone(), cancel).await;
        let now_unix = now_unix();
        let dna = pipeline::analyze(&favorites, now_unix);

        let inputs = pipeline::ScoringInputs {
            preferences: &bundle.preferences,
            dna: &dna,
            favorites: &favorites,
            watchlist: &bundle.watchlist,
            now_unix,
        };

        pipeline::score_all(candidates, &inputs, &genres::name)
    }

    fn spawn_deadline_timer(&self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        let deadline = self.deadline;
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            cancel.cancel();
        })
    }
}

fn shape_response_item(
    scored: metadata_model::ScoredCandidate,
    processing_time: u64,
) -> RecommendationResponseItem {
    let genre_names: Vec<&str> = scored
        .candidate
        .genres
        .iter()
        .filter_map(|g| genres::name(*g))
        .collect();

    RecommendationResponseItem {
        media_id: scored.candidate.id.to_string(),
        id: scored.candidate.id.to_string(),
        title: scored.candidate.title,
        overview: scored.candidate.overview,
        poster_path: scored.candidate.poster_path,
        backdrop_path: scored.candidate.backdrop_path,
        vote_average: scored.candidate.vote_average,
        release_date: scored.candidate.release_date,
        popularity: scored.candidate.popularity,
        media_type: scored.candidate.media_type,
        genres: genre_names.join("|"),
        score: scored.score,
        recommendation_reason: scored.recommendation_reason,
        processing_time,
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
