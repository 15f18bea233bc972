//! The Candidate Enricher (§4.7): pre-filters the discovered candidate set,
//! then fetches full detail (cast/crew/keywords) for the highest-signal
//! subset. Also exposes a favorites-enrichment pair reused by the
//! Favorites-DNA Analyzer's first step (§4.5).

use futures::future::join_all;
use metadata_client::MetadataClient;
use metadata_model::{Candidate, DealBreaker, FavoriteItem, InternationalContentPreference, UserPreferences};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// At most this many pre-filtered candidates get a `detail` enrichment call;
/// the rest pass through unenriched (§4.7).
pub const MAX_TO_ENRICH: usize = 30;

/// `detail` calls for the candidates selected for enrichment run in batches
/// of this size, in parallel within a batch.
const BATCH_SIZE: usize = 10;

const MIN_VOTE_AVERAGE: f64 = 4.0;

/// Drops candidates the user has vetoed outright (§4.7 pre-filter rules):
/// adult content when `SexualContent` is a deal-breaker, non-English content
/// when the user prefers English only, and anything below the quality floor.
pub fn pre_filter(candidates: Vec<Candidate>, preferences: &UserPreferences) -> Vec<Candidate> {
    let reject_adult = preferences.deal_breakers.contains(&DealBreaker::SexualContent);
    let english_only = matches!(
        preferences.international_content_preference,
        Some(InternationalContentPreference::EnglishPreferred)
    );

    candidates
        .into_iter()
        .filter(|c| !(reject_adult && c.adult))
        .filter(|c| !(english_only && c.original_language != "en"))
        .filter(|c| c.vote_average >= MIN_VOTE_AVERAGE)
        .collect()
}

/// Enriches the leading `MAX_TO_ENRICH` candidates with full detail, batched
/// `BATCH_SIZE` at a time; falls back to the unenriched candidate on a
/// per-item failure so one upstream error never drops a whole batch.
pub async fn enrich_candidates(
    client: &MetadataClient,
    candidates: Vec<Candidate>,
    cancel: &CancellationToken,
) -> Vec<Candidate> {
    let mut to_enrich: Vec<Candidate> = candidates;
    let rest = if to_enrich.len() > MAX_TO_ENRICH {
        to_enrich.split_off(MAX_TO_ENRICH)
    } else {
        Vec::new()
    };

    let mut out = Vec::with_capacity(to_enrich.len() + rest.len());
    for batch in to_enrich.chunks(BATCH_SIZE) {
        let futures = batch.iter().cloned().map(|c| enrich_one(client, c, cancel));
        out.extend(join_all(futures).await);
    }
    out.extend(rest);
    out
}

async fn enrich_one(client: &MetadataClient, candidate: Candidate, cancel: &CancellationToken) -> Candidate {
    let id = candidate.id;
    let media_type = candidate.media_type;
    match client.detail(media_type, id, cancel).await {
        Ok(detailed) => detailed,
        Err(error) => {
            warn!(%error, id, "enrichment failed, keeping unenriched candidate");
            candidate
        }
    }
}

/// Enriches favorites that are missing cast/crew/genres (§4.5 step 1), in
/// parallel, falling back to the original entry on failure.
pub async fn enrich_favorites(
    client: &MetadataClient,
    favorites: Vec<FavoriteItem>,
    cancel: &CancellationToken,
) -> Vec<FavoriteItem> {
    let futures = favorites.into_iter().map(|f| enrich_favorite(client, f, cancel));
    join_all(futures).await
}

async fn enrich_favorite(
    client: &MetadataClient,
    favorite: FavoriteItem,
    cancel: &CancellationToken,
) -> FavoriteItem {
    if !favorite.needs_enrichment() {
        return favorite;
    }

    match client.detail(favorite.media_type, favorite.media_id, cancel).await {
        Ok(detailed) => FavoriteItem {
            genres: detailed.genres,
            cast: detailed.cast,
            crew: detailed.crew,
            vote_average: Some(detailed.vote_average).or(favorite.vote_average),
            release_date: detailed.release_date.or(favorite.release_date),
            ..favorite
        },
        Err(error) => {
            warn!(%error, id = favorite.media_id, "favorite enrichment failed, keeping bare entry");
            favorite
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_model::MediaType;
    use std::collections::HashSet;

    fn candidate(id: i64, adult: bool, lang: &str, vote_average: f64) -> Candidate {
        Candidate {
            id,
            media_type: MediaType::Movie,
            title: format!("title-{id}"),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            vote_average,
            vote_count: 10,
            popularity: 1.0,
            release_date: None,
            original_language: lang.to_string(),
            adult,
            genres: Vec::new(),
            runtime: None,
            cast: Vec::new(),
            crew: Vec::new(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn pre_filter_drops_adult_when_deal_breaker_set() {
        let mut prefs = UserPreferences::default();
        prefs.deal_breakers.insert(DealBreaker::SexualContent);
        let candidates = vec![candidate(1, true, "en", 7.0), candidate(2, false, "en", 7.0)];
        let out = pre_filter(candidates, &prefs);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn pre_filter_drops_non_english_when_english_preferred() {
        let mut prefs = UserPreferences::default();
        prefs.international_content_preference = Some(InternationalContentPreference::EnglishPreferred);
        let candidates = vec![candidate(1, false, "fr", 7.0), candidate(2, false, "en", 7.0)];
        let out = pre_filter(candidates, &prefs);
        let ids: HashSet<_> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, HashSet::from([2]));
    }

    #[test]
    fn pre_filter_drops_below_quality_floor() {
        let prefs = UserPreferences::default();
        let candidates = vec![candidate(1, false, "en", 3.9), candidate(2, false, "en", 4.0)];
        let out = pre_filter(candidates, &prefs);
        let ids: HashSet<_> = out.iter().map(|c| c.id).collect();
        assert_eq!(ids, HashSet::from([2]));
    }
}
