//! Diversity Selector (§4.9): a greedy pass over score-sorted candidates
//! that spreads the result across genres and decades instead of always
//! picking the single best-scoring cluster.

use metadata_model::ScoredCandidate;
use std::collections::HashSet;

/// Selects up to `limit` candidates from a list already sorted by descending
/// score. A second pass fills any remaining slots from the same list,
/// skipping ids already chosen. Output preserves score order.
pub fn select(sorted_candidates: &[ScoredCandidate], limit: usize) -> Vec<ScoredCandidate> {
    if limit == 0 || sorted_candidates.is_empty() {
        return Vec::new();
    }

    let diversity_floor = (0.7 * limit as f64) as usize;
    let mut used_genres = HashSet::new();
    let mut used_decades = HashSet::new();
    let mut selected_ids = HashSet::new();
    let mut selected = Vec::with_capacity(limit);

    for scored in sorted_candidates {
        if selected.len() >= limit {
            break;
        }
        let primary_genre = scored.candidate.genres.first().copied();
        let decade = scored.candidate.decade();

        let genre_unused = primary_genre.is_none_or(|g| !used_genres.contains(&g));
        let decade_unused = decade.is_none_or(|d| !used_decades.contains(&d));

        if selected.len() < diversity_floor || genre_unused || decade_unused {
            if let Some(g) = primary_genre {
                used_genres.insert(g);
            }
            if let Some(d) = decade {
                used_decades.insert(d);
            }
            selected_ids.insert(scored.candidate.id);
            selected.push(scored.clone());
        }
    }

    if selected.len() < limit {
        for scored in sorted_candidates {
            if selected.len() >= limit {
                break;
            }
            if selected_ids.insert(scored.candidate.id) {
                selected.push(scored.clone());
            }
        }
    }

    selected
}
