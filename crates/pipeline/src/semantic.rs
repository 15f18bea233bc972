//! Semantic Similarity Scorer (§4.3): a swappable text-similarity black box.
//!
//! This implementation is hashed-token Jaccard: cheap, deterministic, and
//! good enough that the scoring engine only ever depends on the `[0,1]`
//! contract, not on the specific algorithm behind it.

use metadata_model::{Candidate, UserPreferences};
use std::collections::HashSet;

const MIN_TEXT_LEN: usize = 10;

/// `similarity(userText, movieText)`. Symmetric to within tokenization
/// noise; returns 0 when either text is below `MIN_TEXT_LEN` characters —
/// callers substitute a neutral 0.5 in that case, not this function.
pub fn similarity(user_text: &str, movie_text: &str) -> f64 {
    if user_text.len() < MIN_TEXT_LEN || movie_text.len() < MIN_TEXT_LEN {
        return 0.0;
    }

    let a = tokenize(user_text);
    let b = tokenize(movie_text);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Concatenates title, overview, and top genre names into one text blob for
/// the scorer (§4.3).
pub fn extract_movie_text(candidate: &Candidate, genre_names: &dyn Fn(u32) -> Option<&'static str>) -> String {
    let genres = candidate
        .genres
        .iter()
        .filter_map(|g| genre_names(*g))
        .collect::<Vec<_>>()
        .join(" ");
    [candidate.title.as_str(), candidate.overview.as_str(), genres.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenates the non-empty free-text preference fields (§4.3).
pub fn extract_user_preference_text(prefs: &UserPreferences) -> String {
    let mut parts = Vec::new();
    parts.extend(prefs.favorite_content.iter().cloned());
    parts.extend(prefs.mood_preferences.iter().cloned());
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_yields_zero() {
        assert_eq!(similarity("short", "this text is long enough to pass"), 0.0);
    }

    #[test]
    fn identical_text_is_maximally_similar() {
        let text = "a gritty crime drama about two detectives";
        assert_eq!(similarity(text, text), 1.0);
    }

    #[test]
    fn disjoint_text_is_not_similar() {
        let a = "a gritty crime drama about detectives";
        let b = "a whimsical animated musical for children";
        assert!(similarity(a, b) < 0.2);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = "space opera with rebels and an empire";
        let b = "rebels fighting an empire across the galaxy";
        assert_eq!(similarity(a, b), similarity(b, a));
    }

    #[test]
    fn extract_user_preference_text_joins_free_text_fields() {
        let mut prefs = UserPreferences::default();
        prefs.favorite_content.push("The Matrix".to_string());
        prefs.mood_preferences.push("mind-bending".to_string());
        assert_eq!(extract_user_preference_text(&prefs), "The Matrix mind-bending");
    }
}
