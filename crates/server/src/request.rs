//! Request parsing and validation for the recommendation endpoint (§6, §7).
//!
//! This is the one place spec.md's open question about `exclude` canonicalizes
//! to a single representation (§9): every caller-supplied id, whether it
//! arrived as a JSON integer or a query-string digit, funnels through
//! [`parse`] before anything downstream sees a `HashSet<MediaId>`.

use std::collections::HashSet;

use metadata_model::{
    MediaId, MediaTypeFilter, RecommendationError, RecommendationRequest, UserPreferences,
};

/// Raw, unvalidated input gathered by whatever transport layer sits in front
/// of this crate (HTTP query params or a JSON body — both are out of scope
/// per spec.md §1, so this struct is the seam).
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    pub user_id: String,
    pub media_type: Option<String>,
    /// Comma-separated numeric ids, e.g. `"27205,603"`.
    pub exclude: Option<String>,
    pub limit: Option<i64>,
    pub inline_preferences: Option<UserPreferences>,
}

/// Validates and canonicalizes a [`RawRequest`] into a [`RecommendationRequest`].
///
/// Returns `InvalidRequest` for an unparseable `mediaType`, a non-numeric
/// exclude id, or a `limit` outside `1..=9` once clamping still leaves it
/// nonsensical (e.g. zero or negative after parsing) — the hard cap itself is
/// applied later by [`RecommendationRequest::effective_limit`], not here.
pub fn parse(raw: RawRequest) -> Result<RecommendationRequest, RecommendationError> {
    if raw.user_id.trim().is_empty() {
        return Err(RecommendationError::InvalidRequest("missing user id".to_string()));
    }

    let media_type = match raw.media_type.as_deref() {
        None | Some("") => MediaTypeFilter::Both,
        Some("movie") => MediaTypeFilter::Movie,
        Some("tv") => MediaTypeFilter::Tv,
        Some("both") => MediaTypeFilter::Both,
        Some(other) => {
            return Err(RecommendationError::InvalidRequest(format!(
                "unrecognized mediaType '{other}'"
            )))
        }
    };

    let exclude = parse_exclude(raw.exclude.as_deref())?;

    let limit = match raw.limit {
        None => metadata_model::HARD_CAP,
        Some(n) if n >= 1 => n.min(i64::from(u8::MAX)) as u8,
        Some(n) => {
            return Err(RecommendationError::InvalidRequest(format!(
                "limit must be >= 1, got {n}"
            )))
        }
    };

    Ok(RecommendationRequest {
        user_id: raw.user_id,
        media_type,
        exclude,
        limit,
        inline_preferences: raw.inline_preferences,
    })
}

fn parse_exclude(raw: Option<&str>) -> Result<HashSet<MediaId>, RecommendationError> {
    let Some(raw) = raw else {
        return Ok(HashSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<MediaId>()
                .map_err(|_| RecommendationError::InvalidRequest(format!("non-numeric exclude id '{s}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RawRequest {
        RawRequest {
            user_id: "u1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_to_both_and_hard_cap() {
        let req = parse(base()).unwrap();
        assert_eq!(req.media_type, MediaTypeFilter::Both);
        assert_eq!(req.effective_limit(), metadata_model::HARD_CAP);
        assert!(req.exclude.is_empty());
    }

    #[test]
    fn parses_comma_separated_exclude_ids() {
        let req = parse(RawRequest {
            exclude: Some("27205, 603,,12".to_string()),
            ..base()
        })
        .unwrap();
        assert_eq!(req.exclude, HashSet::from([27205, 603, 12]));
    }

    #[test]
    fn rejects_non_numeric_exclude_id() {
        let err = parse(RawRequest {
            exclude: Some("abc".to_string()),
            ..base()
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_unknown_media_type() {
        let err = parse(RawRequest {
            media_type: Some("anime".to_string()),
            ..base()
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_empty_user_id() {
        let err = parse(RawRequest::default()).unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_zero_limit() {
        let err = parse(RawRequest {
            limit: Some(0),
            ..base()
        })
        .unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidRequest(_)));
    }

    #[test]
    fn limit_above_hard_cap_is_clamped_downstream_not_rejected() {
        let req = parse(RawRequest {
            limit: Some(50),
            ..base()
        })
        .unwrap();
        assert_eq!(req.effective_limit(), metadata_model::HARD_CAP);
    }
}
