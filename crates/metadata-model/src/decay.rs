//! Temporal weighting shared by the favorites-DNA analyzer and the scoring
//! engine's watchlist-influence term.

/// Half-life-style decay window: `MAX_DAYS / 3` from the data model invariant
/// `exp(-d / (MAX_DAYS/3))`, `MAX_DAYS = 180`.
pub const DECAY_WINDOW_DAYS: f64 = 180.0 / 3.0;

/// Exponential decay of a preference event's importance by its age in days.
/// Always in `(0, 1]`. An unknown age (`None`) defaults to 0.5.
pub fn temporal_weight(days_since: Option<f64>) -> f64 {
    match days_since {
        Some(d) => (-d.max(0.0) / DECAY_WINDOW_DAYS).exp(),
        None => 0.5,
    }
}

/// Converts a Unix-epoch-seconds timestamp into a day-count relative to now.
pub fn days_since(added_at: Option<i64>, now_unix: i64) -> Option<f64> {
    added_at.map(|ts| ((now_unix - ts).max(0) as f64) / 86_400.0)
}
