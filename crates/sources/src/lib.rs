//! Candidate sourcing: discovery (§4.6) and enrichment (§4.7) sit in one
//! crate because both are thin orchestration layers over the external
//! metadata client, with no scoring logic of their own.

pub mod discover;
pub mod enrich;

pub use discover::{Discoverer, MAX_CANDIDATES};
pub use enrich::{enrich_candidates, enrich_favorites, pre_filter, MAX_TO_ENRICH};
