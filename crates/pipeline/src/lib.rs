//! CPU-bound recommendation math: semantic text similarity (§4.3), the
//! favorites-DNA aggregation (§4.5 steps 2-4), the scoring engine (§4.8),
//! and the diversity selector (§4.9).
//!
//! None of this crate suspends. Upstream I/O (discovery, enrichment, the
//! preference store) lives in `sources` and is orchestrated by `server`.

pub mod dna;
pub mod diversity;
pub mod scoring;
pub mod semantic;

pub use dna::analyze;
pub use diversity::select as select_diverse;
pub use scoring::{score_all, score_candidate, ScoringInputs};
pub use semantic::{extract_movie_text, extract_user_preference_text, similarity};
