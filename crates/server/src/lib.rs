//! Ties the metadata client, candidate sourcing, and scoring pipeline
//! together into the one request-facing entry point (§4.10), plus the
//! background job that keeps the persistent cache warm (§4.11).

pub mod config;
pub mod genres;
pub mod orchestrator;
pub mod populator;
pub mod populator_driver;
pub mod preference_store;
pub mod request;

pub use config::Config;
pub use orchestrator::RecommendationOrchestrator;
pub use populator::Populator;
pub use preference_store::{InMemoryPersistentCache, InMemoryPreferenceStore};
pub use request::{parse as parse_request, RawRequest};
