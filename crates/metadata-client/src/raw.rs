//! Wire shapes returned by the upstream metadata API, and their conversion
//! into the domain `Candidate` type (§3, §4.1).
//!
//! The upstream API is TMDB-shaped: movie and TV responses share almost all
//! fields except the title/date field names (`title`/`release_date` for
//! movies vs. `name`/`first_air_date` for TV). `RawItem` normalizes both into
//! one struct at deserialization time via serde aliases.

use metadata_model::{CastMember, Candidate, CrewMember, GenreId, MediaType};
use serde::Deserialize;

/// One row of a `results` array: `/popular`, `/trending`, `/discover`,
/// `/search`, `/similar`, `/recommendations` all share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(alias = "first_air_date", default)]
    pub release_date: Option<String>,
    #[serde(default = "default_language")]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
}

fn default_language() -> String {
    "en".to_string()
}

impl RawItem {
    pub fn into_candidate(self, media_type: MediaType) -> Candidate {
        Candidate {
            id: self.id,
            media_type,
            title: self.title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            release_date: self.release_date,
            original_language: self.original_language,
            adult: self.adult,
            genres: self.genre_ids,
            runtime: None,
            cast: Vec::new(),
            crew: Vec::new(),
            keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawGenre {
    id: GenreId,
    #[serde(default)]
    #[allow(dead_code)]
    name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCastMember {
    name: String,
    #[serde(default)]
    order: u32,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCrewMember {
    name: String,
    job: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCredits {
    #[serde(default)]
    cast: Vec<RawCastMember>,
    #[serde(default)]
    crew: Vec<RawCrewMember>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawKeyword {
    name: String,
}

/// `detail` with `append_to_response=credits,keywords` (§4.1). TV keywords
/// come back as `{"results": [...]}`, movie keywords as `{"keywords": [...]}`;
/// both are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
struct RawKeywords {
    #[serde(default)]
    keywords: Vec<RawKeyword>,
    #[serde(default)]
    results: Vec<RawKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailedItem {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f64,
    #[serde(alias = "first_air_date", default)]
    pub release_date: Option<String>,
    #[serde(default = "default_language")]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    genres: Vec<RawGenre>,
    #[serde(default)]
    runtime: Option<u32>,
    /// TV shows report this instead of a flat `runtime`; first element is the
    /// typical episode length.
    #[serde(default)]
    episode_run_time: Vec<u32>,
    #[serde(default)]
    credits: RawCredits,
    #[serde(default)]
    keywords: RawKeywords,
}

impl DetailedItem {
    pub fn into_candidate(self, media_type: MediaType) -> Candidate {
        let mut cast: Vec<_> = self
            .credits
            .cast
            .into_iter()
            .map(|c| CastMember {
                name: c.name,
                order: c.order,
            })
            .collect();
        cast.sort_by_key(|c| c.order);
        cast.truncate(10);

        let crew: Vec<_> = self
            .credits
            .crew
            .into_iter()
            .map(|c| CrewMember {
                name: c.name,
                job: c.job,
            })
            .take(10)
            .collect();

        let keywords: Vec<String> = self
            .keywords
            .keywords
            .into_iter()
            .chain(self.keywords.results)
            .map(|k| k.name)
            .collect();

        let runtime = self.runtime.or_else(|| self.episode_run_time.first().copied());

        Candidate {
            id: self.id,
            media_type,
            title: self.title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            release_date: self.release_date,
            original_language: self.original_language,
            adult: self.adult,
            genres: self.genres.into_iter().map(|g| g.id).collect(),
            runtime,
            cast,
            crew,
            keywords,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPage {
    #[serde(default)]
    pub results: Vec<RawItem>,
}
