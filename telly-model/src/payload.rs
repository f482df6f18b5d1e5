//! Upstream payload shapes.
//!
//! These structs are the single field mapping between the origin's JSON and
//! the local model. Every field is declared here with its upstream name; unknown
//! fields are ignored and absent ones fall back to their defaults, so a payload
//! is checked once at deserialization and again by [`crate::ShowImport`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowPayload {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub show_type: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub in_production: Option<bool>,
    pub number_of_episodes: Option<i32>,
    pub number_of_seasons: Option<i32>,
    pub original_language: Option<String>,
    pub homepage: Option<String>,
    pub adult: Option<bool>,
    pub episode_run_time: Vec<i32>,
    pub languages: Vec<String>,
    pub genres: Vec<GenrePayload>,
    pub networks: Vec<CompanyPayload>,
    pub created_by: Vec<CreatorPayload>,
    pub production_companies: Vec<CompanyPayload>,
    pub production_countries: Vec<CountryPayload>,
    pub origin_country: Vec<String>,
    pub spoken_languages: Vec<LanguagePayload>,
    pub seasons: Vec<SeasonPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenrePayload {
    pub id: i64,
    pub name: String,
}

/// Shared by `networks` and `production_companies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyPayload {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorPayload {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub credit_id: Option<String>,
    pub gender: Option<i32>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryPayload {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePayload {
    pub iso_639_1: String,
    pub name: String,
    pub english_name: String,
}

/// A season as it appears both in the show detail (without episodes) and in
/// the season detail endpoint (with episodes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonPayload {
    pub id: Option<i64>,
    pub season_number: Option<i32>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub episode_count: Option<i32>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub episodes: Vec<EpisodePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodePayload {
    pub id: Option<i64>,
    pub episode_number: Option<i32>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub production_code: Option<String>,
    pub episode_type: Option<String>,
    pub crew: Vec<CreditPayload>,
    pub guest_stars: Vec<CreditPayload>,
}

/// Crew or guest star credit on an episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditPayload {
    pub id: i64,
    pub adult: Option<bool>,
    pub credit_id: Option<String>,
    pub department: Option<String>,
    pub gender: Option<i32>,
    pub job: Option<String>,
    pub known_for_department: Option<String>,
    pub name: String,
    pub original_name: Option<String>,
    pub popularity: Option<f64>,
    pub profile_path: Option<String>,
}

/// One page of the trending or popular feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPage {
    pub page: u32,
    pub results: Vec<FeedEntry>,
    pub total_pages: u32,
    pub total_results: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEntry {
    pub id: i64,
    pub name: Option<String>,
}
