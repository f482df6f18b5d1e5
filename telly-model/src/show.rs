use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reference::{
    Country, Genre, Language, Network, Person, ProductionCompany,
};
use crate::season::Season;

/// Root aggregate row as stored in `tv_shows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Show {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub last_air_date: Option<NaiveDate>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub show_type: Option<String>,
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub in_production: bool,
    pub number_of_episodes: Option<i32>,
    pub number_of_seasons: Option<i32>,
    pub original_language: Option<String>,
    pub homepage: Option<String>,
    pub adult: bool,
    pub episode_run_time: Vec<i32>,
    pub languages: Vec<String>,
}

impl Show {
    /// Minimal row with every optional attribute unset.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            original_name: None,
            overview: None,
            first_air_date: None,
            last_air_date: None,
            status: None,
            show_type: None,
            tagline: None,
            poster_path: None,
            backdrop_path: None,
            popularity: None,
            vote_average: None,
            vote_count: None,
            in_production: false,
            number_of_episodes: None,
            number_of_seasons: None,
            original_language: None,
            homepage: None,
            adult: false,
            episode_run_time: Vec::new(),
            languages: Vec::new(),
        }
    }
}

/// Fully expanded show as served by `GET /tv/{id}`.
///
/// Field names follow the upstream shape so a locally served show and an
/// origin-synthesized one look the same to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    #[serde(flatten)]
    pub show: Show,
    pub genres: Vec<Genre>,
    pub networks: Vec<Network>,
    pub created_by: Vec<Person>,
    pub production_companies: Vec<ProductionCompany>,
    pub production_countries: Vec<Country>,
    pub origin_country: Vec<String>,
    pub spoken_languages: Vec<Language>,
    /// Sorted by season number.
    pub seasons: Vec<Season>,
}

/// Listing entry used by the trending feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ShowSummary {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub original_language: Option<String>,
    pub adult: bool,
    pub genre_ids: Vec<i64>,
    pub origin_country: Vec<String>,
}

impl ShowSummary {
    pub fn from_detail(detail: &ShowDetail) -> Self {
        let show = &detail.show;
        Self {
            id: show.id,
            name: show.name.clone(),
            original_name: show.original_name.clone(),
            overview: show.overview.clone(),
            first_air_date: show.first_air_date,
            poster_path: show.poster_path.clone(),
            backdrop_path: show.backdrop_path.clone(),
            popularity: show.popularity,
            vote_average: show.vote_average,
            vote_count: show.vote_count,
            original_language: show.original_language.clone(),
            adult: show.adult,
            genre_ids: detail.genres.iter().map(|g| g.id).collect(),
            origin_country: detail.origin_country.clone(),
        }
    }
}
