use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reference::DetailedPerson;

/// Row in `seasons`, unique on `(show_id, season_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Season {
    pub id: i64,
    pub show_id: i64,
    pub season_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
    pub episode_count: Option<i32>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}

/// Row in `episodes`, unique on `(season_id, episode_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Episode {
    pub id: i64,
    pub season_id: i64,
    pub show_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: String,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
    pub runtime: Option<i32>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub production_code: Option<String>,
    pub episode_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetail {
    #[serde(flatten)]
    pub episode: Episode,
    pub crew: Vec<DetailedPerson>,
    pub guest_stars: Vec<DetailedPerson>,
}

/// Season with its episodes, as served by `GET /tv/{id}/season/{n}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetail {
    #[serde(flatten)]
    pub season: Season,
    /// Sorted by episode number.
    pub episodes: Vec<EpisodeDetail>,
}
