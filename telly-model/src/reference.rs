//! Shared lookup entities. Every one of them is keyed by a natural key taken
//! from the upstream database (numeric id or ISO code) and reused across shows.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
    /// ISO 3166-1 code of an already persisted country, if any.
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductionCompany {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Country {
    pub iso_3166_1: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Language {
    pub iso_639_1: String,
    pub name: String,
    pub english_name: String,
}

/// Show creator as listed in the `created_by` block of a show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub original_name: Option<String>,
    pub credit_id: Option<String>,
    pub gender: Option<i32>,
    pub profile_path: Option<String>,
}

/// Crew member or guest star attached to an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DetailedPerson {
    pub id: i64,
    pub adult: bool,
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
