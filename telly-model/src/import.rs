//! Validated, normalized import input built from a [`ShowPayload`].

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::{ModelError, Result};
use crate::payload::{
    CompanyPayload, CreditPayload, EpisodePayload, SeasonPayload, ShowPayload,
};
use crate::reference::{
    Country, DetailedPerson, Genre, Language, Network, Person,
    ProductionCompany,
};
use crate::season::{Episode, Season};
use crate::show::Show;

/// One show aggregate ready for reconciliation.
///
/// Reference lists are kept in payload order and may still contain duplicate
/// keys; deduplication is the reconciler's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowImport {
    pub show: Show,
    pub genres: Vec<Genre>,
    pub networks: Vec<Network>,
    pub creators: Vec<Person>,
    pub production_companies: Vec<ProductionCompany>,
    pub production_countries: Vec<Country>,
    pub origin_countries: Vec<String>,
    pub spoken_languages: Vec<Language>,
    pub seasons: Vec<SeasonImport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonImport {
    pub season: Season,
    pub episodes: Vec<EpisodeImport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeImport {
    /// `season_id` holds the payload's season id until the reconciler
    /// rebinds it to the persisted season row.
    pub episode: Episode,
    pub crew: Vec<DetailedPerson>,
    pub guest_stars: Vec<DetailedPerson>,
}

impl ShowImport {
    pub fn id(&self) -> i64 {
        self.show.id
    }

    pub fn episode_total(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

impl TryFrom<ShowPayload> for ShowImport {
    type Error = ModelError;

    fn try_from(payload: ShowPayload) -> Result<Self> {
        if payload.id <= 0 {
            return Err(ModelError::invalid("id", "must be a positive integer"));
        }
        let name = payload.name.trim();
        if name.is_empty() {
            return Err(ModelError::MissingField("name"));
        }

        let show = Show {
            id: payload.id,
            name: name.to_string(),
            original_name: payload.original_name,
            overview: payload.overview,
            first_air_date: parse_date("first_air_date", payload.first_air_date)?,
            last_air_date: parse_date("last_air_date", payload.last_air_date)?,
            status: payload.status,
            show_type: payload.show_type,
            tagline: payload.tagline,
            poster_path: payload.poster_path,
            backdrop_path: payload.backdrop_path,
            popularity: payload.popularity,
            vote_average: payload.vote_average,
            vote_count: payload.vote_count,
            in_production: payload.in_production.unwrap_or(false),
            number_of_episodes: payload.number_of_episodes,
            number_of_seasons: payload.number_of_seasons,
            original_language: payload.original_language,
            homepage: payload.homepage,
            adult: payload.adult.unwrap_or(false),
            episode_run_time: payload.episode_run_time,
            languages: payload.languages,
        };

        let genres = payload
            .genres
            .into_iter()
            .map(|g| {
                positive("genres.id", g.id)?;
                Ok(Genre { id: g.id, name: g.name })
            })
            .collect::<Result<Vec<_>>>()?;

        let networks = payload
            .networks
            .into_iter()
            .map(|c| company("networks.id", c))
            .map(|r| {
                r.map(|(id, name, logo_path, origin_country)| Network {
                    id,
                    name,
                    logo_path,
                    origin_country,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let production_companies = payload
            .production_companies
            .into_iter()
            .map(|c| company("production_companies.id", c))
            .map(|r| {
                r.map(|(id, name, logo_path, origin_country)| {
                    ProductionCompany {
                        id,
                        name,
                        logo_path,
                        origin_country,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let creators = payload
            .created_by
            .into_iter()
            .map(|p| {
                positive("created_by.id", p.id)?;
                Ok(Person {
                    id: p.id,
                    name: p.name,
                    original_name: p.original_name,
                    credit_id: p.credit_id,
                    gender: p.gender,
                    profile_path: p.profile_path,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let production_countries = payload
            .production_countries
            .into_iter()
            .map(|c| {
                let code = country_code("production_countries.iso_3166_1", &c.iso_3166_1)?;
                Ok(Country {
                    iso_3166_1: code,
                    name: c.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let origin_countries = payload
            .origin_country
            .iter()
            .map(|code| country_code("origin_country", code))
            .collect::<Result<Vec<_>>>()?;

        let spoken_languages = payload
            .spoken_languages
            .into_iter()
            .map(|l| {
                let code = language_code("spoken_languages.iso_639_1", &l.iso_639_1)?;
                Ok(Language {
                    iso_639_1: code,
                    name: l.name,
                    english_name: l.english_name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut seen_numbers = HashSet::new();
        let mut seasons = Vec::with_capacity(payload.seasons.len());
        for season in payload.seasons {
            let season = season_import(show.id, season)?;
            if !seen_numbers.insert(season.season.season_number) {
                return Err(ModelError::Duplicate(format!(
                    "season number {} appears more than once",
                    season.season.season_number
                )));
            }
            seasons.push(season);
        }

        Ok(ShowImport {
            show,
            genres,
            networks,
            creators,
            production_companies,
            production_countries,
            origin_countries,
            spoken_languages,
            seasons,
        })
    }
}

fn season_import(show_id: i64, payload: SeasonPayload) -> Result<SeasonImport> {
    let id = payload.id.ok_or(ModelError::MissingField("seasons.id"))?;
    positive("seasons.id", id)?;
    let season_number = payload
        .season_number
        .ok_or(ModelError::MissingField("seasons.season_number"))?;
    if season_number < 0 {
        return Err(ModelError::invalid(
            "seasons.season_number",
            "must not be negative",
        ));
    }

    // The season detail endpoint is authoritative when episodes are present.
    let episode_count = if payload.episodes.is_empty() {
        payload.episode_count
    } else {
        Some(payload.episodes.len() as i32)
    };

    let season = Season {
        id,
        show_id,
        season_number,
        name: payload.name,
        overview: payload.overview,
        air_date: parse_date("seasons.air_date", payload.air_date)?,
        episode_count,
        poster_path: payload.poster_path,
        vote_average: payload.vote_average,
    };

    let mut seen = HashSet::new();
    let mut episodes = Vec::with_capacity(payload.episodes.len());
    for episode in payload.episodes {
        let episode = episode_import(&season, episode)?;
        if !seen.insert(episode.episode.episode_number) {
            return Err(ModelError::Duplicate(format!(
                "episode number {} appears more than once in season {}",
                episode.episode.episode_number, season.season_number
            )));
        }
        episodes.push(episode);
    }

    Ok(SeasonImport { season, episodes })
}

fn episode_import(season: &Season, payload: EpisodePayload) -> Result<EpisodeImport> {
    let id = payload.id.ok_or(ModelError::MissingField("episodes.id"))?;
    positive("episodes.id", id)?;
    let episode_number = payload
        .episode_number
        .ok_or(ModelError::MissingField("episodes.episode_number"))?;

    let episode = Episode {
        id,
        season_id: season.id,
        show_id: season.show_id,
        season_number: season.season_number,
        episode_number,
        name: payload.name.unwrap_or_default(),
        overview: payload.overview,
        air_date: parse_date("episodes.air_date", payload.air_date)?,
        runtime: payload.runtime,
        still_path: payload.still_path,
        vote_average: payload.vote_average,
        vote_count: payload.vote_count,
        production_code: payload.production_code,
        episode_type: payload.episode_type,
    };

    Ok(EpisodeImport {
        episode,
        crew: credits(payload.crew),
        guest_stars: credits(payload.guest_stars),
    })
}

/// Credits without a usable person id cannot be linked and are dropped.
fn credits(payload: Vec<CreditPayload>) -> Vec<DetailedPerson> {
    payload
        .into_iter()
        .filter(|c| c.id > 0)
        .map(|c| DetailedPerson {
            id: c.id,
            adult: c.adult.unwrap_or(false),
            credit_id: c.credit_id,
            department: c.department,
            gender: c.gender,
            job: c.job,
            known_for_department: c.known_for_department,
            name: c.name,
            original_name: c.original_name,
            popularity: c.popularity,
            profile_path: c.profile_path,
        })
        .collect()
}

type CompanyParts = (i64, String, Option<String>, Option<String>);

fn company(field: &'static str, payload: CompanyPayload) -> Result<CompanyParts> {
    positive(field, payload.id)?;
    let origin_country = payload
        .origin_country
        .and_then(|code| country_code(field, &code).ok());
    Ok((payload.id, payload.name, payload.logo_path, origin_country))
}

fn positive(field: &'static str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(ModelError::invalid(field, format!("{id} is not a valid id")));
    }
    Ok(())
}

/// ISO 3166-1 codes are stored upper-case.
fn country_code(field: &'static str, raw: &str) -> Result<String> {
    iso_code(field, raw).map(|code| code.to_ascii_uppercase())
}

/// ISO 639-1 codes are stored lower-case.
fn language_code(field: &'static str, raw: &str) -> Result<String> {
    iso_code(field, raw).map(|code| code.to_ascii_lowercase())
}

fn iso_code<'a>(field: &'static str, raw: &'a str) -> Result<&'a str> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ModelError::MissingField(field));
    }
    Ok(code)
}

/// Upstream sends `""` for unknown dates.
fn parse_date(field: &'static str, raw: Option<String>) -> Result<Option<NaiveDate>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| ModelError::invalid(field, format!("{value:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{CountryPayload, GenrePayload};

    fn payload() -> ShowPayload {
        serde_json::from_value(serde_json::json!({
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "last_air_date": "",
            "type": "Scripted",
            "genres": [{"id": 18, "name": "Drama"}],
            "networks": [{"id": 174, "name": "AMC", "origin_country": "us"}],
            "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
            "origin_country": ["US"],
            "seasons": [{
                "id": 3572,
                "season_number": 1,
                "episode_count": 7,
                "episodes": [
                    {"id": 62085, "episode_number": 1, "name": "Pilot",
                     "crew": [{"id": 66633, "name": "Vince Gilligan", "job": "Writer"},
                              {"id": 0, "name": "unknown"}],
                     "guest_stars": []},
                    {"id": 62086, "episode_number": 2, "name": "Cat's in the Bag..."}
                ]
            }]
        }))
        .expect("fixture parses")
    }

    #[test]
    fn maps_upstream_fields() {
        let import = ShowImport::try_from(payload()).expect("valid payload");

        assert_eq!(import.show.show_type.as_deref(), Some("Scripted"));
        assert_eq!(
            import.show.first_air_date,
            NaiveDate::from_ymd_opt(2008, 1, 20)
        );
        assert_eq!(import.show.last_air_date, None);
        assert!(!import.show.adult);
        assert_eq!(import.networks[0].origin_country.as_deref(), Some("US"));
        assert_eq!(import.origin_countries, vec!["US".to_string()]);
    }

    #[test]
    fn episode_count_follows_episode_list() {
        let import = ShowImport::try_from(payload()).expect("valid payload");
        let season = &import.seasons[0];

        assert_eq!(season.season.episode_count, Some(2));
        assert_eq!(season.episodes[0].episode.show_id, 1396);
        assert_eq!(season.episodes[0].episode.season_number, 1);
    }

    #[test]
    fn drops_credits_without_person_id() {
        let import = ShowImport::try_from(payload()).expect("valid payload");
        let crew = &import.seasons[0].episodes[0].crew;

        assert_eq!(crew.len(), 1);
        assert_eq!(crew[0].id, 66633);
    }

    #[test]
    fn rejects_blank_name() {
        let mut payload = payload();
        payload.name = "   ".into();

        assert_eq!(
            ShowImport::try_from(payload),
            Err(ModelError::MissingField("name"))
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        let mut payload = payload();
        payload.first_air_date = Some("20/01/2008".into());

        let err = ShowImport::try_from(payload).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidField { field: "first_air_date", .. }
        ));
    }

    #[test]
    fn rejects_repeated_season_numbers() {
        let mut payload = payload();
        let duplicate = payload.seasons[0].clone();
        payload.seasons.push(SeasonPayload {
            id: Some(9999),
            ..duplicate
        });

        assert!(matches!(
            ShowImport::try_from(payload),
            Err(ModelError::Duplicate(_))
        ));
    }

    #[test]
    fn rejects_invalid_reference_ids() {
        let mut payload = payload();
        payload.genres.push(GenrePayload {
            id: -3,
            name: "Broken".into(),
        });

        assert!(ShowImport::try_from(payload).is_err());
    }

    #[test]
    fn normalizes_iso_code_case() {
        let mut payload = payload();
        payload.production_countries.push(CountryPayload {
            iso_3166_1: " gb ".into(),
            name: "United Kingdom".into(),
        });
        payload.origin_country = vec!["us".into()];
        payload.spoken_languages = serde_json::from_value(serde_json::json!([
            {"iso_639_1": "EN", "name": "English", "english_name": "English"}
        ]))
        .expect("languages parse");

        let import = ShowImport::try_from(payload).expect("valid payload");
        let countries: Vec<_> = import
            .production_countries
            .iter()
            .map(|c| c.iso_3166_1.as_str())
            .collect();
        assert_eq!(countries, ["US", "GB"]);
        assert_eq!(import.origin_countries, ["US"]);
        assert_eq!(import.spoken_languages[0].iso_639_1, "en");
    }

    #[test]
    fn rejects_blank_country_codes() {
        let mut payload = payload();
        payload.production_countries.push(CountryPayload {
            iso_3166_1: " ".into(),
            name: "Nowhere".into(),
        });

        assert_eq!(
            ShowImport::try_from(payload),
            Err(ModelError::MissingField("production_countries.iso_3166_1"))
        );
    }
}
