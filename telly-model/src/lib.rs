//! Core data model definitions shared across telly crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod import;
pub mod page;
pub mod payload;
pub mod reference;
pub mod season;
pub mod show;

pub use error::{ModelError, Result as ModelResult};
pub use import::{EpisodeImport, SeasonImport, ShowImport};
pub use page::{Page, PAGE_SIZE};
pub use payload::{
    CompanyPayload, CountryPayload, CreatorPayload, CreditPayload,
    EpisodePayload, FeedEntry, FeedPage, GenrePayload, LanguagePayload,
    SeasonPayload, ShowPayload,
};
pub use reference::{
    Country, DetailedPerson, Genre, Language, Network, Person,
    ProductionCompany,
};
pub use season::{Episode, EpisodeDetail, Season, SeasonDetail};
pub use show::{Show, ShowDetail, ShowSummary};
