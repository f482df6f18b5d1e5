//! Entity reconciler.
//!
//! Turns one [`ShowImport`] into normalized rows inside a single catalog
//! transaction. Shared reference rows are found or created by natural key
//! and never overwritten; seasons and episodes are matched against what the
//! show already has, so re-importing the same payload writes nothing new.

mod memo;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use telly_model::{
    Country, DetailedPerson, EpisodeImport, Genre, Language, Network, Person,
    ProductionCompany, ShowImport, ShowPayload,
};

use crate::catalog::{
    CatalogStore, CatalogTx, EpisodeRole, RefKey, ReferenceKind, ReferenceRows,
    ShowRelation,
};
use crate::error::{CatalogError, Result};

pub use memo::ImportMemo;

/// Row counts produced by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub show_id: i64,
    pub show_created: bool,
    pub seasons_created: u32,
    pub episodes_created: u32,
    pub references_created: u64,
}

/// Shared lookup row with a natural key.
trait Reference: Clone + Send + Sync {
    const KIND: ReferenceKind;

    fn key(&self) -> RefKey;

    fn rows(items: Vec<Self>) -> ReferenceRows;
}

macro_rules! id_reference {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl Reference for $ty {
            const KIND: ReferenceKind = ReferenceKind::$kind;

            fn key(&self) -> RefKey {
                RefKey::Id(self.id)
            }

            fn rows(items: Vec<Self>) -> ReferenceRows {
                ReferenceRows::$variant(items)
            }
        }
    };
}

id_reference!(Genre, Genre, Genres);
id_reference!(Network, Network, Networks);
id_reference!(ProductionCompany, Company, Companies);
id_reference!(Person, Creator, Creators);
id_reference!(DetailedPerson, Credit, Credits);

impl Reference for Country {
    const KIND: ReferenceKind = ReferenceKind::Country;

    fn key(&self) -> RefKey {
        RefKey::Code(self.iso_3166_1.clone())
    }

    fn rows(items: Vec<Self>) -> ReferenceRows {
        ReferenceRows::Countries(items)
    }
}

impl Reference for Language {
    const KIND: ReferenceKind = ReferenceKind::Language;

    fn key(&self) -> RefKey {
        RefKey::Code(self.iso_639_1.clone())
    }

    fn rows(items: Vec<Self>) -> ReferenceRows {
        ReferenceRows::Languages(items)
    }
}

/// Keys of a reference collection after reconciliation.
#[derive(Debug, Default)]
struct Resolved {
    kind: Option<ReferenceKind>,
    keys: Vec<RefKey>,
    created: u64,
}

/// Find-or-create one reference collection.
///
/// Items are deduplicated by key with the first occurrence winning. Keys the
/// memo already knows skip the lookup; the rest are looked up in one query
/// and the missing ones inserted in one write.
async fn resolve<T: Reference>(
    tx: &dyn CatalogTx,
    items: &[T],
    memo: Option<&ImportMemo>,
) -> Result<Resolved> {
    let mut seen = HashSet::new();
    let unique: Vec<&T> = items.iter().filter(|item| seen.insert(item.key())).collect();
    let keys: Vec<RefKey> = unique.iter().map(|item| item.key()).collect();

    let candidates: Vec<&T> = unique
        .iter()
        .copied()
        .filter(|item| !memo.is_some_and(|m| m.contains(T::KIND, &item.key())))
        .collect();

    let mut created = 0;
    if !candidates.is_empty() {
        let candidate_keys: Vec<RefKey> = candidates.iter().map(|item| item.key()).collect();
        let existing = tx.find_references(T::KIND, &candidate_keys).await?;
        let missing: Vec<T> = candidates
            .into_iter()
            .filter(|item| !existing.contains(&item.key()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            created = tx.create_references(T::rows(missing)).await?;
        }
    }

    debug!(
        kind = T::KIND.as_str(),
        keys = keys.len(),
        created,
        "references resolved"
    );
    Ok(Resolved {
        kind: Some(T::KIND),
        keys,
        created,
    })
}

/// Resolve a collection and link it to the show.
async fn attach<T: Reference>(
    tx: &dyn CatalogTx,
    show_id: i64,
    relation: ShowRelation,
    items: &[T],
    memo: Option<&ImportMemo>,
) -> Result<Resolved> {
    let resolved = resolve(tx, items, memo).await?;
    tx.link_show(show_id, relation, &resolved.keys).await?;
    Ok(resolved)
}

fn dedupe_people(people: &[DetailedPerson]) -> Vec<i64> {
    let mut seen = HashSet::new();
    people
        .iter()
        .map(|p| p.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Reference keys seen by an import, recorded into the memo after commit.
#[derive(Debug, Default)]
struct Touched(Vec<(ReferenceKind, Vec<RefKey>)>);

impl Touched {
    fn add(&mut self, resolved: &Resolved) -> u64 {
        if let Some(kind) = resolved.kind
            && ImportMemo::tracks(kind)
        {
            self.0.push((kind, resolved.keys.clone()));
        }
        resolved.created
    }
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Validate an upstream-shaped payload, then import it.
    pub async fn import_payload(
        &self,
        payload: ShowPayload,
        memo: Option<&ImportMemo>,
    ) -> Result<ImportOutcome> {
        let input = ShowImport::try_from(payload)?;
        self.import(&input, memo).await
    }

    /// Import one show aggregate atomically. On any error the transaction is
    /// dropped and nothing from this call is visible.
    pub async fn import(
        &self,
        input: &ShowImport,
        memo: Option<&ImportMemo>,
    ) -> Result<ImportOutcome> {
        let tx = self.store.begin().await?;
        let mut touched = Touched::default();

        let outcome = self.import_in(&*tx, input, memo, &mut touched).await?;
        tx.commit().await?;

        if let Some(memo) = memo {
            for (kind, keys) in touched.0 {
                memo.record(kind, keys);
            }
        }

        info!(
            show_id = outcome.show_id,
            show_created = outcome.show_created,
            seasons = outcome.seasons_created,
            episodes = outcome.episodes_created,
            references = outcome.references_created,
            "show imported"
        );
        Ok(outcome)
    }

    async fn import_in(
        &self,
        tx: &dyn CatalogTx,
        input: &ShowImport,
        memo: Option<&ImportMemo>,
        touched: &mut Touched,
    ) -> Result<ImportOutcome> {
        let show_id = input.id();
        let mut outcome = ImportOutcome {
            show_id,
            show_created: tx.insert_show(&input.show).await?,
            ..ImportOutcome::default()
        };

        // Countries come only from the production countries list; every
        // other country reference must match a row that already exists.
        let countries = attach(
            tx,
            show_id,
            ShowRelation::ProductionCountries,
            &input.production_countries,
            memo,
        )
        .await?;
        outcome.references_created += touched.add(&countries);

        let known = self.known_countries(tx, input, &countries.keys).await?;
        let known_code = |code: &Option<String>| {
            code.clone()
                .filter(|c| known.contains(&RefKey::Code(c.clone())))
        };
        let networks: Vec<Network> = input
            .networks
            .iter()
            .map(|n| Network {
                origin_country: known_code(&n.origin_country),
                ..n.clone()
            })
            .collect();
        let companies: Vec<ProductionCompany> = input
            .production_companies
            .iter()
            .map(|c| ProductionCompany {
                origin_country: known_code(&c.origin_country),
                ..c.clone()
            })
            .collect();
        let mut seen = HashSet::new();
        let origin_keys: Vec<RefKey> = input
            .origin_countries
            .iter()
            .map(|code| RefKey::Code(code.clone()))
            .filter(|key| known.contains(key) && seen.insert(key.clone()))
            .collect();

        let (genres, networks, creators, companies, languages, ()) = futures::try_join!(
            attach(tx, show_id, ShowRelation::Genres, &input.genres, memo),
            attach(tx, show_id, ShowRelation::Networks, &networks, memo),
            attach(tx, show_id, ShowRelation::Creators, &input.creators, memo),
            attach(tx, show_id, ShowRelation::Companies, &companies, memo),
            attach(
                tx,
                show_id,
                ShowRelation::SpokenLanguages,
                &input.spoken_languages,
                memo,
            ),
            tx.link_show(show_id, ShowRelation::OriginCountries, &origin_keys),
        )?;
        for resolved in [&genres, &networks, &creators, &companies, &languages] {
            outcome.references_created += touched.add(resolved);
        }

        // Seasons and episodes depend on persisted parent ids: sequential.
        let mut season_ids: HashMap<i32, i64> = tx
            .seasons_for_show(show_id)
            .await?
            .into_iter()
            .map(|s| (s.season_number, s.id))
            .collect();

        for season in &input.seasons {
            let number = season.season.season_number;
            let season_id = match season_ids.get(&number).copied() {
                Some(id) => id,
                None => {
                    let mut row = season.season.clone();
                    row.show_id = show_id;
                    if !tx.create_season(&row).await? {
                        return Err(CatalogError::Validation(format!(
                            "season {} already belongs to another show",
                            row.id
                        )));
                    }
                    outcome.seasons_created += 1;
                    season_ids.insert(number, row.id);
                    row.id
                }
            };

            let (episodes, people) = self
                .reconcile_episodes(tx, show_id, season_id, &season.episodes, memo, touched)
                .await?;
            outcome.episodes_created += episodes;
            outcome.references_created += people;
        }

        Ok(outcome)
    }

    /// Production country keys plus the other referenced codes that already
    /// exist in the store.
    async fn known_countries(
        &self,
        tx: &dyn CatalogTx,
        input: &ShowImport,
        production: &[RefKey],
    ) -> Result<HashSet<RefKey>> {
        let mut known: HashSet<RefKey> = production.iter().cloned().collect();
        let others: Vec<RefKey> = input
            .networks
            .iter()
            .filter_map(|n| n.origin_country.clone())
            .chain(
                input
                    .production_companies
                    .iter()
                    .filter_map(|c| c.origin_country.clone()),
            )
            .chain(input.origin_countries.iter().cloned())
            .map(RefKey::Code)
            .filter(|key| !known.contains(key))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if !others.is_empty() {
            known.extend(tx.find_references(ReferenceKind::Country, &others).await?);
        }
        Ok(known)
    }

    /// Create the episodes the store does not have yet and link their crew
    /// and guest stars. Returns (episodes created, people created).
    async fn reconcile_episodes(
        &self,
        tx: &dyn CatalogTx,
        show_id: i64,
        season_id: i64,
        episodes: &[EpisodeImport],
        memo: Option<&ImportMemo>,
        touched: &mut Touched,
    ) -> Result<(u32, u64)> {
        if episodes.is_empty() {
            return Ok((0, 0));
        }

        let ids: Vec<i64> = episodes.iter().map(|e| e.episode.id).collect();
        let existing = tx.existing_episode_ids(&ids).await?;

        let mut created: Vec<&EpisodeImport> = Vec::new();
        for episode in episodes.iter().filter(|e| !existing.contains(&e.episode.id)) {
            let mut row = episode.episode.clone();
            row.season_id = season_id;
            row.show_id = show_id;
            if tx.create_episode(&row).await? {
                created.push(episode);
            } else {
                debug!(
                    episode_id = row.id,
                    season_id,
                    episode_number = row.episode_number,
                    "episode number already taken in season, skipped"
                );
            }
        }

        if created.is_empty() {
            return Ok((0, 0));
        }

        let people: Vec<DetailedPerson> = created
            .iter()
            .flat_map(|e| e.crew.iter().chain(e.guest_stars.iter()))
            .cloned()
            .collect();
        let resolved = resolve(tx, &people, memo).await?;
        let people_created = touched.add(&resolved);

        for episode in &created {
            let id = episode.episode.id;
            tx.link_episode_people(id, EpisodeRole::Crew, &dedupe_people(&episode.crew))
                .await?;
            tx.link_episode_people(
                id,
                EpisodeRole::GuestStar,
                &dedupe_people(&episode.guest_stars),
            )
            .await?;
        }

        Ok((created.len() as u32, people_created))
    }
}
