use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::{Mutex, OwnedMutexGuard};

use telly_model::{
    Country, DetailedPerson, Episode, EpisodeDetail, Genre, Language, Network,
    Person, ProductionCompany, Season, SeasonDetail, Show, ShowDetail,
    ShowSummary,
};

use super::ports::{
    CatalogStore, CatalogTx, EpisodeRole, RefKey, ReferenceKind, ReferenceRows,
    ShowRelation,
};
use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Default)]
struct CatalogState {
    shows: BTreeMap<i64, Show>,
    genres: BTreeMap<i64, Genre>,
    networks: BTreeMap<i64, Network>,
    companies: BTreeMap<i64, ProductionCompany>,
    creators: BTreeMap<i64, Person>,
    credits: BTreeMap<i64, DetailedPerson>,
    countries: BTreeMap<String, Country>,
    languages: BTreeMap<String, Language>,
    show_links: BTreeSet<(i64, ShowRelation, RefKey)>,
    seasons: BTreeMap<i64, Season>,
    episodes: BTreeMap<i64, Episode>,
    episode_people: BTreeSet<(i64, EpisodeRole, i64)>,
}

/// Row totals per table, for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub shows: usize,
    pub genres: usize,
    pub networks: usize,
    pub companies: usize,
    pub creators: usize,
    pub credits: usize,
    pub countries: usize,
    pub languages: usize,
    pub show_links: usize,
    pub seasons: usize,
    pub episodes: usize,
    pub episode_people: usize,
}

impl CatalogState {
    fn has_reference(&self, kind: ReferenceKind, key: &RefKey) -> bool {
        match (kind, key) {
            (ReferenceKind::Genre, RefKey::Id(id)) => self.genres.contains_key(id),
            (ReferenceKind::Network, RefKey::Id(id)) => self.networks.contains_key(id),
            (ReferenceKind::Company, RefKey::Id(id)) => self.companies.contains_key(id),
            (ReferenceKind::Creator, RefKey::Id(id)) => self.creators.contains_key(id),
            (ReferenceKind::Credit, RefKey::Id(id)) => self.credits.contains_key(id),
            (ReferenceKind::Country, RefKey::Code(code)) => {
                self.countries.contains_key(code)
            }
            (ReferenceKind::Language, RefKey::Code(code)) => {
                self.languages.contains_key(code)
            }
            _ => false,
        }
    }

    fn counts(&self) -> RowCounts {
        RowCounts {
            shows: self.shows.len(),
            genres: self.genres.len(),
            networks: self.networks.len(),
            companies: self.companies.len(),
            creators: self.creators.len(),
            credits: self.credits.len(),
            countries: self.countries.len(),
            languages: self.languages.len(),
            show_links: self.show_links.len(),
            seasons: self.seasons.len(),
            episodes: self.episodes.len(),
            episode_people: self.episode_people.len(),
        }
    }

    fn linked(&self, show_id: i64, relation: ShowRelation) -> impl Iterator<Item = &RefKey> {
        self.show_links
            .range((show_id, relation, RefKey::Id(i64::MIN))..)
            .take_while(move |(id, rel, _)| *id == show_id && *rel == relation)
            .map(|(_, _, key)| key)
    }

    fn linked_ids(&self, show_id: i64, relation: ShowRelation) -> Vec<i64> {
        self.linked(show_id, relation)
            .filter_map(|key| match key {
                RefKey::Id(id) => Some(*id),
                RefKey::Code(_) => None,
            })
            .collect()
    }

    fn linked_codes(&self, show_id: i64, relation: ShowRelation) -> Vec<String> {
        self.linked(show_id, relation)
            .filter_map(|key| match key {
                RefKey::Code(code) => Some(code.clone()),
                RefKey::Id(_) => None,
            })
            .collect()
    }

    fn show_detail(&self, id: i64) -> Option<ShowDetail> {
        let show = self.shows.get(&id)?.clone();
        let ids = |relation| self.linked_ids(id, relation);
        let codes = |relation| self.linked_codes(id, relation);

        let mut seasons: Vec<Season> = self
            .seasons
            .values()
            .filter(|s| s.show_id == id)
            .cloned()
            .collect();
        seasons.sort_by_key(|s| s.season_number);

        Some(ShowDetail {
            show,
            genres: pick(&self.genres, ids(ShowRelation::Genres)),
            networks: pick(&self.networks, ids(ShowRelation::Networks)),
            created_by: pick(&self.creators, ids(ShowRelation::Creators)),
            production_companies: pick(&self.companies, ids(ShowRelation::Companies)),
            production_countries: pick(
                &self.countries,
                codes(ShowRelation::ProductionCountries),
            ),
            origin_country: codes(ShowRelation::OriginCountries),
            spoken_languages: pick(&self.languages, codes(ShowRelation::SpokenLanguages)),
            seasons,
        })
    }

    fn season_detail(&self, show_id: i64, season_number: i32) -> Option<SeasonDetail> {
        let season = self
            .seasons
            .values()
            .find(|s| s.show_id == show_id && s.season_number == season_number)?
            .clone();

        let mut episodes: Vec<EpisodeDetail> = self
            .episodes
            .values()
            .filter(|e| e.season_id == season.id)
            .map(|episode| EpisodeDetail {
                crew: self.people_for(episode.id, EpisodeRole::Crew),
                guest_stars: self.people_for(episode.id, EpisodeRole::GuestStar),
                episode: episode.clone(),
            })
            .collect();
        episodes.sort_by_key(|e| e.episode.episode_number);

        Some(SeasonDetail { season, episodes })
    }

    fn people_for(&self, episode_id: i64, role: EpisodeRole) -> Vec<DetailedPerson> {
        let ids = self
            .episode_people
            .range((episode_id, role, i64::MIN)..=(episode_id, role, i64::MAX))
            .map(|(_, _, person)| *person)
            .collect();
        pick(&self.credits, ids)
    }

    fn summary(&self, show: &Show) -> ShowSummary {
        ShowSummary {
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
            genre_ids: self.linked_ids(show.id, ShowRelation::Genres),
            origin_country: self.linked_codes(show.id, ShowRelation::OriginCountries),
        }
    }

    fn remove_show(&mut self, id: i64) -> bool {
        if self.shows.remove(&id).is_none() {
            return false;
        }
        self.show_links.retain(|(show_id, _, _)| *show_id != id);
        self.seasons.retain(|_, s| s.show_id != id);
        let removed: HashSet<i64> = self
            .episodes
            .values()
            .filter(|e| e.show_id == id)
            .map(|e| e.id)
            .collect();
        self.episodes.retain(|episode_id, _| !removed.contains(episode_id));
        self.episode_people
            .retain(|(episode_id, _, _)| !removed.contains(episode_id));
        true
    }
}

fn pick<K: Ord, V: Clone>(rows: &BTreeMap<K, V>, keys: Vec<K>) -> Vec<V> {
    keys.iter().filter_map(|k| rows.get(k).cloned()).collect()
}

fn insert_missing<K: Ord, V>(
    table: &mut BTreeMap<K, V>,
    rows: Vec<V>,
    key: impl Fn(&V) -> K,
) -> u64 {
    let mut inserted = 0;
    for row in rows {
        table.entry(key(&row)).or_insert_with(|| {
            inserted += 1;
            row
        });
    }
    inserted
}

/// In-process catalog with transactional semantics.
///
/// A transaction holds the store lock for its lifetime and works on a staged
/// copy that replaces the committed state on commit. Unique constraints of
/// the relational schema are enforced the same way.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<Mutex<CatalogState>>,
    failing_episodes: Arc<DashSet<i64>>,
    lookups: Arc<AtomicUsize>,
}

impl fmt::Debug for MemoryCatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCatalogStore")
            .field("lookups", &self.lookups())
            .finish_non_exhaustive()
    }
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserting the episode with `id` fail inside any transaction.
    pub fn fail_on_episode(&self, id: i64) {
        self.failing_episodes.insert(id);
    }

    pub async fn counts(&self) -> RowCounts {
        self.state.lock().await.counts()
    }

    /// Number of `find_references` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Acquire)
    }

    pub async fn show_ids(&self) -> Vec<i64> {
        self.state.lock().await.shows.keys().copied().collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn begin(&self) -> Result<Box<dyn CatalogTx>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryCatalogTx {
            inner: Mutex::new(TxState { guard, staged }),
            failing_episodes: self.failing_episodes.clone(),
            lookups: self.lookups.clone(),
        }))
    }

    async fn show_detail(&self, id: i64) -> Result<Option<ShowDetail>> {
        Ok(self.state.lock().await.show_detail(id))
    }

    async fn season_detail(
        &self,
        show_id: i64,
        season_number: i32,
    ) -> Result<Option<SeasonDetail>> {
        Ok(self.state.lock().await.season_detail(show_id, season_number))
    }

    async fn show_summaries(&self, offset: u64, limit: u32) -> Result<Vec<ShowSummary>> {
        let state = self.state.lock().await;
        let mut shows: Vec<&Show> = state.shows.values().collect();
        shows.sort_by(|a, b| {
            let pa = a.popularity.unwrap_or(f64::NEG_INFINITY);
            let pb = b.popularity.unwrap_or(f64::NEG_INFINITY);
            pb.total_cmp(&pa).then(a.id.cmp(&b.id))
        });
        Ok(shows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|show| state.summary(show))
            .collect())
    }

    async fn count_shows(&self) -> Result<u64> {
        Ok(self.state.lock().await.shows.len() as u64)
    }

    async fn existing_show_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.shows.contains_key(id))
            .collect())
    }

    async fn delete_show(&self, id: i64) -> Result<bool> {
        Ok(self.state.lock().await.remove_show(id))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct TxState {
    guard: OwnedMutexGuard<CatalogState>,
    staged: CatalogState,
}

struct MemoryCatalogTx {
    inner: Mutex<TxState>,
    failing_episodes: Arc<DashSet<i64>>,
    lookups: Arc<AtomicUsize>,
}

#[async_trait]
impl CatalogTx for MemoryCatalogTx {
    async fn find_references(
        &self,
        kind: ReferenceKind,
        keys: &[RefKey],
    ) -> Result<HashSet<RefKey>> {
        self.lookups.fetch_add(1, Ordering::AcqRel);
        let tx = self.inner.lock().await;
        Ok(keys
            .iter()
            .filter(|key| tx.staged.has_reference(kind, key))
            .cloned()
            .collect())
    }

    async fn create_references(&self, rows: ReferenceRows) -> Result<u64> {
        let mut tx = self.inner.lock().await;
        let state = &mut tx.staged;
        let inserted = match rows {
            ReferenceRows::Genres(rows) => insert_missing(&mut state.genres, rows, |r| r.id),
            ReferenceRows::Networks(rows) => {
                if let Some(bad) = rows.iter().find(|r| {
                    r.origin_country
                        .as_ref()
                        .is_some_and(|c| !state.countries.contains_key(c))
                }) {
                    return Err(CatalogError::Database(format!(
                        "network {} references unknown country",
                        bad.id
                    )));
                }
                insert_missing(&mut state.networks, rows, |r| r.id)
            }
            ReferenceRows::Companies(rows) => {
                if let Some(bad) = rows.iter().find(|r| {
                    r.origin_country
                        .as_ref()
                        .is_some_and(|c| !state.countries.contains_key(c))
                }) {
                    return Err(CatalogError::Database(format!(
                        "production company {} references unknown country",
                        bad.id
                    )));
                }
                insert_missing(&mut state.companies, rows, |r| r.id)
            }
            ReferenceRows::Creators(rows) => insert_missing(&mut state.creators, rows, |r| r.id),
            ReferenceRows::Credits(rows) => insert_missing(&mut state.credits, rows, |r| r.id),
            ReferenceRows::Countries(rows) => {
                insert_missing(&mut state.countries, rows, |r| r.iso_3166_1.clone())
            }
            ReferenceRows::Languages(rows) => {
                insert_missing(&mut state.languages, rows, |r| r.iso_639_1.clone())
            }
        };
        Ok(inserted)
    }

    async fn insert_show(&self, show: &Show) -> Result<bool> {
        let mut tx = self.inner.lock().await;
        if tx.staged.shows.contains_key(&show.id) {
            return Ok(false);
        }
        tx.staged.shows.insert(show.id, show.clone());
        Ok(true)
    }

    async fn link_show(
        &self,
        show_id: i64,
        relation: ShowRelation,
        keys: &[RefKey],
    ) -> Result<()> {
        let mut tx = self.inner.lock().await;
        let state = &mut tx.staged;
        if !state.shows.contains_key(&show_id) {
            return Err(CatalogError::Database(format!(
                "cannot link {relation:?} to missing show {show_id}"
            )));
        }
        for key in keys {
            if !state.has_reference(relation.target(), key) {
                return Err(CatalogError::Database(format!(
                    "{} {key} does not exist",
                    relation.target().as_str()
                )));
            }
            state.show_links.insert((show_id, relation, key.clone()));
        }
        Ok(())
    }

    async fn seasons_for_show(&self, show_id: i64) -> Result<Vec<Season>> {
        let tx = self.inner.lock().await;
        Ok(tx
            .staged
            .seasons
            .values()
            .filter(|s| s.show_id == show_id)
            .cloned()
            .collect())
    }

    async fn create_season(&self, season: &Season) -> Result<bool> {
        let mut tx = self.inner.lock().await;
        let state = &mut tx.staged;
        if !state.shows.contains_key(&season.show_id) {
            return Err(CatalogError::Database(format!(
                "season {} references missing show {}",
                season.id, season.show_id
            )));
        }
        let clash = state.seasons.contains_key(&season.id)
            || state.seasons.values().any(|s| {
                s.show_id == season.show_id && s.season_number == season.season_number
            });
        if clash {
            return Ok(false);
        }
        state.seasons.insert(season.id, season.clone());
        Ok(true)
    }

    async fn existing_episode_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        let tx = self.inner.lock().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| tx.staged.episodes.contains_key(id))
            .collect())
    }

    async fn create_episode(&self, episode: &Episode) -> Result<bool> {
        if self.failing_episodes.contains(&episode.id) {
            return Err(CatalogError::Database(format!(
                "failed to insert episode {}",
                episode.id
            )));
        }
        let mut tx = self.inner.lock().await;
        let state = &mut tx.staged;
        if !state.seasons.contains_key(&episode.season_id) {
            return Err(CatalogError::Database(format!(
                "episode {} references missing season {}",
                episode.id, episode.season_id
            )));
        }
        let clash = state.episodes.contains_key(&episode.id)
            || state.episodes.values().any(|e| {
                e.season_id == episode.season_id && e.episode_number == episode.episode_number
            });
        if clash {
            return Ok(false);
        }
        state.episodes.insert(episode.id, episode.clone());
        Ok(true)
    }

    async fn link_episode_people(
        &self,
        episode_id: i64,
        role: EpisodeRole,
        person_ids: &[i64],
    ) -> Result<()> {
        let mut tx = self.inner.lock().await;
        let state = &mut tx.staged;
        if !state.episodes.contains_key(&episode_id) {
            return Err(CatalogError::Database(format!(
                "cannot link people to missing episode {episode_id}"
            )));
        }
        for person in person_ids {
            if !state.credits.contains_key(person) {
                return Err(CatalogError::Database(format!(
                    "detailed person {person} does not exist"
                )));
            }
            state.episode_people.insert((episode_id, role, *person));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let TxState { mut guard, staged } = self.inner.into_inner();
        *guard = staged;
        Ok(())
    }
}
