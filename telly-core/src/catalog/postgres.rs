use std::collections::{HashMap, HashSet};
use std::fmt;

use async_trait::async_trait;
use sqlx::query_builder::Separated;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

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

/// Rows per multi-row INSERT, well under the bind parameter limit.
const INSERT_CHUNK: usize = 500;

const SHOW_COLUMNS: &str = r#"
    id, name, original_name, overview, first_air_date, last_air_date, status,
    show_type, tagline, poster_path, backdrop_path,
    popularity::float8 AS popularity, vote_average::float8 AS vote_average,
    vote_count, in_production, number_of_episodes, number_of_seasons,
    original_language, homepage, adult, episode_run_time, languages
"#;

const SEASON_COLUMNS: &str = r#"
    id, show_id, season_number, name, overview, air_date, episode_count,
    poster_path, vote_average::float8 AS vote_average
"#;

fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |e| CatalogError::Database(format!("Failed to {context}: {e}"))
}

/// Table and natural key column of a reference kind.
fn reference_table(kind: ReferenceKind) -> (&'static str, &'static str) {
    match kind {
        ReferenceKind::Genre => ("genres", "id"),
        ReferenceKind::Network => ("networks", "id"),
        ReferenceKind::Company => ("production_companies", "id"),
        ReferenceKind::Creator => ("people", "id"),
        ReferenceKind::Credit => ("detailed_people", "id"),
        ReferenceKind::Country => ("countries", "iso_3166_1"),
        ReferenceKind::Language => ("languages", "iso_639_1"),
    }
}

/// Association table and its reference column.
fn link_table(relation: ShowRelation) -> (&'static str, &'static str) {
    match relation {
        ShowRelation::Genres => ("tv_show_genres", "genre_id"),
        ShowRelation::Networks => ("tv_show_networks", "network_id"),
        ShowRelation::Creators => ("tv_show_creators", "person_id"),
        ShowRelation::Companies => ("tv_show_production_companies", "company_id"),
        ShowRelation::ProductionCountries => {
            ("tv_show_production_countries", "country_code")
        }
        ShowRelation::OriginCountries => ("tv_show_origin_countries", "country_code"),
        ShowRelation::SpokenLanguages => ("tv_show_spoken_languages", "language_code"),
    }
}

fn role_table(role: EpisodeRole) -> &'static str {
    match role {
        EpisodeRole::Crew => "episode_crew",
        EpisodeRole::GuestStar => "episode_guest_stars",
    }
}

fn split_keys(keys: &[RefKey]) -> (Vec<i64>, Vec<String>) {
    let mut ids = Vec::new();
    let mut codes = Vec::new();
    for key in keys {
        match key {
            RefKey::Id(id) => ids.push(*id),
            RefKey::Code(code) => codes.push(code.clone()),
        }
    }
    (ids, codes)
}

#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresCatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresCatalogStore")
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn linked<T>(&self, sql: &str, show_id: i64, what: &'static str) -> Result<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(sql)
            .bind(show_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err(what))
    }
}

#[derive(sqlx::FromRow)]
struct CreditRow {
    episode_id: i64,
    role: String,
    #[sqlx(flatten)]
    person: DetailedPerson,
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn begin(&self) -> Result<Box<dyn CatalogTx>> {
        let tx = self.pool.begin().await.map_err(db_err("begin transaction"))?;
        Ok(Box::new(PostgresCatalogTx {
            tx: Mutex::new(Some(tx)),
        }))
    }

    async fn show_detail(&self, id: i64) -> Result<Option<ShowDetail>> {
        let show = sqlx::query_as::<_, Show>(&format!(
            "SELECT {SHOW_COLUMNS} FROM tv_shows WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("load show"))?;

        let Some(show) = show else {
            return Ok(None);
        };

        let seasons_sql = format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE show_id = $1 ORDER BY season_number"
        );
        let (
            genres,
            networks,
            created_by,
            production_companies,
            production_countries,
            spoken_languages,
            seasons,
        ) = futures::try_join!(
            self.linked::<Genre>(
                "SELECT g.id, g.name FROM genres g \
                 JOIN tv_show_genres l ON l.genre_id = g.id \
                 WHERE l.show_id = $1 ORDER BY g.id",
                id,
                "load show genres",
            ),
            self.linked::<Network>(
                "SELECT n.id, n.name, n.logo_path, n.origin_country FROM networks n \
                 JOIN tv_show_networks l ON l.network_id = n.id \
                 WHERE l.show_id = $1 ORDER BY n.id",
                id,
                "load show networks",
            ),
            self.linked::<Person>(
                "SELECT p.id, p.name, p.original_name, p.credit_id, p.gender, p.profile_path \
                 FROM people p JOIN tv_show_creators l ON l.person_id = p.id \
                 WHERE l.show_id = $1 ORDER BY p.id",
                id,
                "load show creators",
            ),
            self.linked::<ProductionCompany>(
                "SELECT c.id, c.name, c.logo_path, c.origin_country \
                 FROM production_companies c \
                 JOIN tv_show_production_companies l ON l.company_id = c.id \
                 WHERE l.show_id = $1 ORDER BY c.id",
                id,
                "load show production companies",
            ),
            self.linked::<Country>(
                "SELECT c.iso_3166_1, c.name FROM countries c \
                 JOIN tv_show_production_countries l ON l.country_code = c.iso_3166_1 \
                 WHERE l.show_id = $1 ORDER BY c.iso_3166_1",
                id,
                "load show production countries",
            ),
            self.linked::<Language>(
                "SELECT g.iso_639_1, g.name, g.english_name FROM languages g \
                 JOIN tv_show_spoken_languages l ON l.language_code = g.iso_639_1 \
                 WHERE l.show_id = $1 ORDER BY g.iso_639_1",
                id,
                "load show spoken languages",
            ),
            self.linked::<Season>(&seasons_sql, id, "load show seasons"),
        )?;

        let origin_country = sqlx::query_scalar::<_, String>(
            "SELECT country_code FROM tv_show_origin_countries \
             WHERE show_id = $1 ORDER BY country_code",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load show origin countries"))?;

        Ok(Some(ShowDetail {
            show,
            genres,
            networks,
            created_by,
            production_companies,
            production_countries,
            origin_country,
            spoken_languages,
            seasons,
        }))
    }

    async fn season_detail(
        &self,
        show_id: i64,
        season_number: i32,
    ) -> Result<Option<SeasonDetail>> {
        let season = sqlx::query_as::<_, Season>(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE show_id = $1 AND season_number = $2"
        ))
        .bind(show_id)
        .bind(season_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("load season"))?;

        let Some(season) = season else {
            return Ok(None);
        };

        let episodes = sqlx::query_as::<_, Episode>(
            r#"
            SELECT id, season_id, show_id, season_number, episode_number, name,
                   overview, air_date, runtime, still_path,
                   vote_average::float8 AS vote_average, vote_count,
                   production_code, episode_type
            FROM episodes
            WHERE season_id = $1
            ORDER BY episode_number
            "#,
        )
        .bind(season.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load season episodes"))?;

        let credits = sqlx::query_as::<_, CreditRow>(
            r#"
            SELECT c.episode_id, c.role,
                   p.id, p.adult, p.credit_id, p.department, p.gender, p.job,
                   p.known_for_department, p.name, p.original_name,
                   p.popularity::float8 AS popularity, p.profile_path
            FROM (
                SELECT episode_id, person_id, 'crew' AS role FROM episode_crew
                UNION ALL
                SELECT episode_id, person_id, 'guest' AS role FROM episode_guest_stars
            ) c
            JOIN detailed_people p ON p.id = c.person_id
            JOIN episodes e ON e.id = c.episode_id
            WHERE e.season_id = $1
            ORDER BY c.episode_id, p.id
            "#,
        )
        .bind(season.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("load season credits"))?;

        let mut by_episode: HashMap<i64, (Vec<DetailedPerson>, Vec<DetailedPerson>)> =
            HashMap::new();
        for row in credits {
            let entry = by_episode.entry(row.episode_id).or_default();
            if row.role == "crew" {
                entry.0.push(row.person);
            } else {
                entry.1.push(row.person);
            }
        }

        let episodes = episodes
            .into_iter()
            .map(|episode| {
                let (crew, guest_stars) = by_episode.remove(&episode.id).unwrap_or_default();
                EpisodeDetail {
                    episode,
                    crew,
                    guest_stars,
                }
            })
            .collect();

        Ok(Some(SeasonDetail { season, episodes }))
    }

    async fn show_summaries(&self, offset: u64, limit: u32) -> Result<Vec<ShowSummary>> {
        sqlx::query_as::<_, ShowSummary>(
            r#"
            SELECT s.id, s.name, s.original_name, s.overview, s.first_air_date,
                   s.poster_path, s.backdrop_path,
                   s.popularity::float8 AS popularity,
                   s.vote_average::float8 AS vote_average,
                   s.vote_count, s.original_language, s.adult,
                   ARRAY(
                       SELECT g.genre_id FROM tv_show_genres g
                       WHERE g.show_id = s.id ORDER BY g.genre_id
                   ) AS genre_ids,
                   ARRAY(
                       SELECT o.country_code FROM tv_show_origin_countries o
                       WHERE o.show_id = s.id ORDER BY o.country_code
                   ) AS origin_country
            FROM tv_shows s
            ORDER BY s.popularity DESC NULLS LAST, s.id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset as i64)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("list shows"))
    }

    async fn count_shows(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tv_shows")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("count shows"))?;
        Ok(count.max(0) as u64)
    }

    async fn existing_show_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM tv_shows WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("look up shows"))?;
        Ok(found.into_iter().collect())
    }

    async fn delete_show(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tv_shows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete show"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err("reach database"))?;
        Ok(())
    }
}

/// Transaction handle. Statements issued through it are serialized on the
/// single connection the transaction owns.
struct PostgresCatalogTx {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

fn active<'a>(
    slot: &'a mut Option<Transaction<'static, Postgres>>,
) -> Result<&'a mut PgConnection> {
    slot.as_deref_mut()
        .ok_or_else(|| CatalogError::Internal("transaction already finished".into()))
}

async fn insert_chunked<T: Sync>(
    conn: &mut PgConnection,
    head: &str,
    rows: &[T],
    context: &'static str,
    mut bind: impl FnMut(Separated<'_, 'static, Postgres, &'static str>, &T) + Send,
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in rows.chunks(INSERT_CHUNK) {
        let mut qb = QueryBuilder::<Postgres>::new(head);
        qb.push_values(chunk, |b, row| bind(b, row));
        qb.push(" ON CONFLICT DO NOTHING");
        inserted += qb
            .build()
            .execute(&mut *conn)
            .await
            .map_err(db_err(context))?
            .rows_affected();
    }
    Ok(inserted)
}

#[async_trait]
impl CatalogTx for PostgresCatalogTx {
    async fn find_references(
        &self,
        kind: ReferenceKind,
        keys: &[RefKey],
    ) -> Result<HashSet<RefKey>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }
        let (table, column) = reference_table(kind);
        let sql = format!("SELECT {column} FROM {table} WHERE {column} = ANY($1)");
        let (ids, codes) = split_keys(keys);

        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        let found: HashSet<RefKey> = match kind {
            ReferenceKind::Country | ReferenceKind::Language => {
                sqlx::query_scalar::<_, String>(&sql)
                    .bind(codes)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(db_err("look up reference codes"))?
                    .into_iter()
                    .map(RefKey::Code)
                    .collect()
            }
            _ => sqlx::query_scalar::<_, i64>(&sql)
                .bind(ids)
                .fetch_all(&mut *conn)
                .await
                .map_err(db_err("look up reference ids"))?
                .into_iter()
                .map(RefKey::Id)
                .collect(),
        };
        debug!(kind = kind.as_str(), requested = keys.len(), "reference lookup");
        Ok(found)
    }

    async fn create_references(&self, rows: ReferenceRows) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;

        match rows {
            ReferenceRows::Genres(rows) => {
                insert_chunked(conn, "INSERT INTO genres (id, name) ", &rows, "insert genres", |mut b, g| {
                    b.push_bind(g.id).push_bind(g.name.clone());
                })
                .await
            }
            ReferenceRows::Networks(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO networks (id, name, logo_path, origin_country) ",
                    &rows,
                    "insert networks",
                    |mut b, n| {
                        b.push_bind(n.id)
                            .push_bind(n.name.clone())
                            .push_bind(n.logo_path.clone())
                            .push_bind(n.origin_country.clone());
                    },
                )
                .await
            }
            ReferenceRows::Companies(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO production_companies (id, name, logo_path, origin_country) ",
                    &rows,
                    "insert production companies",
                    |mut b, c| {
                        b.push_bind(c.id)
                            .push_bind(c.name.clone())
                            .push_bind(c.logo_path.clone())
                            .push_bind(c.origin_country.clone());
                    },
                )
                .await
            }
            ReferenceRows::Creators(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO people (id, name, original_name, credit_id, gender, profile_path) ",
                    &rows,
                    "insert people",
                    |mut b, p| {
                        b.push_bind(p.id)
                            .push_bind(p.name.clone())
                            .push_bind(p.original_name.clone())
                            .push_bind(p.credit_id.clone())
                            .push_bind(p.gender)
                            .push_bind(p.profile_path.clone());
                    },
                )
                .await
            }
            ReferenceRows::Credits(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO detailed_people (id, adult, credit_id, department, gender, job, \
                     known_for_department, name, original_name, popularity, profile_path) ",
                    &rows,
                    "insert detailed people",
                    |mut b, p| {
                        b.push_bind(p.id)
                            .push_bind(p.adult)
                            .push_bind(p.credit_id.clone())
                            .push_bind(p.department.clone())
                            .push_bind(p.gender)
                            .push_bind(p.job.clone())
                            .push_bind(p.known_for_department.clone())
                            .push_bind(p.name.clone())
                            .push_bind(p.original_name.clone())
                            .push_bind(p.popularity)
                            .push_bind(p.profile_path.clone());
                    },
                )
                .await
            }
            ReferenceRows::Countries(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO countries (iso_3166_1, name) ",
                    &rows,
                    "insert countries",
                    |mut b, c| {
                        b.push_bind(c.iso_3166_1.clone()).push_bind(c.name.clone());
                    },
                )
                .await
            }
            ReferenceRows::Languages(rows) => {
                insert_chunked(
                    conn,
                    "INSERT INTO languages (iso_639_1, name, english_name) ",
                    &rows,
                    "insert languages",
                    |mut b, l| {
                        b.push_bind(l.iso_639_1.clone())
                            .push_bind(l.name.clone())
                            .push_bind(l.english_name.clone());
                    },
                )
                .await
            }
        }
    }

    async fn insert_show(&self, show: &Show) -> Result<bool> {
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;

        let result = sqlx::query(
            r#"
            INSERT INTO tv_shows (
                id, name, original_name, overview, first_air_date, last_air_date,
                status, show_type, tagline, poster_path, backdrop_path,
                popularity, vote_average, vote_count, in_production,
                number_of_episodes, number_of_seasons, original_language,
                homepage, adult, episode_run_time, languages
            )
            VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11,
                $12, $13, $14, $15,
                $16, $17, $18,
                $19, $20, $21, $22
            )
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(show.id)
        .bind(&show.name)
        .bind(&show.original_name)
        .bind(&show.overview)
        .bind(show.first_air_date)
        .bind(show.last_air_date)
        .bind(&show.status)
        .bind(&show.show_type)
        .bind(&show.tagline)
        .bind(&show.poster_path)
        .bind(&show.backdrop_path)
        .bind(show.popularity)
        .bind(show.vote_average)
        .bind(show.vote_count)
        .bind(show.in_production)
        .bind(show.number_of_episodes)
        .bind(show.number_of_seasons)
        .bind(&show.original_language)
        .bind(&show.homepage)
        .bind(show.adult)
        .bind(&show.episode_run_time)
        .bind(&show.languages)
        .execute(&mut *conn)
        .await
        .map_err(db_err("insert show"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn link_show(
        &self,
        show_id: i64,
        relation: ShowRelation,
        keys: &[RefKey],
    ) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let (table, column) = link_table(relation);
        let (ids, codes) = split_keys(keys);

        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;

        let by_code = matches!(
            relation.target(),
            ReferenceKind::Country | ReferenceKind::Language
        );
        let array_type = if by_code { "text[]" } else { "bigint[]" };
        let sql = format!(
            "INSERT INTO {table} (show_id, {column}) \
             SELECT $1, UNNEST($2::{array_type}) ON CONFLICT DO NOTHING"
        );

        let query = sqlx::query(&sql).bind(show_id);
        let query = if by_code { query.bind(codes) } else { query.bind(ids) };
        query
            .execute(&mut *conn)
            .await
            .map_err(db_err("link show references"))?;
        Ok(())
    }

    async fn seasons_for_show(&self, show_id: i64) -> Result<Vec<Season>> {
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        sqlx::query_as::<_, Season>(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE show_id = $1 ORDER BY season_number"
        ))
        .bind(show_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("load seasons"))
    }

    async fn create_season(&self, season: &Season) -> Result<bool> {
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        let result = sqlx::query(
            r#"
            INSERT INTO seasons (
                id, show_id, season_number, name, overview, air_date,
                episode_count, poster_path, vote_average
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(season.id)
        .bind(season.show_id)
        .bind(season.season_number)
        .bind(&season.name)
        .bind(&season.overview)
        .bind(season.air_date)
        .bind(season.episode_count)
        .bind(&season.poster_path)
        .bind(season.vote_average)
        .execute(&mut *conn)
        .await
        .map_err(db_err("insert season"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn existing_episode_ids(&self, ids: &[i64]) -> Result<HashSet<i64>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM episodes WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err("look up episodes"))?;
        Ok(found.into_iter().collect())
    }

    async fn create_episode(&self, episode: &Episode) -> Result<bool> {
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        let result = sqlx::query(
            r#"
            INSERT INTO episodes (
                id, season_id, show_id, season_number, episode_number, name,
                overview, air_date, runtime, still_path, vote_average,
                vote_count, production_code, episode_type
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(episode.id)
        .bind(episode.season_id)
        .bind(episode.show_id)
        .bind(episode.season_number)
        .bind(episode.episode_number)
        .bind(&episode.name)
        .bind(&episode.overview)
        .bind(episode.air_date)
        .bind(episode.runtime)
        .bind(&episode.still_path)
        .bind(episode.vote_average)
        .bind(episode.vote_count)
        .bind(&episode.production_code)
        .bind(&episode.episode_type)
        .execute(&mut *conn)
        .await
        .map_err(db_err("insert episode"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn link_episode_people(
        &self,
        episode_id: i64,
        role: EpisodeRole,
        person_ids: &[i64],
    ) -> Result<()> {
        if person_ids.is_empty() {
            return Ok(());
        }
        let table = role_table(role);
        let mut guard = self.tx.lock().await;
        let conn = active(&mut guard)?;
        sqlx::query(&format!(
            "INSERT INTO {table} (episode_id, person_id) \
             SELECT $1, UNNEST($2::bigint[]) ON CONFLICT DO NOTHING"
        ))
        .bind(episode_id)
        .bind(person_ids.to_vec())
        .execute(&mut *conn)
        .await
        .map_err(db_err("link episode people"))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let tx = self
            .tx
            .into_inner()
            .ok_or_else(|| CatalogError::Internal("transaction already finished".into()))?;
        tx.commit().await.map_err(db_err("commit transaction"))
    }
}
