//! Dual-backend storage layer.
//!
//! One trait, two engines: an embedded SQLite file and a client/server
//! PostgreSQL database. Both expose the same two tables with equivalent
//! column semantics, so moving between them is a row-for-row copy. Callers
//! go through [`crate::service::KcalService`]; nothing above this module
//! branches on the engine.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};

use crate::config::BackendConfig;
use crate::error::{Result, StoreError};
use crate::models::{IntakeEvent, NewIntakeEvent, UserProfile};

/// Storage operations shared by both engines.
///
/// Implementations receive fully validated rows; validation, target
/// derivation, and timestamping happen in the service layer.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Create the tables and indexes if absent. Safe to call repeatedly,
    /// including concurrently.
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert the row, or overwrite every field except `created_at` when a
    /// row with the same `user_id` already exists. One conditional
    /// statement per call, so the insert-vs-update decision is serialized
    /// by the engine. Returns the stored row.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile>;

    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>>;

    /// Append one event and return it with its engine-assigned id.
    async fn insert_event(
        &self,
        event: &NewIntakeEvent,
        created_at: DateTime<Utc>,
    ) -> Result<IntakeEvent>;

    /// Events for one user ordered by `(created_at, id)` ascending, with
    /// optional inclusive bounds.
    async fn list_events(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<IntakeEvent>>;

    /// The newest `limit` events for one user, newest first.
    async fn recent_events(&self, user_id: i64, limit: u32) -> Result<Vec<IntakeEvent>>;

    /// Sum of `calories` over the same filtered set as `list_events`;
    /// 0 for an empty set.
    async fn sum_calories(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64>;
}

/// Build the backend selected by `config` and ensure the schema exists
/// before it is handed to any caller.
pub(crate) async fn connect(config: &BackendConfig) -> Result<Box<dyn StoreBackend>> {
    let backend: Box<dyn StoreBackend> = match config {
        BackendConfig::Sqlite { path } => Box::new(SqliteBackend::open(path).await?),
        BackendConfig::Postgres { url } => Box::new(PostgresBackend::connect(url).await?),
    };
    backend.ensure_schema().await?;
    Ok(backend)
}

/// In-memory SQLite backend with its schema ensured; used by tests and
/// one-off tooling.
pub(crate) async fn connect_in_memory() -> Result<Box<dyn StoreBackend>> {
    let backend = SqliteBackend::open_in_memory().await?;
    backend.ensure_schema().await?;
    Ok(Box::new(backend))
}

// --- SQLite backend ---

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        handle TEXT,
        display_name TEXT NOT NULL,
        sex TEXT NOT NULL,
        age_years INTEGER NOT NULL,
        height_cm REAL NOT NULL,
        weight_kg REAL NOT NULL,
        daily_calorie_target INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS intake_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        food_name TEXT NOT NULL,
        calories INTEGER NOT NULL,
        source TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_intake_events_user_created
        ON intake_events(user_id, created_at)",
];

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database file.
    ///
    /// The pool holds a single connection: every statement runs on the one
    /// shared session, which is the process-level write exclusion SQLite
    /// needs.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        tracing::info!(path = %path.display(), "opened sqlite database");
        Ok(Self { pool })
    }

    /// In-memory database. The single connection is kept alive for the pool
    /// lifetime; closing it would drop the data.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SQLITE_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::SchemaInit(e.to_string()))?;
        }
        Ok(())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        sqlx::query(
            "INSERT INTO users (user_id, handle, display_name, sex, age_years, height_cm,
                                weight_kg, daily_calorie_target, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                handle = excluded.handle,
                display_name = excluded.display_name,
                sex = excluded.sex,
                age_years = excluded.age_years,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                daily_calorie_target = excluded.daily_calorie_target,
                updated_at = excluded.updated_at",
        )
        .bind(profile.user_id)
        .bind(profile.handle.as_deref())
        .bind(&profile.display_name)
        .bind(profile.sex.as_str())
        .bind(profile.age_years)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.daily_calorie_target)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        self.get_profile(profile.user_id)
            .await?
            .ok_or(StoreError::Unavailable(sqlx::Error::RowNotFound))
    }

    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT user_id, handle, display_name, sex, age_years, height_cm,
                    weight_kg, daily_calorie_target, created_at, updated_at
             FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_event(
        &self,
        event: &NewIntakeEvent,
        created_at: DateTime<Utc>,
    ) -> Result<IntakeEvent> {
        let result = sqlx::query(
            "INSERT INTO intake_events (user_id, food_name, calories, source, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.user_id)
        .bind(&event.food_name)
        .bind(event.calories)
        .bind(event.source.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(IntakeEvent {
            id: result.last_insert_rowid(),
            user_id: event.user_id,
            food_name: event.food_name.clone(),
            calories: event.calories,
            source: event.source,
            created_at,
        })
    }

    async fn list_events(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<IntakeEvent>> {
        let mut sql = String::from(
            "SELECT id, user_id, food_name, calories, source, created_at
             FROM intake_events WHERE user_id = ?",
        );
        if since.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        if until.is_some() {
            sql.push_str(" AND created_at <= ?");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut query = sqlx::query_as::<_, IntakeEvent>(&sql).bind(user_id);
        if let Some(since) = since {
            query = query.bind(since);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn recent_events(&self, user_id: i64, limit: u32) -> Result<Vec<IntakeEvent>> {
        let events = sqlx::query_as::<_, IntakeEvent>(
            "SELECT id, user_id, food_name, calories, source, created_at
             FROM intake_events WHERE user_id = ?
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn sum_calories(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(calories), 0) FROM intake_events WHERE user_id = ?",
        );
        if since.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        if until.is_some() {
            sql.push_str(" AND created_at <= ?");
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
        if let Some(since) = since {
            query = query.bind(since);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }
}

// --- PostgreSQL backend ---

const POSTGRES_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id BIGINT PRIMARY KEY,
        handle TEXT,
        display_name TEXT NOT NULL,
        sex TEXT NOT NULL,
        age_years INTEGER NOT NULL,
        height_cm DOUBLE PRECISION NOT NULL,
        weight_kg DOUBLE PRECISION NOT NULL,
        daily_calorie_target INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS intake_events (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        food_name TEXT NOT NULL,
        calories INTEGER NOT NULL,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_intake_events_user_created
        ON intake_events(user_id, created_at)",
];

pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        tracing::info!("connected to postgres database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl StoreBackend for PostgresBackend {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in POSTGRES_SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::SchemaInit(e.to_string()))?;
        }
        Ok(())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        sqlx::query(
            "INSERT INTO users (user_id, handle, display_name, sex, age_years, height_cm,
                                weight_kg, daily_calorie_target, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (user_id) DO UPDATE SET
                handle = EXCLUDED.handle,
                display_name = EXCLUDED.display_name,
                sex = EXCLUDED.sex,
                age_years = EXCLUDED.age_years,
                height_cm = EXCLUDED.height_cm,
                weight_kg = EXCLUDED.weight_kg,
                daily_calorie_target = EXCLUDED.daily_calorie_target,
                updated_at = EXCLUDED.updated_at",
        )
        .bind(profile.user_id)
        .bind(profile.handle.as_deref())
        .bind(&profile.display_name)
        .bind(profile.sex.as_str())
        .bind(profile.age_years)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.daily_calorie_target)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        self.get_profile(profile.user_id)
            .await?
            .ok_or(StoreError::Unavailable(sqlx::Error::RowNotFound))
    }

    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT user_id, handle, display_name, sex, age_years, height_cm,
                    weight_kg, daily_calorie_target, created_at, updated_at
             FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_event(
        &self,
        event: &NewIntakeEvent,
        created_at: DateTime<Utc>,
    ) -> Result<IntakeEvent> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO intake_events (user_id, food_name, calories, source, created_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(event.user_id)
        .bind(&event.food_name)
        .bind(event.calories)
        .bind(event.source.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(IntakeEvent {
            id,
            user_id: event.user_id,
            food_name: event.food_name.clone(),
            calories: event.calories,
            source: event.source,
            created_at,
        })
    }

    async fn list_events(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<IntakeEvent>> {
        let mut sql = String::from(
            "SELECT id, user_id, food_name, calories, source, created_at
             FROM intake_events WHERE user_id = $1",
        );
        let mut idx = 1;
        if since.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at >= ${idx}"));
        }
        if until.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at <= ${idx}"));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut query = sqlx::query_as::<_, IntakeEvent>(&sql).bind(user_id);
        if let Some(since) = since {
            query = query.bind(since);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn recent_events(&self, user_id: i64, limit: u32) -> Result<Vec<IntakeEvent>> {
        let events = sqlx::query_as::<_, IntakeEvent>(
            "SELECT id, user_id, food_name, calories, source, created_at
             FROM intake_events WHERE user_id = $1
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn sum_calories(
        &self,
        user_id: i64,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<i64> {
        let mut sql = String::from(
            "SELECT COALESCE(SUM(calories), 0) FROM intake_events WHERE user_id = $1",
        );
        let mut idx = 1;
        if since.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at >= ${idx}"));
        }
        if until.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND created_at <= ${idx}"));
        }

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
        if let Some(since) = since {
            query = query.bind(since);
        }
        if let Some(until) = until {
            query = query.bind(until);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }
}
