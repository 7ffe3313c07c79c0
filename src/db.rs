use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::error::{Error, Result};
use crate::queries::{assets, ddl, meditations};

/// Lifecycle states of a meditation record. Pending is the only creation
/// state; ready and failed are terminal for a given run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeditationStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl MeditationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeditationStatus::Pending => "pending",
            MeditationStatus::Processing => "processing",
            MeditationStatus::Ready => "ready",
            MeditationStatus::Failed => "failed",
        }
    }
}

/// One row of the meditations table
#[derive(Debug, Clone)]
pub struct MeditationRecord {
    /// Internal scheduling id, never exposed to clients
    pub id: i64,
    /// Public URL-safe slug
    pub meditation_id: String,
    pub title: String,
    pub description: String,
    pub script: String,
    pub duration_ms: i64,
    /// Timeline cues as stored JSON
    pub timeline: String,
    pub status: String,
    pub error_message: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One row of an asset table (audio or haptic)
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub id: i64,
    pub key: String,
    /// Path relative to the media directory; empty until bytes are stored
    pub file: String,
}

/// Open a file-based database connection pool for production use.
/// Enables WAL mode and foreign keys, creating the file if needed.
pub async fn open_database_connection(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create an in-memory database pool for testing.
/// Capped at one connection so every query sees the same database.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Create all tables if they do not exist. Safe to run at every startup.
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&ddl::create_meditations_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_meditation_audio_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_meditation_haptic_table())
        .execute(pool)
        .await?;
    Ok(())
}

/// RFC 3339 UTC timestamp used for created_at/updated_at columns
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn meditation_from_row(row: &sqlx::sqlite::SqliteRow) -> MeditationRecord {
    MeditationRecord {
        id: row.get("id"),
        meditation_id: row.get("meditation_id"),
        title: row.get("title"),
        description: row.get("description"),
        script: row.get("script"),
        duration_ms: row.get("duration_ms"),
        timeline: row.get("timeline"),
        status: row.get("status"),
        error_message: row.get("error_message"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Insert a fresh pending meditation and return its internal id
pub async fn insert_pending_meditation(
    pool: &SqlitePool,
    meditation_id: &str,
    title: &str,
    description: &str,
) -> Result<i64> {
    let now = now_timestamp();
    let sql = meditations::insert_pending(meditation_id, title, description, &now);
    let result = sqlx::query(&sql).execute(pool).await?;
    Ok(result.last_insert_rowid())
}

pub async fn fetch_meditation_by_pk(
    pool: &SqlitePool,
    pk: i64,
) -> Result<Option<MeditationRecord>> {
    let sql = meditations::select_by_pk(pk);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.as_ref().map(meditation_from_row))
}

pub async fn fetch_meditation_by_slug(
    pool: &SqlitePool,
    meditation_id: &str,
) -> Result<Option<MeditationRecord>> {
    let sql = meditations::select_by_meditation_id(meditation_id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.as_ref().map(meditation_from_row))
}

pub async fn fetch_all_meditations(pool: &SqlitePool) -> Result<Vec<MeditationRecord>> {
    let sql = meditations::select_all();
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(meditation_from_row).collect())
}

/// Set status and error message in a single statement
pub async fn update_meditation_status(
    pool: &SqlitePool,
    pk: i64,
    status: MeditationStatus,
    error_message: &str,
) -> Result<()> {
    let now = now_timestamp();
    let sql = meditations::update_status(pk, status.as_str(), error_message, &now);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

/// Persist every generated field and mark the meditation ready, atomically
pub async fn finalize_meditation_ready(
    pool: &SqlitePool,
    pk: i64,
    script: &str,
    duration_ms: i64,
    timeline_json: &str,
) -> Result<()> {
    let now = now_timestamp();
    let sql = meditations::finalize_ready(pk, script, duration_ms, timeline_json, &now);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}

fn asset_from_row(row: &sqlx::sqlite::SqliteRow, key_column: &str) -> AssetRecord {
    AssetRecord {
        id: row.get("id"),
        key: row.get(key_column),
        file: row.get("file"),
    }
}

pub async fn fetch_audio_asset_by_key(
    pool: &SqlitePool,
    audio_key: &str,
) -> Result<Option<AssetRecord>> {
    let sql = assets::select_audio_by_key(audio_key);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.as_ref().map(|row| asset_from_row(row, "audio_key")))
}

pub async fn fetch_haptic_asset_by_key(
    pool: &SqlitePool,
    haptic_key: &str,
) -> Result<Option<AssetRecord>> {
    let sql = assets::select_haptic_by_key(haptic_key);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    Ok(row.as_ref().map(|row| asset_from_row(row, "haptic_key")))
}

/// Get or create the audio asset row for a key. Repeated calls return the
/// same row; the insert is a no-op when the key already exists.
pub async fn get_or_create_audio_asset(pool: &SqlitePool, audio_key: &str) -> Result<AssetRecord> {
    let now = now_timestamp();
    let sql = assets::insert_audio_ignore(audio_key, &now);
    sqlx::query(&sql).execute(pool).await?;

    fetch_audio_asset_by_key(pool, audio_key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("audio asset '{audio_key}'")))
}

/// Record where an asset's bytes were stored
pub async fn update_audio_asset_file(pool: &SqlitePool, pk: i64, file: &str) -> Result<()> {
    let now = now_timestamp();
    let sql = assets::update_audio_file(pk, file, &now);
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
