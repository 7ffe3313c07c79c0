use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use std::path::{Path, PathBuf};

use crate::db::{self, MeditationRecord};
use crate::error::{Error, Result};

/// Shape every fixture JSON file must satisfy. `durationMs` is unsigned,
/// so negative durations are rejected at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureMeditation {
    pub id: String,
    pub title: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub timeline: Value,
}

/// Read access to the meditation catalog. One implementation per storage
/// backend; the mode is picked once from configuration, never mixed within
/// a request. Timelines in returned payloads still hold relative keys;
/// the HTTP layer rewrites them per request.
#[async_trait]
pub trait MeditationStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Value>>;
    async fn get_by_id(&self, meditation_id: &str) -> Result<Value>;
}

/// Read-only catalog backed by a directory of one-JSON-file-per-meditation
/// fixtures (legacy/dev mode). Never invokes the generation pipeline.
pub struct FixtureStore {
    directory: PathBuf,
}

impl FixtureStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Fixture files sorted by filename, for a deterministic listing order
    fn sorted_fixture_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn read_fixture(path: &Path) -> Result<FixtureMeditation> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| Error::InvalidFixture {
        path: path.display().to_string(),
        detail: err.to_string(),
    })
}

#[async_trait]
impl MeditationStore for FixtureStore {
    async fn list(&self) -> Result<Vec<Value>> {
        let mut payloads = Vec::new();
        for path in self.sorted_fixture_paths()? {
            let fixture = read_fixture(&path)?;
            payloads.push(serde_json::to_value(&fixture)?);
        }
        Ok(payloads)
    }

    async fn get_by_id(&self, meditation_id: &str) -> Result<Value> {
        // Exact filename match first, then a full scan on the id field
        // (fixture filenames are not guaranteed to follow the id)
        let direct_path = self.directory.join(format!("{meditation_id}.json"));
        if direct_path.is_file() {
            let fixture = read_fixture(&direct_path)?;
            return Ok(serde_json::to_value(&fixture)?);
        }

        for path in self.sorted_fixture_paths()? {
            let fixture = read_fixture(&path)?;
            if fixture.id == meditation_id {
                return Ok(serde_json::to_value(&fixture)?);
            }
        }

        Err(Error::NotFound("meditation".to_string()))
    }
}

/// Catalog backed by the persisted meditation records
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MeditationStore for CatalogStore {
    async fn list(&self) -> Result<Vec<Value>> {
        let records = db::fetch_all_meditations(&self.pool).await?;
        Ok(records.iter().map(meditation_payload).collect())
    }

    async fn get_by_id(&self, meditation_id: &str) -> Result<Value> {
        let record = db::fetch_meditation_by_slug(&self.pool, meditation_id)
            .await?
            .ok_or_else(|| Error::NotFound("meditation".to_string()))?;
        Ok(meditation_payload(&record))
    }
}

/// Serialize a persisted meditation for clients. Catalog mode additionally
/// exposes the generation fields alongside the playback shape.
pub fn meditation_payload(record: &MeditationRecord) -> Value {
    // A timeline column that fails to parse is served as empty rather than
    // failing the whole listing
    let timeline: Value =
        serde_json::from_str(&record.timeline).unwrap_or_else(|_| Value::Array(Vec::new()));

    json!({
        "id": record.meditation_id,
        "title": record.title,
        "durationMs": record.duration_ms,
        "timeline": timeline,
        "status": record.status,
        "description": record.description,
        "script": record.script,
        "errorMessage": record.error_message,
    })
}
