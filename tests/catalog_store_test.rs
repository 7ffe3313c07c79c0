use std::fs;

use serde_json::json;

use meditation_service::catalog::{CatalogStore, FixtureStore, MeditationStore};
use meditation_service::db;
use meditation_service::Error;

fn write_fixture(dir: &std::path::Path, name: &str, id: &str, title: &str) {
    let payload = json!({
        "id": id,
        "title": title,
        "durationMs": 60000,
        "timeline": [{"atMs": 0, "kind": "wav", "file": format!("audio/{id}.wav")}],
    });
    fs::write(dir.join(name), payload.to_string()).unwrap();
}

#[tokio::test]
async fn fixture_listing_is_sorted_by_filename() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "b.json", "beta", "Beta");
    write_fixture(dir.path(), "a.json", "alpha", "Alpha");
    // Non-JSON files are ignored
    fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

    let store = FixtureStore::new(dir.path());
    let listed = store.list().await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], json!("alpha"));
    assert_eq!(listed[1]["id"], json!("beta"));
}

#[tokio::test]
async fn fixture_listing_rejects_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "ok.json", "ok", "Ok");
    fs::write(
        dir.path().join("bad.json"),
        json!({"id": "bad", "title": "Bad", "durationMs": -5, "timeline": []}).to_string(),
    )
    .unwrap();

    let store = FixtureStore::new(dir.path());
    assert!(matches!(
        store.list().await,
        Err(Error::InvalidFixture { .. })
    ));
}

#[tokio::test]
async fn fixture_retrieval_tries_filename_then_scans_ids() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "calm.json", "calm", "Calm");
    // Filename does not follow the id
    write_fixture(dir.path(), "zzz.json", "custom-id", "Custom");

    let store = FixtureStore::new(dir.path());

    let direct = store.get_by_id("calm").await.unwrap();
    assert_eq!(direct["title"], json!("Calm"));

    let scanned = store.get_by_id("custom-id").await.unwrap();
    assert_eq!(scanned["title"], json!("Custom"));

    assert!(matches!(
        store.get_by_id("missing").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn catalog_listing_orders_by_title_then_id() {
    let pool = db::open_in_memory().await.unwrap();
    db::init_database_schema(&pool).await.unwrap();

    db::insert_pending_meditation(&pool, "id-2", "Evening wind-down", "desc")
        .await
        .unwrap();
    db::insert_pending_meditation(&pool, "id-1", "Morning focus", "desc")
        .await
        .unwrap();
    db::insert_pending_meditation(&pool, "id-0", "Evening wind-down", "desc")
        .await
        .unwrap();

    let store = CatalogStore::new(pool);
    let listed = store.list().await.unwrap();

    let ids: Vec<_> = listed
        .iter()
        .map(|payload| payload["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["id-0", "id-2", "id-1"]);
}

#[tokio::test]
async fn catalog_payload_carries_generation_fields() {
    let pool = db::open_in_memory().await.unwrap();
    db::init_database_schema(&pool).await.unwrap();

    db::insert_pending_meditation(&pool, "calm-1", "find calm", "find calm")
        .await
        .unwrap();

    let store = CatalogStore::new(pool);
    let payload = store.get_by_id("calm-1").await.unwrap();

    assert_eq!(payload["id"], json!("calm-1"));
    assert_eq!(payload["status"], json!("pending"));
    assert_eq!(payload["description"], json!("find calm"));
    assert_eq!(payload["script"], json!(""));
    assert_eq!(payload["errorMessage"], json!(""));
    assert_eq!(payload["durationMs"], json!(0));
    assert_eq!(payload["timeline"], json!([]));

    assert!(matches!(
        store.get_by_id("missing").await,
        Err(Error::NotFound(_))
    ));
}
