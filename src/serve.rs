use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::error;
use serde::Deserialize;
use serde_json::json;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc as StdArc;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::assets::{guess_content_type, resolve_catalog_asset, resolve_fixture_path, AssetCategory};
use crate::catalog::{meditation_payload, CatalogStore, FixtureStore, MeditationStore};
use crate::config::AppConfig;
use crate::db;
use crate::error::Error;
use crate::generate::{spawn_generation, GenerationContext};
use crate::script::AnthropicBackend;
use crate::timeline::{rewrite_payload, UrlBuilder};
use crate::tts::ElevenLabsSynthesizer;

// State for the meditation API handlers
pub struct AppState {
    pub config: AppConfig,
    pub store: StdArc<dyn MeditationStore>,
    pub pool: Option<SqlitePool>,
    pub generation: Option<StdArc<GenerationContext>>,
}

/// Start the meditation API server
pub fn serve_meditations(config: AppConfig, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting meditation API server");
    if config.use_fixtures {
        println!("Catalog mode: JSON fixtures ({})", config.fixture_dir.display());
    } else {
        println!("Catalog mode: persisted ({})", config.database_path.display());
    }
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", port);
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  GET  /api/meditations  - List meditations");
    println!("  GET  /api/meditations/:id  - Retrieve one meditation");
    println!("  POST /api/meditations  - Create and generate a meditation");
    println!("  GET  /api/meditations/audio/*key  - Stream an audio asset");
    println!("  GET  /api/meditations/haptics/*key  - Stream a haptic asset");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let state = build_state(config).await?;
        let app = build_app(StdArc::new(state));

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Pick the storage backend once from configuration and wire up the
/// generation pipeline in catalog mode.
pub async fn build_state(config: AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    if config.use_fixtures {
        return Ok(AppState {
            store: StdArc::new(FixtureStore::new(&config.fixture_dir)),
            pool: None,
            generation: None,
            config,
        });
    }

    let pool = db::open_database_connection(&config.database_path).await?;
    db::init_database_schema(&pool).await?;

    let generation = StdArc::new(GenerationContext {
        pool: pool.clone(),
        media_dir: config.media_dir.clone(),
        script_backend: StdArc::new(AnthropicBackend::new(config.anthropic_api_key.clone())),
        script_models: config.script_models.clone(),
        synthesizer: StdArc::new(ElevenLabsSynthesizer::new(
            config.elevenlabs_api_key.clone(),
            &config.elevenlabs_voice_id,
        )),
    });

    Ok(AppState {
        store: StdArc::new(CatalogStore::new(pool.clone())),
        pool: Some(pool),
        generation: Some(generation),
        config,
    })
}

pub fn build_app(state: StdArc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/meditations",
            get(list_meditations_handler).post(create_meditation_handler),
        )
        .route("/api/meditations/{id}", get(retrieve_meditation_handler))
        .route("/api/meditations/audio/{*key}", get(audio_asset_handler))
        .route("/api/meditations/haptics/{*key}", get(haptic_asset_handler))
        .layer(cors)
        .with_state(state)
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Map an error to a client response. Lookup misses become generic 404s so
/// no path structure leaks; everything else is logged and masked as a 500.
fn error_response(err: Error) -> Response {
    match &err {
        Error::InvalidAssetKey | Error::AssetNotFound(_) | Error::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": err.to_string()})),
        )
            .into_response(),
        _ => {
            error!("request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error."})),
            )
                .into_response()
        }
    }
}

/// Absolute URL base for this request: the configured public base URL, or
/// the request's Host header
fn url_builder(config: &AppConfig, headers: &HeaderMap) -> UrlBuilder {
    if let Some(base) = &config.public_base_url {
        return UrlBuilder::new(base.clone());
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    UrlBuilder::new(format!("http://{}", host))
}

async fn list_meditations_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let payloads = match state.store.list().await {
        Ok(payloads) => payloads,
        Err(e) => return error_response(e),
    };

    let urls = url_builder(&state.config, &headers);
    let rewritten: Vec<_> = payloads
        .iter()
        .map(|payload| rewrite_payload(payload, &urls))
        .collect();

    (StatusCode::OK, Json(rewritten)).into_response()
}

async fn retrieve_meditation_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Path(meditation_id): Path<String>,
) -> Response {
    let payload = match state.store.get_by_id(&meditation_id).await {
        Ok(payload) => payload,
        Err(e) => return error_response(e),
    };

    let urls = url_builder(&state.config, &headers);
    (StatusCode::OK, Json(rewrite_payload(&payload, &urls))).into_response()
}

#[derive(Debug, Deserialize)]
pub struct CreateMeditationRequest {
    pub description: Option<String>,
}

/// Trim the submitted description, rejecting blank input
fn validate_description(raw: Option<String>) -> Option<String> {
    let description = raw?.trim().to_string();
    if description.is_empty() {
        None
    } else {
        Some(description)
    }
}

/// Derive a display title from the opening words of the prompt
fn title_from_description(description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().take(6).collect();
    if words.is_empty() {
        return "Guided Meditation".to_string();
    }
    words.join(" ")
}

async fn create_meditation_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateMeditationRequest>,
) -> Response {
    // Fixture mode is read-only demo data; the create surface does not exist
    let (pool, generation) = match (&state.pool, &state.generation) {
        (Some(pool), Some(generation)) => (pool, generation),
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Not found."})),
            )
                .into_response()
        }
    };

    let description = match validate_description(request.description) {
        Some(description) => description,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "A non-empty description is required."})),
            )
                .into_response()
        }
    };

    let meditation_id = Uuid::new_v4().to_string();
    let title = title_from_description(&description);

    let pk = match db::insert_pending_meditation(pool, &meditation_id, &title, &description).await
    {
        Ok(pk) => pk,
        Err(e) => return error_response(e),
    };
    let record = match db::fetch_meditation_by_pk(pool, pk).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(Error::NotFound("meditation".to_string())),
        Err(e) => return error_response(e),
    };

    spawn_generation(generation.clone(), pk);

    let urls = url_builder(&state.config, &headers);
    let payload = rewrite_payload(&meditation_payload(&record), &urls);
    (StatusCode::CREATED, Json(payload)).into_response()
}

/// Catalog-mode asset routes require the configured bearer token; fixture
/// mode serves demo assets unauthenticated.
fn authorize_asset_request(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    if state.config.use_fixtures {
        return Ok(());
    }
    let Some(token) = &state.config.api_token else {
        return Ok(());
    };

    let expected = format!("Bearer {token}");
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Authentication required."})),
        )
            .into_response())
    }
}

async fn audio_asset_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    serve_asset(&state, &headers, AssetCategory::Audio, &key).await
}

async fn haptic_asset_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    serve_asset(&state, &headers, AssetCategory::Haptics, &key).await
}

/// Resolve an asset key through the mode-appropriate backend and stream
/// the file with a content type guessed from its name.
async fn serve_asset(
    state: &AppState,
    headers: &HeaderMap,
    category: AssetCategory,
    key: &str,
) -> Response {
    if let Err(response) = authorize_asset_request(state, headers) {
        return response;
    }

    let file_path = if state.config.use_fixtures {
        let directory = match category {
            AssetCategory::Audio => &state.config.audio_dir,
            AssetCategory::Haptics => &state.config.haptics_dir,
        };
        match resolve_fixture_path(category, key, directory) {
            Ok(path) => path,
            Err(e) => return error_response(e),
        }
    } else {
        let pool = match &state.pool {
            Some(pool) => pool,
            None => return error_response(Error::AssetNotFound(category.label())),
        };
        let asset = match resolve_catalog_asset(pool, category, key).await {
            Ok(asset) => asset,
            Err(e) => return error_response(e),
        };
        // A row whose bytes were never stored is not servable
        if asset.file.is_empty() {
            return error_response(Error::AssetNotFound(category.label()));
        }
        state.config.media_dir.join(&asset.file)
    };

    let file = match tokio::fs::File::open(&file_path).await {
        Ok(file) => file,
        Err(_) => return error_response(Error::AssetNotFound(category.label())),
    };

    let file_name = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let content_type = guess_content_type(file_name, category);

    let stream = ReaderStream::new(file);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::path::PathBuf;

    fn test_config(use_fixtures: bool, api_token: Option<&str>) -> AppConfig {
        AppConfig {
            use_fixtures,
            fixture_dir: PathBuf::from("meditations"),
            audio_dir: PathBuf::from("audio"),
            haptics_dir: PathBuf::from("haptics"),
            media_dir: PathBuf::from("media"),
            database_path: PathBuf::from("meditations.sqlite"),
            script_models: vec!["model-a".to_string()],
            anthropic_api_key: None,
            elevenlabs_api_key: None,
            elevenlabs_voice_id: crate::tts::DEFAULT_VOICE_ID.to_string(),
            api_token: api_token.map(|token| token.to_string()),
            public_base_url: None,
        }
    }

    fn test_state(use_fixtures: bool, api_token: Option<&str>) -> AppState {
        AppState {
            config: test_config(use_fixtures, api_token),
            store: StdArc::new(FixtureStore::new("meditations")),
            pool: None,
            generation: None,
        }
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn title_uses_opening_words() {
        assert_eq!(
            title_from_description("find calm before a big presentation tomorrow morning"),
            "find calm before a big presentation"
        );
    }

    #[test]
    fn title_falls_back_when_blank() {
        assert_eq!(title_from_description(""), "Guided Meditation");
    }

    #[test]
    fn blank_descriptions_are_rejected() {
        assert_eq!(validate_description(None), None);
        assert_eq!(validate_description(Some("   ".to_string())), None);
        assert_eq!(
            validate_description(Some("  find calm  ".to_string())),
            Some("find calm".to_string())
        );
    }

    #[test]
    fn fixture_mode_asset_routes_are_unauthenticated() {
        let state = test_state(true, Some("secret"));
        assert!(authorize_asset_request(&state, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn catalog_mode_requires_the_configured_bearer_token() {
        let state = test_state(false, Some("secret"));
        assert!(authorize_asset_request(&state, &HeaderMap::new()).is_err());
        assert!(authorize_asset_request(&state, &bearer("Bearer wrong")).is_err());
        assert!(authorize_asset_request(&state, &bearer("Bearer secret")).is_ok());
    }

    #[test]
    fn catalog_mode_without_a_token_stays_open() {
        let state = test_state(false, None);
        assert!(authorize_asset_request(&state, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn url_builder_prefers_the_configured_base() {
        let mut config = test_config(true, None);
        config.public_base_url = Some("https://api.example.com/".to_string());
        let urls = url_builder(&config, &HeaderMap::new());
        assert_eq!(
            urls.audio_url("a.wav"),
            "https://api.example.com/api/meditations/audio/a.wav"
        );

        config.public_base_url = None;
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("host.test:8080"));
        let urls = url_builder(&config, &headers);
        assert_eq!(
            urls.audio_url("a.wav"),
            "http://host.test:8080/api/meditations/audio/a.wav"
        );
    }
}
