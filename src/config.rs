use std::path::PathBuf;

/// Default ordered list of script model candidates, tried in order until
/// one is available.
pub const DEFAULT_SCRIPT_MODELS: [&str; 3] = [
    "claude-3-7-sonnet-latest",
    "claude-3-5-sonnet-latest",
    "claude-3-haiku-20240307",
];

/// Values accepted as "true" for boolean environment flags
const TRUTHY_VALUES: [&str; 6] = ["1", "true", "t", "yes", "y", "on"];

/// Immutable service configuration, constructed once at startup and passed
/// into components. No component reads the environment at call time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Serve meditations from a directory of read-only JSON fixtures
    /// instead of the persisted catalog
    pub use_fixtures: bool,
    /// Directory of one-JSON-file-per-meditation fixtures
    pub fixture_dir: PathBuf,
    /// Directory of audio files served in fixture mode
    pub audio_dir: PathBuf,
    /// Directory of haptic (AHAP) files served in fixture mode
    pub haptics_dir: PathBuf,
    /// Root directory for asset files written by the generation pipeline
    /// in catalog mode
    pub media_dir: PathBuf,
    /// SQLite database file backing the persisted catalog
    pub database_path: PathBuf,
    /// Ordered script model candidates (never empty)
    pub script_models: Vec<String>,
    /// Anthropic API key; script generation is unavailable without it
    pub anthropic_api_key: Option<String>,
    /// ElevenLabs API key; speech synthesis is unavailable without it
    pub elevenlabs_api_key: Option<String>,
    /// ElevenLabs voice used for narration
    pub elevenlabs_voice_id: String,
    /// Bearer token required by catalog-mode asset routes when set
    pub api_token: Option<String>,
    /// Absolute base URL for rewritten asset links; the per-request Host
    /// header is used when unset
    pub public_base_url: Option<String>,
}

impl AppConfig {
    /// Build the configuration from the process environment, applying
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            use_fixtures: env_truthy("MEDITATIONS_FROM_JSON_FILES", true),
            fixture_dir: env_path("MEDITATIONS_JSON_DIRECTORY", "meditations"),
            audio_dir: env_path("MEDITATIONS_AUDIO_DIRECTORY", "audio"),
            haptics_dir: env_path("MEDITATIONS_HAPTICS_DIRECTORY", "haptics"),
            media_dir: env_path("MEDITATIONS_MEDIA_DIRECTORY", "media"),
            database_path: env_path("MEDITATIONS_DATABASE", "meditations.sqlite"),
            script_models: parse_script_models(
                std::env::var("MEDITATION_SCRIPT_MODELS").ok(),
                std::env::var("MEDITATION_SCRIPT_MODEL").ok(),
            ),
            anthropic_api_key: env_non_empty("ANTHROPIC_API_KEY"),
            elevenlabs_api_key: env_non_empty("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: env_non_empty("ELEVENLABS_VOICE_ID")
                .unwrap_or_else(|| crate::tts::DEFAULT_VOICE_ID.to_string()),
            api_token: env_non_empty("MEDITATIONS_API_TOKEN"),
            public_base_url: env_non_empty("MEDITATIONS_PUBLIC_BASE_URL"),
        }
    }
}

fn env_truthy(var: &str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(value) => TRUTHY_VALUES.contains(&value.trim().to_lowercase().as_str()),
        Err(_) => default,
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve the ordered script model candidate list.
///
/// A comma-separated list takes priority over the single-value override,
/// which takes priority over the built-in default. Blank entries are
/// dropped; the result is never empty.
pub fn parse_script_models(list: Option<String>, single: Option<String>) -> Vec<String> {
    if let Some(configured) = list {
        let models: Vec<String> = configured
            .split(',')
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .collect();
        if !models.is_empty() {
            return models;
        }
    }

    if let Some(configured) = single {
        let model = configured.trim();
        if !model.is_empty() {
            return vec![model.to_string()];
        }
    }

    DEFAULT_SCRIPT_MODELS
        .iter()
        .map(|model| model.to_string())
        .collect()
}
