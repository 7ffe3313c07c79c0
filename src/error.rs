use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy for the meditation service.
///
/// Resolver and lookup errors surface to the HTTP layer as client errors
/// with generic messages. Pipeline errors are recorded on the meditation
/// record with status `failed` before being returned to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Asset key was empty after trimming, or contained a `..` segment
    #[error("asset key is invalid")]
    InvalidAssetKey,

    /// No stored asset matched any of the tri-form key candidates
    #[error("{0} file not found")]
    AssetNotFound(&'static str),

    /// Record lookup miss (meditation, asset row)
    #[error("{0} not found")]
    NotFound(String),

    /// The language-model capability cannot be used at all (e.g. no API key)
    #[error("script generation is unavailable: {0}")]
    ScriptGenerationUnavailable(String),

    /// Every configured model candidate was exhausted, or an available
    /// model produced empty output
    #[error("script generation failed: {0}")]
    ScriptGenerationFailed(String),

    /// The text-to-speech capability cannot be used at all (e.g. no API key)
    #[error("speech synthesis is unavailable: {0}")]
    SynthesisUnavailable(String),

    /// The text-to-speech provider returned no usable audio
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// A fixture JSON file did not match the expected meditation shape
    #[error("invalid fixture file '{path}': {detail}")]
    InvalidFixture { path: String, detail: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("wav decode error: {0}")]
    Wav(#[from] hound::Error),
}
