use log::{error, info};
use sqlx::sqlite::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::db::{self, MeditationRecord, MeditationStatus};
use crate::error::Result;
use crate::script::{generate_script, ScriptBackend};
use crate::timeline::{Cue, CUE_KIND_WAV};
use crate::tts::{wav_duration_ms, SpeechSynthesizer, TtsRequest};

/// Stored error text is bounded to keep rows and client payloads small
pub const ERROR_MESSAGE_MAX_CHARS: usize = 2000;

/// Everything one generation run needs. Built once at startup and shared
/// across spawned runs.
pub struct GenerationContext {
    pub pool: SqlitePool,
    pub media_dir: PathBuf,
    pub script_backend: Arc<dyn ScriptBackend>,
    pub script_models: Vec<String>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

/// Run the full generation pipeline for one meditation:
/// pending -> processing -> ready, or failed on any step error.
///
/// The processing transition is persisted before any slow provider call so
/// observers see progress promptly. Each terminal transition is a single
/// atomic update, and the failure path records the (truncated) error text
/// before returning the error to the caller.
pub async fn run_generation(context: &GenerationContext, meditation_pk: i64) -> Result<()> {
    let meditation = db::fetch_meditation_by_pk(&context.pool, meditation_pk)
        .await?
        .ok_or_else(|| {
            crate::error::Error::NotFound(format!("meditation with id {meditation_pk}"))
        })?;

    db::update_meditation_status(
        &context.pool,
        meditation.id,
        MeditationStatus::Processing,
        "",
    )
    .await?;

    match generate_assets(context, &meditation).await {
        Ok(()) => {
            info!(
                "generation completed for meditation '{}'",
                meditation.meditation_id
            );
            Ok(())
        }
        Err(err) => {
            let message = truncate_error_message(&err.to_string());
            db::update_meditation_status(
                &context.pool,
                meditation.id,
                MeditationStatus::Failed,
                &message,
            )
            .await?;
            Err(err)
        }
    }
}

/// The fallible middle of the pipeline: script, synthesis, asset
/// persistence, and the final ready transition.
async fn generate_assets(context: &GenerationContext, meditation: &MeditationRecord) -> Result<()> {
    let script = generate_script(
        context.script_backend.as_ref(),
        &context.script_models,
        &meditation.description,
    )
    .await?;

    let audio_bytes = context
        .synthesizer
        .synthesize(&TtsRequest::new(&script))
        .await?;
    let duration_ms = wav_duration_ms(&audio_bytes)?;

    let audio_key = format!("audio/{}.wav", meditation.meditation_id);
    let asset = db::get_or_create_audio_asset(&context.pool, &audio_key).await?;

    let relative_file = format!("meditations/audio/{}.wav", meditation.meditation_id);
    let file_path = context.media_dir.join(&relative_file);
    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&file_path, &audio_bytes).await?;
    db::update_audio_asset_file(&context.pool, asset.id, &relative_file).await?;

    let timeline = vec![Cue::new(0, CUE_KIND_WAV, &audio_key)];
    let timeline_json = serde_json::to_string(&timeline)?;
    db::finalize_meditation_ready(
        &context.pool,
        meditation.id,
        &script,
        duration_ms as i64,
        &timeline_json,
    )
    .await?;

    Ok(())
}

/// Bound stored error text to ERROR_MESSAGE_MAX_CHARS characters
pub fn truncate_error_message(message: &str) -> String {
    message.chars().take(ERROR_MESSAGE_MAX_CHARS).collect()
}

/// Dispatch one generation run as a background task. The create endpoint
/// enqueues exactly one run per created record; failures are logged here so
/// they remain observable after the HTTP response has gone out.
pub fn spawn_generation(context: Arc<GenerationContext>, meditation_pk: i64) {
    tokio::spawn(async move {
        if let Err(err) = run_generation(&context, meditation_pk).await {
            error!(
                "meditation generation failed for internal id {}: {}",
                meditation_pk, err
            );
        }
    });
}
