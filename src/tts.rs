use async_trait::async_trait;
use std::io::Cursor;

use crate::error::{Error, Result};

const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io";
const ELEVENLABS_MODEL_ID: &str = "eleven_turbo_v2";
const PCM_SAMPLE_RATE: u32 = 16_000;

/// Default narration voice when ELEVENLABS_VOICE_ID is unset
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// One synthesis request. Narration is always English and the audio format
/// is fixed by the provider call, so the text is the whole request.
#[derive(Debug, Clone)]
pub struct TtsRequest {
    pub text: String,
}

impl TtsRequest {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// A text-to-speech provider that turns narration text into WAV bytes
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &TtsRequest) -> Result<Vec<u8>>;
}

/// Synthesizer over the ElevenLabs HTTP API. The provider streams raw
/// 16 kHz mono PCM, which is wrapped into a WAV container locally.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: Option<String>,
    voice_id: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: Option<String>, voice_id: &str) -> Self {
        Self::with_base_url(api_key, voice_id, ELEVENLABS_API_URL)
    }

    /// Point the synthesizer at a different host (used by tests)
    pub fn with_base_url(
        api_key: Option<String>,
        voice_id: &str,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            voice_id: voice_id.to_string(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, request: &TtsRequest) -> Result<Vec<u8>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::SynthesisUnavailable("ELEVENLABS_API_KEY is not configured".to_string())
        })?;

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}?output_format=pcm_16000",
                self.base_url, self.voice_id
            ))
            .header("xi-api-key", api_key)
            .json(&serde_json::json!({
                "text": request.text,
                "model_id": ELEVENLABS_MODEL_ID,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SynthesisFailed(format!(
                "provider request failed with status {}",
                status
            )));
        }

        let pcm = response.bytes().await?;
        if pcm.is_empty() {
            return Err(Error::SynthesisFailed(
                "provider returned no audio bytes".to_string(),
            ));
        }

        pcm_to_wav(&pcm, PCM_SAMPLE_RATE)
    }
}

/// Wrap raw little-endian 16-bit mono PCM into a WAV container
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for sample in pcm.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([sample[0], sample[1]]))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// Duration of a WAV container in milliseconds, floored.
///
/// A zero frame rate yields zero rather than a division error.
pub fn wav_duration_ms(audio_bytes: &[u8]) -> Result<u64> {
    let reader = hound::WavReader::new(Cursor::new(audio_bytes))?;
    let sample_rate = reader.spec().sample_rate;
    let frame_count = reader.duration() as u64;

    if sample_rate == 0 {
        return Ok(0);
    }

    Ok(frame_count * 1000 / sample_rate as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a WAV with a known frame count and rate
    fn wav_with_frames(frame_count: usize, sample_rate: u32) -> Vec<u8> {
        let pcm = vec![0u8; frame_count * 2];
        pcm_to_wav(&pcm, sample_rate).unwrap()
    }

    #[test]
    fn duration_floors_frames_over_rate() {
        let wav = wav_with_frames(80_000, 16_000);
        assert_eq!(wav_duration_ms(&wav).unwrap(), 5_000);
    }

    #[test]
    fn duration_of_partial_second_is_floored() {
        let wav = wav_with_frames(16_015, 16_000);
        assert_eq!(wav_duration_ms(&wav).unwrap(), 1_000);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        assert!(wav_duration_ms(b"not a wav file").is_err());
    }

    #[test]
    fn zero_sample_rate_yields_zero_duration() {
        // WavWriter refuses a zero rate, so zero out the fmt chunk's
        // sample-rate and byte-rate fields of a valid container by hand
        let mut wav = wav_with_frames(16_000, 16_000);
        wav[24..28].fill(0);
        wav[28..32].fill(0);
        assert_eq!(wav_duration_ms(&wav).unwrap(), 0);
    }
}
