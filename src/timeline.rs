use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::{normalize_key, strip_category_prefix, AssetCategory};

/// Cue kinds the rewriter knows how to point at a serving route. Other
/// kinds pass through unchanged.
pub const CUE_KIND_WAV: &str = "wav";
pub const CUE_KIND_AHAP: &str = "ahap";

/// One timeline entry. Order within a timeline is playback order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cue {
    #[serde(rename = "atMs")]
    pub at_ms: u64,
    pub kind: String,
    pub file: String,
}

impl Cue {
    pub fn new(at_ms: u64, kind: &str, file: &str) -> Self {
        Self {
            at_ms,
            kind: kind.to_string(),
            file: file.to_string(),
        }
    }
}

/// Builds absolute serving URLs for asset keys, rooted at the request's
/// public base (configured base URL or the Host header).
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
}

impl UrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn audio_url(&self, serving_key: &str) -> String {
        format!("{}/api/meditations/audio/{}", self.base, serving_key)
    }

    pub fn haptics_url(&self, serving_key: &str) -> String {
        format!("{}/api/meditations/haptics/{}", self.base, serving_key)
    }
}

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Build the serving URL for a cue's file value, or None when the entry
/// should pass through unchanged.
fn serving_url(kind: &str, file_value: &str, urls: &UrlBuilder) -> Option<String> {
    let category = match kind {
        CUE_KIND_WAV => AssetCategory::Audio,
        CUE_KIND_AHAP => AssetCategory::Haptics,
        _ => return None,
    };

    if file_value.is_empty() || is_absolute_url(file_value) {
        return None;
    }

    // A malformed stored key is left for the serving route to reject
    let normalized = normalize_key(file_value).ok()?;
    let serving_key = strip_category_prefix(&normalized, category);

    Some(match category {
        AssetCategory::Audio => urls.audio_url(serving_key),
        AssetCategory::Haptics => urls.haptics_url(serving_key),
    })
}

/// Rewrite relative asset references in a timeline into absolute serving
/// URLs. Pure: the input value is never mutated.
///
/// Non-array timelines, non-object entries, entries with unrecognized
/// kinds, non-string or empty `file` values, and already-absolute URLs are
/// all copied through unchanged (legacy data may be malformed).
pub fn rewrite_timeline(timeline: &Value, urls: &UrlBuilder) -> Value {
    let entries = match timeline.as_array() {
        Some(entries) => entries,
        None => return timeline.clone(),
    };

    let mut updated = Vec::with_capacity(entries.len());
    for entry in entries {
        let object = match entry.as_object() {
            Some(object) => object,
            None => {
                updated.push(entry.clone());
                continue;
            }
        };

        let kind = object.get("kind").and_then(Value::as_str);
        let file_value = object.get("file").and_then(Value::as_str);

        let url = match (kind, file_value) {
            (Some(kind), Some(file_value)) => serving_url(kind, file_value, urls),
            _ => None,
        };

        match url {
            Some(url) => {
                let mut rewritten = object.clone();
                rewritten.insert("file".to_string(), Value::String(url));
                updated.push(Value::Object(rewritten));
            }
            None => updated.push(entry.clone()),
        }
    }

    Value::Array(updated)
}

/// Return a copy of a meditation payload with its `timeline` field
/// rewritten. The field is always written; a payload without one gets an
/// explicit null.
pub fn rewrite_payload(payload: &Value, urls: &UrlBuilder) -> Value {
    let mut updated = payload.clone();
    if let Some(object) = updated.as_object_mut() {
        let timeline = object
            .get("timeline")
            .map(|timeline| rewrite_timeline(timeline, urls))
            .unwrap_or(Value::Null);
        object.insert("timeline".to_string(), timeline);
    }
    updated
}
