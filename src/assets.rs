use sqlx::sqlite::SqlitePool;
use std::path::{Path, PathBuf};

use crate::db::{self, AssetRecord};
use crate::error::{Error, Result};

/// Category of a stored asset. Keys are unique within a category, and each
/// category has its own serving route and directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Audio,
    Haptics,
}

impl AssetCategory {
    /// Key prefix older records may or may not carry
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetCategory::Audio => "audio/",
            AssetCategory::Haptics => "haptics/",
        }
    }

    /// Short label used in client-visible error messages
    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::Audio => "audio",
            AssetCategory::Haptics => "haptic",
        }
    }

    /// Fallback content type when the filename extension is unknown
    pub fn default_content_type(&self) -> &'static str {
        match self {
            AssetCategory::Audio => "application/octet-stream",
            AssetCategory::Haptics => "application/json",
        }
    }
}

/// Normalize a caller-supplied or stored relative asset key.
///
/// Trims whitespace, strips leading slashes, drops empty and `.` path
/// segments, and rejects anything containing a `..` segment. The result
/// always uses forward-slash separators and is idempotent under repeated
/// normalization.
pub fn normalize_key(raw_key: &str) -> Result<String> {
    let trimmed = raw_key.trim().trim_start_matches('/');

    let segments: Vec<&str> = trimmed
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.is_empty() {
        return Err(Error::InvalidAssetKey);
    }
    if segments.iter().any(|segment| *segment == "..") {
        return Err(Error::InvalidAssetKey);
    }

    Ok(segments.join("/"))
}

/// Remove the category prefix from a normalized key when present
pub fn strip_category_prefix<'a>(key: &'a str, category: AssetCategory) -> &'a str {
    key.strip_prefix(category.prefix()).unwrap_or(key)
}

/// Guess a content type from the stored filename, falling back to the
/// category default for unknown extensions.
pub fn guess_content_type(filename: &str, category: AssetCategory) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        Some("json") | Some("ahap") => "application/json",
        _ => category.default_content_type(),
    }
}

/// Resolve an asset key to a file under the category's fixture directory.
/// The resolved path must be an existing regular file.
pub fn resolve_fixture_path(
    category: AssetCategory,
    raw_key: &str,
    directory: &Path,
) -> Result<PathBuf> {
    let normalized = normalize_key(raw_key)?;
    let relative = strip_category_prefix(&normalized, category);
    let file_path = directory.join(relative);

    if !file_path.is_file() {
        return Err(Error::AssetNotFound(category.label()));
    }

    Ok(file_path)
}

/// Resolve an asset key against the persisted catalog, tolerating the
/// three historical key encodings in order:
///   1. exact normalized key,
///   2. category-prefixed when the input lacks the prefix,
///   3. prefix-stripped when the input has the prefix.
///
/// Assets were written under both conventions at different times, so all
/// applicable forms must be tried before reporting a miss. Read-only.
pub async fn resolve_catalog_asset(
    pool: &SqlitePool,
    category: AssetCategory,
    raw_key: &str,
) -> Result<AssetRecord> {
    let normalized = normalize_key(raw_key)?;

    let mut candidates = vec![normalized.clone()];
    if let Some(stripped) = normalized.strip_prefix(category.prefix()) {
        candidates.push(stripped.to_string());
    } else {
        candidates.push(format!("{}{}", category.prefix(), normalized));
    }

    for candidate in &candidates {
        let asset = match category {
            AssetCategory::Audio => db::fetch_audio_asset_by_key(pool, candidate).await?,
            AssetCategory::Haptics => db::fetch_haptic_asset_by_key(pool, candidate).await?,
        };
        if let Some(asset) = asset {
            return Ok(asset);
        }
    }

    Err(Error::AssetNotFound(category.label()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cleans_separators() {
        assert_eq!(normalize_key(" /audio//foo.wav ").unwrap(), "audio/foo.wav");
        assert_eq!(normalize_key("./foo.wav").unwrap(), "foo.wav");
    }

    #[test]
    fn normalize_rejects_traversal_and_empty() {
        assert!(matches!(
            normalize_key("audio/../secret"),
            Err(Error::InvalidAssetKey)
        ));
        assert!(matches!(normalize_key("   "), Err(Error::InvalidAssetKey)));
        assert!(matches!(normalize_key("/."), Err(Error::InvalidAssetKey)));
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_key("/audio/./foo.wav").unwrap();
        let twice = normalize_key(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn content_type_falls_back_per_category() {
        assert_eq!(guess_content_type("a.wav", AssetCategory::Audio), "audio/wav");
        assert_eq!(
            guess_content_type("a.bin", AssetCategory::Audio),
            "application/octet-stream"
        );
        assert_eq!(
            guess_content_type("calm.ahap", AssetCategory::Haptics),
            "application/json"
        );
        assert_eq!(
            guess_content_type("noext", AssetCategory::Haptics),
            "application/json"
        );
    }
}
