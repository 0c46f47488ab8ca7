//! The persisted prompt library and whole-file JSON persistence.

use promptlib_common::{PromptlibError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LIBRARY_DESCRIPTION: &str =
    "Seedance Prompt Library - AI video prompt examples with results";

/// One extracted prompt with its source post's metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptRecord {
    pub prompt: String,
    pub prompt_length: usize,
    pub tweet_url: String,
    pub author: String,
    pub author_name: String,
    pub author_followers: u64,
    pub created_at: String,
    pub lang: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub quotes: u64,
    pub bookmarks: u64,
    pub engagement_score: f64,
    pub video_thumbnail: String,
    pub full_text_preview: String,
    pub tags: Vec<String>,
    pub quality_score: u8,
    pub summary: String,
}

impl PromptRecord {
    /// Waiting for classification.
    pub fn is_pending(&self) -> bool {
        self.tags.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryMetadata {
    pub total_tweets: usize,
    pub prompts_extracted: usize,
    pub last_updated: String,
    pub description: String,
}

impl Default for LibraryMetadata {
    fn default() -> Self {
        Self {
            total_tweets: 0,
            prompts_extracted: 0,
            last_updated: String::new(),
            description: LIBRARY_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub metadata: LibraryMetadata,
    pub prompts: Vec<PromptRecord>,
}

impl Library {
    pub fn pending(&self) -> impl Iterator<Item = (usize, &PromptRecord)> {
        self.prompts.iter().enumerate().filter(|(_, r)| r.is_pending())
    }
}

/// File-backed [`Library`].
#[derive(Debug, Clone)]
pub struct LibraryStore {
    path: PathBuf,
}

impl LibraryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the library; [`PromptlibError::MissingInput`] when absent.
    pub fn load(&self) -> Result<Library> {
        read_json(&self.path)
    }

    pub fn save(&self, library: &Library) -> Result<()> {
        write_json_atomic(&self.path, library)
    }
}

/// Deserialize a whole JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(PromptlibError::MissingInput(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pretty-print `value` to `path` through a temp file in the same directory
/// and an atomic rename. Readers never see a partial document.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PromptlibError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = data.len(), "store.written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::new(dir.path().join("prompt_library.json"));
        assert!(matches!(store.load(), Err(PromptlibError::MissingInput(_))));
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LibraryStore::new(dir.path().join("nested").join("prompt_library.json"));

        let mut lib = Library::default();
        lib.prompts.push(PromptRecord {
            prompt: "一只猫".into(),
            tags: vec!["🎌 Anime".into()],
            ..Default::default()
        });
        store.save(&lib).unwrap();
        lib.prompts.clear();
        store.save(&lib).unwrap();

        assert_eq!(store.load().unwrap(), lib);
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unknown_and_missing_fields_are_tolerated() {
        let raw = r#"{"metadata": {"total_tweets": 3}, "prompts": [{"prompt": "x", "extra": 1}]}"#;
        let lib: Library = serde_json::from_str(raw).unwrap();
        assert_eq!(lib.metadata.total_tweets, 3);
        assert!(lib.prompts[0].is_pending());
        assert_eq!(lib.prompts[0].quality_score, 0);
    }
}
