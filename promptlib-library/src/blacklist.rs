use promptlib_common::Result;
use std::collections::HashSet;
use std::path::Path;

/// Tweet URLs that must never appear in the library or its renderings.
///
/// One URL per line; blank lines and `#` comments are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    urls: HashSet<String>,
}

impl Blacklist {
    /// Load from disk. A missing file is an empty blacklist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let list = Self::parse(&raw);
        tracing::info!(path = %path.display(), entries = list.len(), "blacklist.loaded");
        Ok(list)
    }

    pub fn parse(raw: &str) -> Self {
        let urls = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { urls }
    }

    /// Empty URLs are never blacklisted.
    pub fn contains(&self, url: &str) -> bool {
        !url.is_empty() && self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
