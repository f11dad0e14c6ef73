//! Classification of clip source references.

use std::path::{Path, PathBuf};

/// Where a clip's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// An absolute path on the local filesystem.
    LocalPath(PathBuf),

    /// An `http://` or `https://` URL.
    Http(String),

    /// A key in the configured object store.
    ObjectStore { key: String },
}

impl AssetSource {
    /// Classify a reference. Object-storage prefixes are checked first, so a
    /// path like `/objects/a.png` is a key and not a local file.
    pub fn classify(reference: &str, object_prefixes: &[String]) -> Option<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        for prefix in object_prefixes.iter().filter(|p| !p.is_empty()) {
            if let Some(key) = reference.strip_prefix(prefix.as_str()) {
                let key = key.trim_start_matches('/');
                return (!key.is_empty()).then(|| AssetSource::ObjectStore {
                    key: key.to_string(),
                });
            }
        }

        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Some(AssetSource::Http(reference.to_string()));
        }

        let path = Path::new(reference);
        if path.is_absolute() {
            return Some(AssetSource::LocalPath(path.to_path_buf()));
        }

        None
    }

    /// File extension hint taken from the reference, lowercased.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            AssetSource::LocalPath(path) => path.to_string_lossy().into_owned(),
            AssetSource::Http(url) => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
            AssetSource::ObjectStore { key } => key.clone(),
        };
        let ext = Path::new(&name).extension()?.to_str()?.to_ascii_lowercase();
        (ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
    }
}
