//! Object storage backends for fetching keyed assets and publishing renders.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reelsmith_common::ObjectStoreConfig;
use tokio::io::AsyncWriteExt;

use crate::error::AssetError;

/// A key-addressed blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Copy the object at `key` to `dest`, returning the byte count.
    async fn fetch(&self, key: &str, dest: &Path) -> Result<u64, AssetError>;

    /// Store the local file under `key`, returning a URL for it.
    async fn put(&self, local: &Path, key: &str) -> Result<String, AssetError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Build the store described by `config`, if any.
///
/// A local root takes precedence over a remote base URL.
pub fn from_config(
    config: &ObjectStoreConfig,
    client: reqwest::Client,
) -> Option<Arc<dyn ObjectStore>> {
    if let Some(root) = &config.root {
        return Some(Arc::new(LocalObjectStore::new(
            root.clone(),
            config.public_base_url.clone(),
        )));
    }
    config
        .base_url
        .as_ref()
        .map(|base| Arc::new(HttpObjectStore::new(client, base.clone())) as Arc<dyn ObjectStore>)
}

/// Reject keys that could escape the store root.
fn checked_key(key: &str) -> Result<PathBuf, AssetError> {
    let path = Path::new(key.trim_start_matches('/'));
    let safe = !key.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(AssetError::InvalidKey(key.to_string()))
    }
}

/// An object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, key: &str, path: &Path) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/')),
            None => format!("file://{}", path.display()),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn fetch(&self, key: &str, dest: &Path) -> Result<u64, AssetError> {
        let src = self.root.join(checked_key(key)?);
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| AssetError::io(&src, e))
    }

    async fn put(&self, local: &Path, key: &str) -> Result<String, AssetError> {
        let dest = self.root.join(checked_key(key)?);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AssetError::io(parent, e))?;
        }
        tokio::fs::copy(local, &dest)
            .await
            .map_err(|e| AssetError::io(local, e))?;
        Ok(self.url_for(key, &dest))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// An object store reached over HTTP: `GET` and `PUT` on `<base_url>/<key>`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, key: &str, dest: &Path) -> Result<u64, AssetError> {
        checked_key(key)?;
        let url = self.url_for(key);
        let response = self.client.get(&url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| AssetError::io(dest, e))?;
        let mut stream = response.bytes_stream();
        let mut total = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AssetError::io(dest, e))?;
            total += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| AssetError::io(dest, e))?;
        Ok(total)
    }

    async fn put(&self, local: &Path, key: &str) -> Result<String, AssetError> {
        checked_key(key)?;
        let body = tokio::fs::read(local)
            .await
            .map_err(|e| AssetError::io(local, e))?;
        let url = self.url_for(key);
        self.client
            .put(&url)
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_key_rejects_traversal() {
        assert!(checked_key("renders/out.mp4").is_ok());
        assert!(checked_key("/renders/out.mp4").is_ok());
        assert!(checked_key("../etc/passwd").is_err());
        assert!(checked_key("a/../../b").is_err());
        assert!(checked_key("").is_err());
    }

    #[tokio::test]
    async fn test_local_store_put_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(
            dir.path().join("store"),
            Some("https://media.example.com/".to_string()),
        );
        let src = dir.path().join("render.mp4");
        std::fs::write(&src, b"video-bytes").unwrap();

        let url = store.put(&src, "renders/render.mp4").await.unwrap();
        assert_eq!(url, "https://media.example.com/renders/render.mp4");

        let dest = dir.path().join("copy.mp4");
        let bytes = store.fetch("renders/render.mp4", &dest).await.unwrap();
        assert_eq!(bytes, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"video-bytes");
    }

    #[tokio::test]
    async fn test_local_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), None);
        let err = store
            .fetch("missing.png", &dir.path().join("out.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn test_from_config_prefers_local_root() {
        let config = ObjectStoreConfig {
            root: Some(PathBuf::from("/var/lib/reelsmith/objects")),
            public_base_url: None,
            base_url: Some("https://store.example.com".to_string()),
        };
        let store = from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(store.name(), "local");
        assert!(from_config(&ObjectStoreConfig::default(), reqwest::Client::new()).is_none());
    }
}
