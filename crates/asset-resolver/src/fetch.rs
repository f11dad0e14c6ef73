//! Fetching one asset from its source into a local file.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reelsmith_common::{AssetConfig, ReelError, ReelResult, UsageMetrics};
use tokio::io::AsyncWriteExt;

use crate::error::AssetError;
use crate::source::AssetSource;
use crate::storage::{self, ObjectStore};

/// Downloads and copies assets into job workspaces.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    store: Option<Arc<dyn ObjectStore>>,
    object_prefixes: Vec<String>,
    metrics: Arc<UsageMetrics>,
}

impl Fetcher {
    /// Build a fetcher with an HTTP client honouring the redirect and
    /// timeout limits in `config`, and the object store it describes.
    pub fn new(config: &AssetConfig, metrics: Arc<UsageMetrics>) -> ReelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ReelError::config(format!("failed to build HTTP client: {e}")))?;
        let store = storage::from_config(&config.object_store, client.clone());

        Ok(Self {
            client,
            store,
            object_prefixes: config.object_prefixes.clone(),
            metrics,
        })
    }

    /// Replace the object store, e.g. with an in-process test double.
    pub fn with_store(mut self, store: Option<Arc<dyn ObjectStore>>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> Option<&Arc<dyn ObjectStore>> {
        self.store.as_ref()
    }

    pub fn metrics(&self) -> &Arc<UsageMetrics> {
        &self.metrics
    }

    pub fn classify(&self, reference: &str) -> Result<AssetSource, AssetError> {
        AssetSource::classify(reference, &self.object_prefixes)
            .ok_or_else(|| AssetError::UnsupportedReference(reference.to_string()))
    }

    /// Materialize `source` at `dest`, returning the byte count.
    pub async fn fetch(&self, source: &AssetSource, dest: &Path) -> Result<u64, AssetError> {
        let bytes = match source {
            AssetSource::LocalPath(path) => tokio::fs::copy(path, dest)
                .await
                .map_err(|e| AssetError::io(path, e))?,
            AssetSource::Http(url) => self.download(url, dest).await?,
            AssetSource::ObjectStore { key } => {
                let store = self
                    .store
                    .as_ref()
                    .ok_or_else(|| AssetError::NoObjectStore(key.clone()))?;
                store.fetch(key, dest).await?
            }
        };
        self.metrics.record_fetch(bytes);
        Ok(bytes)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, AssetError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

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
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .field("object_prefixes", &self.object_prefixes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalObjectStore;

    fn fetcher() -> Fetcher {
        Fetcher::new(&AssetConfig::default(), Arc::new(UsageMetrics::new())).unwrap()
    }

    #[tokio::test]
    async fn test_local_copy_counts_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        std::fs::write(&src, vec![7u8; 1500]).unwrap();
        let fetcher = fetcher();

        let dest = dir.path().join("dest.bin");
        let bytes = fetcher
            .fetch(&AssetSource::LocalPath(src), &dest)
            .await
            .unwrap();
        assert_eq!(bytes, 1500);
        assert_eq!(fetcher.metrics().snapshot().bytes_fetched, 1500);
        assert_eq!(fetcher.metrics().snapshot().assets_fetched, 1);
    }

    #[tokio::test]
    async fn test_object_key_without_store_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher();
        let source = fetcher.classify("/objects/a.png").unwrap();
        let err = fetcher
            .fetch(&source, &dir.path().join("a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NoObjectStore(_)));
    }

    #[tokio::test]
    async fn test_object_key_fetches_from_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("store/audio")).unwrap();
        std::fs::write(dir.path().join("store/audio/n.mp3"), b"ID3").unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(dir.path().join("store"), None));
        let fetcher = fetcher().with_store(Some(store));

        let source = fetcher.classify("/objects/audio/n.mp3").unwrap();
        let bytes = fetcher.fetch(&source, &dir.path().join("n.mp3")).await.unwrap();
        assert_eq!(bytes, 3);
    }

    #[test]
    fn test_unsupported_reference() {
        assert!(matches!(
            fetcher().classify("s3bucket/a.png"),
            Err(AssetError::UnsupportedReference(_))
        ));
    }
}
