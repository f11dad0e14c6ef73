//! Per-job scratch directories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use reelsmith_common::ReelResult;
use uuid::Uuid;

/// A scratch directory owned by one render job.
///
/// The directory is removed exactly once: by an explicit [`cleanup`] or,
/// failing that, when the workspace is dropped.
///
/// [`cleanup`]: JobWorkspace::cleanup
#[derive(Debug)]
pub struct JobWorkspace {
    job_id: String,
    root: PathBuf,
    removed: AtomicBool,
}

impl JobWorkspace {
    /// Create a workspace with a fresh random job id under `jobs_dir`.
    pub fn create(jobs_dir: impl AsRef<Path>) -> ReelResult<Self> {
        Self::with_id(jobs_dir, Uuid::new_v4().to_string())
    }

    pub fn with_id(jobs_dir: impl AsRef<Path>, job_id: impl Into<String>) -> ReelResult<Self> {
        let job_id = job_id.into();
        let root = jobs_dir.as_ref().join(&job_id);
        std::fs::create_dir_all(&root)?;
        tracing::debug!(job_id = %job_id, root = %root.display(), "Created job workspace");
        Ok(Self {
            job_id,
            root,
            removed: AtomicBool::new(false),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for the asset of clip number `index`.
    ///
    /// The index keeps names unique even when two clip ids sanitize to the
    /// same string.
    pub fn asset_path(&self, index: usize, clip_id: &str, extension: &str) -> PathBuf {
        let safe: String = clip_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{index:03}-{safe}.{extension}"))
    }

    /// Remove the directory. Returns `true` only for the call that removed it.
    pub fn cleanup(&self) -> bool {
        if self.removed.swap(true, Ordering::SeqCst) {
            return false;
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!(job_id = %self.job_id, "Removed job workspace");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, error = %e, "Failed to remove job workspace");
            }
        }
        true
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
