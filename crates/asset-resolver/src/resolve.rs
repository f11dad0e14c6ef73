//! Concurrent resolution of every asset a timeline references.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use reelsmith_common::{ReelError, ReelResult};
use reelsmith_timeline::{AudioClip, Timeline, VideoClip};

use crate::error::AssetError;
use crate::fetch::Fetcher;
use crate::validate::validate_image;
use crate::workspace::JobWorkspace;

/// A video clip whose still is on local disk and validated.
#[derive(Debug, Clone)]
pub struct ResolvedVideo {
    pub clip: VideoClip,
    pub path: PathBuf,
}

/// An audio clip whose file is on local disk.
#[derive(Debug, Clone)]
pub struct ResolvedAudio {
    pub clip: AudioClip,
    pub path: PathBuf,
}

/// A clip dropped during resolution.
#[derive(Debug)]
pub struct AssetFailure {
    pub clip_id: String,
    pub error: ReelError,
}

/// Outcome of resolving a timeline: survivors in timeline order plus drops.
#[derive(Debug, Default)]
pub struct ResolvedAssets {
    pub video: Vec<ResolvedVideo>,
    pub audio: Vec<ResolvedAudio>,
    pub failures: Vec<AssetFailure>,
}

impl ResolvedAssets {
    /// Local path for a clip, if it survived.
    pub fn path_for(&self, clip_id: &str) -> Option<&PathBuf> {
        self.video
            .iter()
            .find(|v| v.clip.id == clip_id)
            .map(|v| &v.path)
            .or_else(|| {
                self.audio
                    .iter()
                    .find(|a| a.clip.id == clip_id)
                    .map(|a| &a.path)
            })
    }
}

/// Resolves timeline assets into a job workspace.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    fetcher: Fetcher,
}

impl AssetResolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch every clip source concurrently.
    ///
    /// `on_progress(done, total)` is called after each asset settles. A
    /// failing asset drops only its own clip; the call fails only when no
    /// video clip survives.
    pub async fn resolve(
        &self,
        timeline: &Timeline,
        workspace: &JobWorkspace,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> ReelResult<ResolvedAssets> {
        let video_count = timeline.tracks.video.len();
        let total = video_count + timeline.tracks.audio.len();
        let done = AtomicUsize::new(0);
        let settle = || {
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            on_progress(finished, total);
        };

        let video_jobs = timeline.tracks.video.iter().enumerate().map(|(i, clip)| {
            let settle = &settle;
            async move {
                let result = self.fetch_still(workspace, i, clip).await;
                settle();
                (clip, result)
            }
        });
        let audio_jobs = timeline.tracks.audio.iter().enumerate().map(|(i, clip)| {
            let settle = &settle;
            async move {
                let result = self
                    .fetch_to(workspace, video_count + i, &clip.id, &clip.source, "audio")
                    .await;
                settle();
                (clip, result)
            }
        });

        let (video_results, audio_results) =
            futures_util::join!(join_all(video_jobs), join_all(audio_jobs));

        let mut resolved = ResolvedAssets::default();
        for (clip, result) in video_results {
            match result {
                Ok(path) => resolved.video.push(ResolvedVideo {
                    clip: clip.clone(),
                    path,
                }),
                Err(e) => resolved.record_failure(&clip.id, e),
            }
        }
        for (clip, result) in audio_results {
            match result {
                Ok(path) => resolved.audio.push(ResolvedAudio {
                    clip: clip.clone(),
                    path,
                }),
                Err(e) => resolved.record_failure(&clip.id, e),
            }
        }

        for failure in &resolved.failures {
            if matches!(failure.error, ReelError::CorruptAsset { .. }) {
                self.fetcher.metrics().record_rejected();
            }
        }

        tracing::info!(
            job_id = %workspace.job_id(),
            video = resolved.video.len(),
            audio = resolved.audio.len(),
            dropped = resolved.failures.len(),
            "Resolved assets"
        );

        if resolved.video.is_empty() {
            return Err(ReelError::NoRenderableContent);
        }
        Ok(resolved)
    }

    async fn fetch_still(
        &self,
        workspace: &JobWorkspace,
        index: usize,
        clip: &VideoClip,
    ) -> Result<PathBuf, AssetError> {
        let path = self
            .fetch_to(workspace, index, &clip.id, &clip.source, "img")
            .await?;
        validate_image(&path).await?;
        Ok(path)
    }

    async fn fetch_to(
        &self,
        workspace: &JobWorkspace,
        index: usize,
        clip_id: &str,
        reference: &str,
        fallback_ext: &str,
    ) -> Result<PathBuf, AssetError> {
        let source = self.fetcher.classify(reference)?;
        let ext = source.extension().unwrap_or_else(|| fallback_ext.to_string());
        let dest = workspace.asset_path(index, clip_id, &ext);

        let bytes = self.fetcher.fetch(&source, &dest).await.map_err(|e| {
            // a partial download must not be mistaken for a usable file
            let _ = std::fs::remove_file(&dest);
            e
        })?;
        tracing::debug!(clip_id, bytes, path = %dest.display(), "Fetched asset");
        Ok(dest)
    }
}

impl ResolvedAssets {
    fn record_failure(&mut self, clip_id: &str, error: AssetError) {
        let error = error.for_clip(clip_id);
        tracing::warn!(clip_id, error = %error, "Dropping clip");
        self.failures.push(AssetFailure {
            clip_id: clip_id.to_string(),
            error,
        });
    }
}
