//! Render job execution: resolve, compile, encode, upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use reelsmith_assets::{AssetResolver, Fetcher, JobWorkspace, ObjectStore};
use reelsmith_common::{AppConfig, ReelError, ReelResult, UsageMetrics};
use reelsmith_timeline::{JobStatus, RenderOutcome, RenderRequest};

use crate::compile::{compile, CompileOptions, EncodeSettings};
use crate::encoder::{EncoderBackend, FfmpegBackend};
use crate::progress::{
    download_progress, encode_progress, ProgressCallback, ProgressReporter, COMPILE_DONE,
    DOWNLOAD_START, ENCODE_START, UPLOAD_START,
};

/// Object-storage key prefix for finished renders.
pub const RENDER_KEY_PREFIX: &str = "renders/";

/// File name prefix of the in-workspace encode target.
const STAGED_PREFIX: &str = "encode-";

/// Runs render jobs.
///
/// Each call to [`RenderExecutor::render`] is an independent job with its
/// own workspace; one executor may run several jobs concurrently.
#[derive(Clone)]
pub struct RenderExecutor {
    config: AppConfig,
    resolver: AssetResolver,
    backend: Arc<dyn EncoderBackend>,
    metrics: Arc<UsageMetrics>,
}

struct Rendered {
    output: PathBuf,
    url: Option<String>,
}

impl RenderExecutor {
    /// Executor using `ffmpeg` and the object store named in `config`.
    pub fn new(config: AppConfig, metrics: Arc<UsageMetrics>) -> ReelResult<Self> {
        let fetcher = Fetcher::new(&config.assets, metrics.clone())?;
        let backend = Arc::new(FfmpegBackend::from_config(&config.render));
        Ok(Self {
            config,
            resolver: AssetResolver::new(fetcher),
            backend,
            metrics,
        })
    }

    pub fn with_backend(mut self, backend: Arc<dyn EncoderBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace the object store used for fetches and uploads.
    pub fn with_store(mut self, store: Option<Arc<dyn ObjectStore>>) -> Self {
        let fetcher = self.resolver.fetcher().clone().with_store(store);
        self.resolver = AssetResolver::new(fetcher);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn EncoderBackend> {
        &self.backend
    }

    pub fn metrics(&self) -> &Arc<UsageMetrics> {
        &self.metrics
    }

    /// Run one job to completion.
    ///
    /// Never panics or returns early without a terminal report: the outcome
    /// and the final progress update always agree, and the job workspace is
    /// gone by the time this returns.
    pub async fn render(
        &self,
        request: &RenderRequest,
        progress: Option<ProgressCallback>,
        cancel: CancellationToken,
    ) -> RenderOutcome {
        let reporter = ProgressReporter::new(progress);
        reporter.report(JobStatus::Pending, 0, "Job accepted");

        let result = match JobWorkspace::create(&self.config.jobs_dir) {
            Ok(workspace) => {
                let job_id = workspace.job_id().to_string();
                tracing::info!(
                    job_id = %job_id,
                    output = %request.output_name,
                    video_clips = request.timeline.tracks.video.len(),
                    audio_clips = request.timeline.tracks.audio.len(),
                    text_clips = request.timeline.tracks.text.len(),
                    "Render job started"
                );
                let result = self.run(request, &workspace, &reporter, &cancel).await;
                if workspace.cleanup() {
                    tracing::debug!(job_id = %job_id, "Workspace removed");
                }
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(Rendered { output, url }) => {
                let output = output.to_string_lossy().into_owned();
                self.metrics.record_job(true);
                tracing::info!(output = %output, uploaded = url.is_some(), "Render job complete");
                reporter.complete(output.clone(), url.clone());
                RenderOutcome::completed(output, url)
            }
            Err(e) => {
                self.metrics.record_job(false);
                let message = e.user_message();
                tracing::error!(error = %e, "Render job failed");
                reporter.fail(message.clone());
                RenderOutcome::failed(message)
            }
        }
    }

    async fn run(
        &self,
        request: &RenderRequest,
        workspace: &JobWorkspace,
        reporter: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> ReelResult<Rendered> {
        validate_output_name(&request.output_name)?;
        let timeline = &request.timeline;
        timeline
            .validate()
            .map_err(|e| ReelError::validation(e.to_string()))?;
        if cancel.is_cancelled() {
            return Err(ReelError::Cancelled);
        }

        reporter.report(JobStatus::Downloading, DOWNLOAD_START, "Downloading assets");
        let on_download = |done: usize, total: usize| {
            reporter.report(
                JobStatus::Downloading,
                download_progress(done, total),
                format!("Downloaded {done}/{total} assets"),
            );
        };
        let assets = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReelError::Cancelled),
            resolved = self.resolver.resolve(timeline, workspace, &on_download) => resolved?,
        };
        tracing::info!(
            job_id = workspace.job_id(),
            video = assets.video.len(),
            audio = assets.audio.len(),
            dropped = assets.failures.len(),
            "Assets resolved"
        );

        let compiled = compile(timeline, &assets, &CompileOptions::from(&self.config.render))?;
        reporter.report(JobStatus::Rendering, COMPILE_DONE, "Filter graph compiled");

        // a failed encode must never touch output_dir
        let staged = workspace
            .root()
            .join(format!("{STAGED_PREFIX}{}", request.output_name));
        let args = compiled.ffmpeg_args(&staged, &EncodeSettings::from(&self.config.render));

        reporter.report(JobStatus::Rendering, ENCODE_START, "Encoding");
        let duration = compiled.duration;
        let on_time = |secs: f64| {
            reporter.report(
                JobStatus::Rendering,
                encode_progress(secs, duration),
                format!("Encoded {secs:.1}s of {duration:.1}s"),
            );
        };
        self.metrics.record_encoder_run();
        tracing::info!(
            job_id = workspace.job_id(),
            backend = self.backend.name(),
            duration,
            "Encoding"
        );
        self.backend
            .encode(&args, duration, &on_time, cancel)
            .await?;

        if tokio::fs::metadata(&staged).await.is_err() {
            return Err(ReelError::encoder(
                format!("{} reported success but wrote no output", self.backend.name()),
                "",
            ));
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let output = self.config.output_dir.join(&request.output_name);
        publish(&staged, &output).await?;

        let url = self.upload(&output, &request.output_name, reporter).await;
        Ok(Rendered { output, url })
    }

    /// Best-effort upload; a failure leaves the render local-only.
    async fn upload(
        &self,
        output: &Path,
        output_name: &str,
        reporter: &ProgressReporter,
    ) -> Option<String> {
        let store = self.resolver.fetcher().store()?;
        reporter.report(JobStatus::Uploading, UPLOAD_START, "Uploading render");

        let key = format!("{RENDER_KEY_PREFIX}{output_name}");
        match store.put(output, &key).await {
            Ok(url) => {
                self.metrics.record_upload(true);
                tracing::info!(store = store.name(), key = %key, "Render uploaded");
                Some(url)
            }
            Err(e) => {
                self.metrics.record_upload(false);
                let e = ReelError::upload(e.to_string());
                tracing::warn!(store = store.name(), key = %key, error = %e, "Upload failed; keeping local render");
                None
            }
        }
    }
}

impl std::fmt::Debug for RenderExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderExecutor")
            .field("output_dir", &self.config.output_dir)
            .field("jobs_dir", &self.config.jobs_dir)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Move a finished render into place, replacing any previous render.
///
/// Falls back to copy-then-rename when the workspace and the output
/// directory are on different filesystems.
async fn publish(staged: &Path, output: &Path) -> ReelResult<()> {
    if tokio::fs::rename(staged, output).await.is_ok() {
        return Ok(());
    }
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = output.with_file_name(format!(".{name}.partial"));
    let moved = async {
        tokio::fs::copy(staged, &partial).await?;
        tokio::fs::rename(&partial, output).await
    }
    .await;
    if let Err(e) = moved {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// An output name must be a bare file name.
pub fn validate_output_name(name: &str) -> ReelResult<()> {
    let trimmed = name.trim();
    let bare = !trimmed.is_empty()
        && trimmed == name
        && !name.contains(['/', '\\'])
        && name != "."
        && name != ".."
        && Path::new(name).file_name().and_then(|f| f.to_str()) == Some(name);
    if bare {
        Ok(())
    } else {
        Err(ReelError::validation(format!(
            "output name must be a plain file name, got {name:?}"
        )))
    }
}
