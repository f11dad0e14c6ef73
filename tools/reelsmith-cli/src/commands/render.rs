//! Render a timeline to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use reelsmith_common::{AppConfig, UsageMetrics};
use reelsmith_render_engine::{ProgressCallback, RenderExecutor};
use reelsmith_timeline::{JobStatus, ProgressUpdate, RenderRequest, Timeline};
use tokio_util::sync::CancellationToken;

pub async fn run(
    mut config: AppConfig,
    path: PathBuf,
    output: String,
    output_dir: Option<PathBuf>,
    grain: Option<u32>,
) -> anyhow::Result<()> {
    println!("Rendering timeline at: {}", path.display());

    let timeline =
        Timeline::load(&path).map_err(|e| anyhow::anyhow!("Failed to load timeline: {e}"))?;

    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(grain) = grain {
        config.render.grain_intensity = grain;
    }

    println!("  Output: {}", config.output_dir.join(&output).display());
    println!(
        "  Resolution: {}x{} @ {} fps, {:.1}s",
        timeline.resolution.width, timeline.resolution.height, timeline.fps, timeline.duration
    );

    let metrics = Arc::new(UsageMetrics::new());
    let executor = RenderExecutor::new(config, metrics.clone())?;
    if !executor.backend().is_available() {
        anyhow::bail!(
            "No supported render backend found (expected {} in PATH)",
            executor.config().render.ffmpeg_path
        );
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Cancelling...");
            on_interrupt.cancel();
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: ProgressUpdate| {
        if p.status.is_terminal() {
            return;
        }
        print!("\r  [{:>3}%] {:<11} {:<40}", p.progress, status_label(p.status), p.message);
        let _ = std::io::stdout().flush();
    });

    let request = RenderRequest {
        timeline,
        output_name: output,
    };
    let outcome = executor.render(&request, Some(progress_cb), cancel).await;

    let usage = metrics.snapshot();
    tracing::debug!(?usage, "Usage");

    if outcome.success {
        println!(
            "\nRender complete: {}",
            outcome.output_path.as_deref().unwrap_or_default()
        );
        if let Some(url) = &outcome.object_storage_url {
            println!("  Uploaded: {url}");
        }
        println!(
            "  Assets fetched: {} ({} bytes), rejected: {}",
            usage.assets_fetched, usage.bytes_fetched, usage.assets_rejected
        );
        Ok(())
    } else {
        let error = outcome.error.unwrap_or_else(|| "unknown error".to_string());
        println!("\nRender failed: {error}");
        anyhow::bail!("render failed")
    }
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "pending",
        JobStatus::Downloading => "downloading",
        JobStatus::Rendering => "rendering",
        JobStatus::Uploading => "uploading",
        JobStatus::Complete => "complete",
        JobStatus::Failed => "failed",
    }
}
