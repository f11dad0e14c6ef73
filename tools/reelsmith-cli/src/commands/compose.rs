//! Compose a timeline from an auto-edit request.

use std::path::{Path, PathBuf};

use reelsmith_common::AppConfig;
use reelsmith_composer::{AutoEditComposer, AutoEditRequest};
use reelsmith_render_engine::probe::media_duration;

pub fn run(
    config: &AppConfig,
    request: PathBuf,
    output: Option<PathBuf>,
    probe_audio: bool,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(&request)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", request.display()))?;
    let mut req: AutoEditRequest = serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse request: {e}"))?;

    if probe_audio {
        let probed = apply_narration_durations(&mut req, &config.render.ffprobe_path);
        eprintln!("  Probed {probed} narration file(s)");
    }

    let timeline = AutoEditComposer::with_defaults()
        .compose(&req)
        .map_err(|e| anyhow::anyhow!("Failed to compose: {e}"))?;

    eprintln!(
        "  Composed {:.1}s: {} video, {} audio, {} text clip(s)",
        timeline.duration,
        timeline.tracks.video.len(),
        timeline.tracks.audio.len(),
        timeline.tracks.text.len()
    );

    match output {
        Some(path) => {
            timeline
                .save(&path)
                .map_err(|e| anyhow::anyhow!("Failed to save timeline: {e}"))?;
            eprintln!("  Timeline saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&timeline)?),
    }
    Ok(())
}

/// Replace each scene's duration with its local narration length, when
/// the narration can be probed. Returns how many scenes were updated.
fn apply_narration_durations(request: &mut AutoEditRequest, ffprobe: &str) -> usize {
    let mut probed = 0;
    for scene in request.chapters.iter_mut().flat_map(|c| c.scenes.iter_mut()) {
        let Some(audio) = scene.audio_url.as_deref() else {
            continue;
        };
        if let Some(secs) = media_duration(ffprobe, Path::new(audio)) {
            scene.duration = secs;
            probed += 1;
        } else {
            tracing::warn!(audio, duration = scene.duration, "Narration not probed; keeping scene duration");
        }
    }
    probed
}
