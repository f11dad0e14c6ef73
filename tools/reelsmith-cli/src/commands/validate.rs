//! Validate a timeline file.

use std::path::PathBuf;

use reelsmith_timeline::Timeline;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating timeline at: {}", path.display());

    let timeline =
        Timeline::load(&path).map_err(|e| anyhow::anyhow!("Failed to load timeline: {e}"))?;

    println!(
        "  Resolution: {}x{}",
        timeline.resolution.width, timeline.resolution.height
    );
    println!("  FPS: {}", timeline.fps);
    println!("  Duration: {:.2}s", timeline.duration);
    println!(
        "  Clips: {} video, {} audio, {} text",
        timeline.tracks.video.len(),
        timeline.tracks.audio.len(),
        timeline.tracks.text.len()
    );

    let overlaps = timeline.video_overlaps();
    for (a, b) in &overlaps {
        println!("  Note: video clips {a} and {b} overlap; the later start wins");
    }

    let issues = timeline.issues();
    if issues.is_empty() {
        println!("\nTimeline is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for issue in &issues {
        match &issue.clip_id {
            Some(id) => println!("  - [{id}] {}", issue.message),
            None => println!("  - {}", issue.message),
        }
    }
    anyhow::bail!("{} issue(s) found", issues.len())
}
