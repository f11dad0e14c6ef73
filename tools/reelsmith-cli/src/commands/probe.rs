//! Show what ffprobe reports about a media file.

use std::path::PathBuf;

use reelsmith_common::AppConfig;
use reelsmith_render_engine::probe::probe;

pub fn run(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    let info = probe(&config.render.ffprobe_path, &path)?;

    println!("File: {}", path.display());
    if let Some(format) = &info.format_name {
        println!("  Format: {format}");
    }
    match info.duration {
        Some(secs) => println!("  Duration: {secs:.3}s"),
        None => println!("  Duration: unknown"),
    }
    for (i, stream) in info.streams.iter().enumerate() {
        let kind = stream.codec_type.as_deref().unwrap_or("unknown");
        let codec = stream.codec_name.as_deref().unwrap_or("?");
        match (stream.width, stream.height) {
            (Some(w), Some(h)) => println!("  Stream #{i}: {kind} {codec} {w}x{h}"),
            _ => println!("  Stream #{i}: {kind} {codec}"),
        }
    }
    Ok(())
}
