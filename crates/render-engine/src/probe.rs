//! Media inspection through `ffprobe`.

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use reelsmith_common::{ReelError, ReelResult};

/// Scene length used when a narration file cannot be probed.
pub const DEFAULT_SCENE_DURATION: f64 = 5.0;

/// What `ffprobe` reports about a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds, when known.
    pub duration: Option<f64>,
    pub format_name: Option<String>,
    pub streams: Vec<StreamInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

#[derive(Default, Deserialize)]
struct ProbeFormat {
    // ffprobe prints numbers as strings
    duration: Option<String>,
    format_name: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(json: &str) -> ReelResult<MediaInfo> {
    let raw: ProbeOutput = serde_json::from_str(json)?;
    let duration = raw
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);
    Ok(MediaInfo {
        duration,
        format_name: raw.format.format_name,
        streams: raw.streams,
    })
}

/// Run `ffprobe` on `path`.
pub fn probe(ffprobe: &str, path: &Path) -> ReelResult<MediaInfo> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()?;

    if !output.status.success() {
        return Err(ReelError::unsupported(format!(
            "{ffprobe} could not read {} ({})",
            path.display(),
            output.status
        )));
    }
    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Duration of `path` in seconds, or `None` when it cannot be probed.
pub fn media_duration(ffprobe: &str, path: &Path) -> Option<f64> {
    match probe(ffprobe, path) {
        Ok(info) => info.duration,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Probe failed");
            None
        }
    }
}

/// Duration of `path`, falling back to [`DEFAULT_SCENE_DURATION`].
pub fn duration_or_default(ffprobe: &str, path: &Path) -> f64 {
    media_duration(ffprobe, path).unwrap_or(DEFAULT_SCENE_DURATION)
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "codec_name": "mp3", "sample_rate": "44100"}],
            "format": {"format_name": "mp3", "duration": "12.480000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration, Some(12.48));
        assert_eq!(info.format_name.as_deref(), Some("mp3"));
        assert_eq!(info.streams.len(), 1);
        assert_eq!(info.streams[0].codec_type.as_deref(), Some("audio"));
    }

    #[test]
    fn test_missing_or_bogus_duration() {
        assert_eq!(parse_probe_output("{}").unwrap().duration, None);
        let info = parse_probe_output(r#"{"format": {"duration": "N/A"}}"#).unwrap();
        assert_eq!(info.duration, None);
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn test_unprobeable_file_uses_default() {
        let missing = Path::new("/definitely/not/here.mp3");
        assert_eq!(duration_or_default("ffprobe", missing), DEFAULT_SCENE_DURATION);
        assert!(matches!(
            probe("ffprobe", missing),
            Err(ReelError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("reelsmith-no-such-binary"));
    }
}
