//! The timeline: resolution, frame rate, duration, and clip tracks.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clip::{AudioClip, TextClip, VideoClip};

/// Tolerance for floating-point comparisons against the timeline duration.
pub const TIME_EPSILON: f64 = 1e-6;

/// Output frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const FULL_HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// The three clip tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tracks {
    #[serde(default)]
    pub video: Vec<VideoClip>,
    #[serde(default)]
    pub audio: Vec<AudioClip>,
    #[serde(default)]
    pub text: Vec<TextClip>,
}

/// A complete, declarative description of one output video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub resolution: Resolution,
    pub fps: u32,

    /// Total length in seconds; never shorter than any clip's end.
    pub duration: f64,

    #[serde(default)]
    pub tracks: Tracks,
}

/// One violated timeline invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Offending clip, or `None` for timeline-level problems.
    pub clip_id: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clip_id {
            Some(id) => write!(f, "clip {id}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new(resolution: Resolution, fps: u32, duration: f64) -> Self {
        Self {
            resolution,
            fps,
            duration,
            tracks: Tracks::default(),
        }
    }

    /// Parse a timeline from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, TimelineError> {
        let timeline: Timeline =
            serde_json::from_str(json).map_err(|e| TimelineError::ParseError {
                path: None,
                source: e,
            })?;
        timeline.validate()?;
        Ok(timeline)
    }

    /// Load and validate a timeline file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TimelineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TimelineError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let timeline: Timeline =
            serde_json::from_str(&json).map_err(|e| TimelineError::ParseError {
                path: Some(path.to_path_buf()),
                source: e,
            })?;
        timeline.validate()?;
        Ok(timeline)
    }

    /// Write the timeline as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TimelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TimelineError::IoError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| TimelineError::ParseError {
            path: Some(path.to_path_buf()),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| TimelineError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Latest end time of any clip on any track.
    pub fn content_end(&self) -> f64 {
        let video = self.tracks.video.iter().map(VideoClip::end);
        let audio = self.tracks.audio.iter().map(AudioClip::end);
        let text = self.tracks.text.iter().map(|c| c.end);
        video.chain(audio).chain(text).fold(0.0, f64::max)
    }

    /// Pairs of video clip ids whose time ranges overlap.
    ///
    /// Overlap is legal; later-starting clips win where they intersect.
    pub fn video_overlaps(&self) -> Vec<(String, String)> {
        let mut clips: Vec<&VideoClip> = self.tracks.video.iter().collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut overlaps = vec![];
        for (i, a) in clips.iter().enumerate() {
            for b in &clips[i + 1..] {
                if b.start >= a.end() - TIME_EPSILON {
                    break;
                }
                overlaps.push((a.id.clone(), b.id.clone()));
            }
        }
        overlaps
    }

    /// Validate all invariants, failing with every violation found.
    pub fn validate(&self) -> Result<(), TimelineError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(TimelineError::ValidationError { issues })
        }
    }

    /// Collect every violated invariant.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = vec![];
        let mut push = |clip_id: Option<&str>, message: String| {
            issues.push(ValidationIssue {
                clip_id: clip_id.map(str::to_string),
                message,
            });
        };

        if self.resolution.width == 0 || self.resolution.height == 0 {
            push(None, "resolution must be non-zero".to_string());
        }
        if self.fps == 0 {
            push(None, "fps must be positive".to_string());
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            push(None, format!("invalid duration {}", self.duration));
        }

        let mut seen = HashSet::new();
        let limit = self.duration + TIME_EPSILON;

        for clip in &self.tracks.video {
            let id = Some(clip.id.as_str());
            if !seen.insert(clip.id.as_str()) {
                push(id, "duplicate clip id".to_string());
            }
            check_span(&mut push, id, clip.start, clip.duration, limit);
            check_fades(&mut push, id, clip.fade_in, clip.fade_out, clip.duration);
            if !clip.transition_duration.is_finite() || clip.transition_duration < 0.0 {
                push(id, "transition duration must be non-negative".to_string());
            }
        }

        for clip in &self.tracks.audio {
            let id = Some(clip.id.as_str());
            if !seen.insert(clip.id.as_str()) {
                push(id, "duplicate clip id".to_string());
            }
            check_span(&mut push, id, clip.start, clip.duration, limit);
            check_fades(&mut push, id, clip.fade_in, clip.fade_out, clip.duration);
            if !(0.0..=2.0).contains(&clip.volume) {
                push(id, format!("volume {} outside [0, 2]", clip.volume));
            }
        }

        for clip in &self.tracks.text {
            let id = Some(clip.id.as_str());
            if !seen.insert(clip.id.as_str()) {
                push(id, "duplicate clip id".to_string());
            }
            if !clip.start.is_finite() || clip.start < 0.0 {
                push(id, format!("start {} must be >= 0", clip.start));
            }
            if !clip.end.is_finite() || clip.end <= clip.start {
                push(id, format!("end {} must be after start {}", clip.end, clip.start));
            } else if clip.end > limit {
                push(
                    id,
                    format!("ends at {} past timeline duration {}", clip.end, self.duration),
                );
            }
            if !(0.0..=1.0).contains(&clip.background_opacity) {
                push(
                    id,
                    format!("background opacity {} outside [0, 1]", clip.background_opacity),
                );
            }
            if !clip.animation_duration.is_finite() || clip.animation_duration < 0.0 {
                push(id, "animation duration must be non-negative".to_string());
            }
        }

        issues
    }
}

fn check_span(
    push: &mut impl FnMut(Option<&str>, String),
    id: Option<&str>,
    start: f64,
    duration: f64,
    limit: f64,
) {
    if !start.is_finite() || start < 0.0 {
        push(id, format!("start {start} must be >= 0"));
    }
    if !duration.is_finite() || duration <= 0.0 {
        push(id, format!("duration {duration} must be > 0"));
    } else if start + duration > limit {
        push(
            id,
            format!("ends at {} past timeline duration", start + duration),
        );
    }
}

fn check_fades(
    push: &mut impl FnMut(Option<&str>, String),
    id: Option<&str>,
    fade_in: f64,
    fade_out: f64,
    duration: f64,
) {
    for (label, fade) in [("fade in", fade_in), ("fade out", fade_out)] {
        if !fade.is_finite() || fade < 0.0 {
            push(id, format!("{label} {fade} must be >= 0"));
        } else if fade > duration + TIME_EPSILON {
            push(id, format!("{label} {fade} longer than clip duration {duration}"));
        }
    }
}

/// Errors that can occur when loading or validating timelines.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {source}")]
    ParseError {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },

    #[error("Invalid timeline: {}", join_issues(.issues))]
    ValidationError { issues: Vec<ValidationIssue> },
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AudioKind, TextType};

    fn sample() -> Timeline {
        let mut timeline = Timeline::new(Resolution::FULL_HD, 24, 10.0);
        timeline
            .tracks
            .video
            .push(VideoClip::new("v0", "/img/a.png", 0.0, 5.0));
        timeline
            .tracks
            .video
            .push(VideoClip::new("v1", "/img/b.png", 5.0, 5.0));
        timeline.tracks.audio.push(AudioClip::new(
            "a0",
            "/audio/n.mp3",
            AudioKind::Narration,
            0.0,
            5.0,
        ));
        timeline
            .tracks
            .text
            .push(TextClip::new("t0", "Hello", TextType::Caption, 1.0, 3.0));
        timeline
    }

    #[test]
    fn test_valid_timeline_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_clip_past_duration_is_rejected() {
        let mut timeline = sample();
        timeline.tracks.video[1].duration = 6.0;
        let issues = timeline.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].clip_id.as_deref(), Some("v1"));
    }

    #[test]
    fn test_negative_start_and_zero_duration_are_rejected() {
        let mut timeline = sample();
        timeline.tracks.video[0].start = -1.0;
        timeline.tracks.audio[0].duration = 0.0;
        let issues = timeline.issues();
        assert!(issues.iter().any(|i| i.clip_id.as_deref() == Some("v0")));
        assert!(issues.iter().any(|i| i.clip_id.as_deref() == Some("a0")));
    }

    #[test]
    fn test_fade_longer_than_clip_is_rejected() {
        let mut timeline = sample();
        timeline.tracks.video[0].fade_out = 5.5;
        assert!(timeline.validate().is_err());
    }

    #[test]
    fn test_volume_and_text_bounds() {
        let mut timeline = sample();
        timeline.tracks.audio[0].volume = 2.5;
        timeline.tracks.text[0].end = 1.0;
        let issues = timeline.issues();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut timeline = sample();
        timeline.tracks.text[0].id = "v0".to_string();
        let err = timeline.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_overlaps_are_reported_in_start_order() {
        let mut timeline = sample();
        timeline.tracks.video[1].start = 4.0;
        timeline.tracks.video[1].duration = 6.0;
        assert_eq!(
            timeline.video_overlaps(),
            vec![("v0".to_string(), "v1".to_string())]
        );
        assert!(timeline.validate().is_ok());
    }

    #[test]
    fn test_content_end() {
        assert_eq!(sample().content_end(), 10.0);
    }

    #[test]
    fn test_from_json_rejects_unknown_grade() {
        let json = r#"{
            "resolution": {"width": 1280, "height": 720},
            "fps": 30,
            "duration": 2,
            "tracks": {"video": [{"id": "v", "source": "/a.png", "start": 0, "duration": 2, "colorGrade": "neon"}]}
        }"#;
        assert!(matches!(
            Timeline::from_json_str(json),
            Err(TimelineError::ParseError { .. })
        ));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timeline.json");
        let timeline = sample();
        timeline.save(&path).unwrap();
        assert_eq!(Timeline::load(&path).unwrap(), timeline);
    }
}
