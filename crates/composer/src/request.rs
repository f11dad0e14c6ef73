//! Auto-edit request types: narrative chapters plus editorial switches.

use serde::{Deserialize, Serialize};

use reelsmith_timeline::{ColorGrade, Resolution};

/// Narrative content and configuration for one composed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoEditRequest {
    pub chapters: Vec<Chapter>,

    #[serde(default)]
    pub config: ComposeConfig,
}

/// An ordered group of scenes with a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,

    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// One still image with optional narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub image_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,

    /// Length in seconds.
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SceneMetadata>,
}

/// Optional editorial facts about a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Global editorial switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComposeConfig {
    /// Project title; drives grade inference and the opening splash.
    pub title: String,

    pub add_chapter_titles: bool,

    /// Emit date and location labels from scene metadata.
    pub add_date_labels: bool,

    pub add_captions: bool,

    /// Source reference for a bed track under the whole video.
    pub background_music: Option<String>,

    pub music_volume: f64,

    /// Free-form style hint; `historical` forces grayscale.
    pub style: Option<String>,

    /// Explicit grade; skips inference when set.
    pub color_grade: Option<ColorGrade>,

    /// Fall back to grayscale instead of no grade.
    pub historical_bias: bool,

    pub resolution: Resolution,

    pub fps: u32,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            add_chapter_titles: true,
            add_date_labels: true,
            add_captions: false,
            background_music: None,
            music_volume: 0.25,
            style: None,
            color_grade: None,
            historical_bias: false,
            resolution: Resolution::FULL_HD,
            fps: 24,
        }
    }
}

impl SceneMetadata {
    pub fn date(&self) -> Option<&str> {
        non_empty(self.date.as_deref())
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(self.location.as_deref())
    }

    pub fn caption(&self) -> Option<&str> {
        non_empty(self.caption.as_deref())
    }
}

impl Scene {
    /// Narration text, if any non-whitespace text is present.
    pub fn narration(&self) -> Option<&str> {
        non_empty(self.narration.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_camel_case_json() {
        let json = r#"{
            "chapters": [{
                "title": "Origins",
                "scenes": [{
                    "imageUrl": "https://cdn.example.com/a.jpg",
                    "audioUrl": "/objects/n1.mp3",
                    "narration": "It began quietly.",
                    "duration": 6.5,
                    "metadata": {"date": "1939", "location": "Warsaw"}
                }]
            }],
            "config": {"title": "The Long War", "addCaptions": true, "musicVolume": 0.4}
        }"#;

        let request: AutoEditRequest = serde_json::from_str(json).unwrap();
        let scene = &request.chapters[0].scenes[0];
        assert_eq!(scene.duration, 6.5);
        assert_eq!(scene.metadata.as_ref().unwrap().location(), Some("Warsaw"));
        assert!(request.config.add_captions);
        assert!(request.config.add_chapter_titles);
        assert_eq!(request.config.music_volume, 0.4);
        assert_eq!(request.config.fps, 24);
    }

    #[test]
    fn test_blank_metadata_is_treated_as_missing() {
        let meta = SceneMetadata {
            date: Some("   ".to_string()),
            location: None,
            caption: Some(" Harbour ".to_string()),
        };
        assert_eq!(meta.date(), None);
        assert_eq!(meta.caption(), Some("Harbour"));
    }
}
