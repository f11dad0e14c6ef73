//! Clip types for the three timeline tracks.

use serde::{Deserialize, Serialize};

/// Time-parameterized camera motion applied to a still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionEffect {
    #[default]
    None,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    #[serde(rename = "kenburns")]
    KenBurns,
}

/// Fixed color transform applied per clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorGrade {
    #[default]
    None,
    Grayscale,
    Sepia,
    Vintage,
    Warm,
    Cool,
}

/// Compositing layout for a video clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Standard,
    /// Opaque bars top and bottom, optional caption in the bottom bar.
    Letterbox,
    /// Darkened backdrop for the opening date reveal.
    EraSplash,
    /// Backdrop for a boxed pull-quote overlay.
    QuoteCard,
}

/// Editorial transition hint between adjacent clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    None,
    Fade,
    Dissolve,
    WipeLeft,
    WipeRight,
}

/// A still image placed on the video track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoClip {
    pub id: String,

    /// Local path, http(s) URL, or object-storage key.
    pub source: String,

    /// Start time on the timeline (seconds).
    pub start: f64,

    /// Length on the timeline (seconds).
    pub duration: f64,

    #[serde(default)]
    pub motion_effect: MotionEffect,

    #[serde(default)]
    pub fade_in: f64,

    #[serde(default)]
    pub fade_out: f64,

    #[serde(default)]
    pub blur: bool,

    #[serde(default)]
    pub color_grade: ColorGrade,

    #[serde(default)]
    pub layout: Layout,

    /// Caption drawn inside the bottom bar of a letterbox layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letterbox_caption: Option<String>,

    #[serde(default)]
    pub transition_in: Transition,

    #[serde(default)]
    pub transition_out: Transition,

    #[serde(default)]
    pub transition_duration: f64,
}

/// Role of an audio clip in the mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    #[default]
    Narration,
    Music,
    Sfx,
}

/// An audio file placed on the audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioClip {
    pub id: String,
    pub source: String,
    pub start: f64,
    pub duration: f64,

    /// Linear gain in `[0.0, 2.0]`.
    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default)]
    pub fade_in: f64,

    #[serde(default)]
    pub fade_out: f64,

    /// Lower this clip while narration plays (music only).
    #[serde(default)]
    pub ducking: bool,

    #[serde(rename = "type", default)]
    pub kind: AudioKind,
}

fn default_volume() -> f64 {
    1.0
}

/// Editorial role of a text overlay; drives font and sizing choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    ChapterTitle,
    DateLabel,
    LocationLabel,
    Caption,
    EraSplash,
    QuoteCard,
    CharacterLowerThird,
    Title,
    #[default]
    Overlay,
}

/// Entrance/exit animation for a text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAnimation {
    #[default]
    None,
    FadeIn,
    FadeOut,
    FadeInOut,
    ScaleIn,
    ScaleBounce,
    SlideUp,
    Typewriter,
}

/// A text overlay on the text track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextClip {
    pub id: String,
    pub text: String,
    pub start: f64,
    pub end: f64,

    /// Only honoured for generic overlays; other text types pick their font.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    #[serde(default = "default_text_color")]
    pub color: String,

    /// Horizontal position expression; `center` is symbolic.
    #[serde(default = "default_position")]
    pub x: String,

    /// Vertical position expression; `center` is symbolic.
    #[serde(default = "default_position")]
    pub y: String,

    #[serde(default)]
    pub background: bool,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_background_opacity")]
    pub background_opacity: f64,

    #[serde(default)]
    pub text_type: TextType,

    #[serde(default)]
    pub shadow: bool,

    #[serde(default = "default_shadow_color")]
    pub shadow_color: String,

    #[serde(default = "default_shadow_offset")]
    pub shadow_offset: u32,

    #[serde(default)]
    pub animation: TextAnimation,

    /// Length of the entrance/exit animation (seconds).
    #[serde(default = "default_animation_duration")]
    pub animation_duration: f64,

    #[serde(default = "default_box_padding")]
    pub box_padding: u32,
}

fn default_font_size() -> u32 {
    48
}

fn default_text_color() -> String {
    "white".to_string()
}

fn default_position() -> String {
    "center".to_string()
}

fn default_background_color() -> String {
    "black".to_string()
}

fn default_background_opacity() -> f64 {
    0.5
}

fn default_shadow_color() -> String {
    "black".to_string()
}

fn default_shadow_offset() -> u32 {
    2
}

fn default_animation_duration() -> f64 {
    0.5
}

fn default_box_padding() -> u32 {
    12
}

impl VideoClip {
    /// A still with no effects, grading, or transitions.
    pub fn new(id: impl Into<String>, source: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            start,
            duration,
            motion_effect: MotionEffect::None,
            fade_in: 0.0,
            fade_out: 0.0,
            blur: false,
            color_grade: ColorGrade::None,
            layout: Layout::Standard,
            letterbox_caption: None,
            transition_in: Transition::None,
            transition_out: Transition::None,
            transition_duration: 0.0,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

impl AudioClip {
    /// A unity-gain clip with no fades or ducking.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        kind: AudioKind,
        start: f64,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            start,
            duration,
            volume: default_volume(),
            fade_in: 0.0,
            fade_out: 0.0,
            ducking: false,
            kind,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

impl TextClip {
    /// A static, centered overlay using the default style.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        text_type: TextType,
        start: f64,
        end: f64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            start,
            end,
            font_family: None,
            font_size: default_font_size(),
            color: default_text_color(),
            x: default_position(),
            y: default_position(),
            background: false,
            background_color: default_background_color(),
            background_opacity: default_background_opacity(),
            text_type,
            shadow: false,
            shadow_color: default_shadow_color(),
            shadow_offset: default_shadow_offset(),
            animation: TextAnimation::None,
            animation_duration: default_animation_duration(),
            box_padding: default_box_padding(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&MotionEffect::KenBurns).unwrap(),
            "\"kenburns\""
        );
        assert_eq!(
            serde_json::to_string(&Transition::WipeLeft).unwrap(),
            "\"wipeleft\""
        );
        assert_eq!(
            serde_json::to_string(&TextType::CharacterLowerThird).unwrap(),
            "\"character_lower_third\""
        );
        assert_eq!(serde_json::to_string(&Layout::EraSplash).unwrap(), "\"era_splash\"");
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        let json = r#"{"id":"v","source":"/a.png","start":0,"duration":1,"motionEffect":"spin"}"#;
        assert!(serde_json::from_str::<VideoClip>(json).is_err());
    }

    #[test]
    fn test_audio_clip_defaults() {
        let json = r#"{"id":"a","source":"/a.mp3","start":0,"duration":2}"#;
        let clip: AudioClip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.volume, 1.0);
        assert_eq!(clip.kind, AudioKind::Narration);
        assert!(!clip.ducking);
    }

    #[test]
    fn test_text_clip_uses_camel_case_fields() {
        let clip = TextClip::new("t", "Hello", TextType::Caption, 0.0, 1.0);
        let value = serde_json::to_value(&clip).unwrap();
        assert!(value.get("textType").is_some());
        assert!(value.get("animationDuration").is_some());
        assert!(value.get("fontFamily").is_none());
    }
}
