//! The Auto-Edit composer: narrative chapters in, validated timeline out.
//!
//! Composition is a pure function of the request. Every editorial decision
//! (motion, layout, transition, grade) depends only on the scene's global
//! index, its chapter, its text, and the config, so identical requests give
//! identical timelines.
//!
//! # Algorithm
//!
//! 1. **Walk** scenes in order, placing each at the running time.
//! 2. **Grade** the whole piece from the title unless one is given.
//! 3. **Splash** a detected year or era over the opening seconds.
//! 4. **Chapter titles** at the start of every chapter.
//! 5. **Per scene**: motion cycle, layout, transitions, fades, narration,
//!    labels, captions, quote cards.
//! 6. **Music** bed under everything, ducked under narration.

use reelsmith_timeline::{
    AudioClip, AudioKind, ColorGrade, Layout, MotionEffect, TextAnimation, TextClip, TextType,
    Timeline, TimelineError, Transition, VideoClip,
};

use crate::captions::{caption_groups, first_sentence, pull_quote};
use crate::era::{detect_era, find_year};
use crate::grade::infer_color_grade;
use crate::request::{AutoEditRequest, Chapter, ComposeConfig, Scene};

/// Motion effects applied to scenes in rotation.
pub const EFFECT_CYCLE: [MotionEffect; 5] = [
    MotionEffect::ZoomIn,
    MotionEffect::PanRight,
    MotionEffect::ZoomOut,
    MotionEffect::PanLeft,
    MotionEffect::KenBurns,
];

/// Reference frame height that the style's font sizes are tuned for.
const REFERENCE_HEIGHT: f64 = 1080.0;

/// Editorial constants for composed timelines.
#[derive(Debug, Clone)]
pub struct EditorialStyle {
    /// Longest the opening splash stays up (seconds).
    pub splash_duration: f64,

    /// Longest a chapter title stays up (seconds).
    pub chapter_title_duration: f64,

    /// Words per caption clip.
    pub caption_words: usize,

    pub transition_duration: f64,

    pub first_fade_in: f64,
    pub last_fade_out: f64,
    pub scene_fade: f64,

    /// Narration must be longer than this for a quote card.
    pub quote_min_narration: usize,
    pub quote_min_sentence: usize,
    pub quote_max_chars: usize,
    pub quote_cut_chars: usize,

    /// Narration sentences shorter than this can caption a letterbox.
    pub letterbox_sentence_limit: usize,

    /// Gap between a quote card and the scene edges (seconds).
    pub quote_inset: f64,

    pub music_fade_in: f64,
    pub music_fade_out: f64,

    pub splash_font_size: u32,
    pub chapter_font_size: u32,
    pub label_font_size: u32,
    pub caption_font_size: u32,
    pub quote_font_size: u32,
}

impl Default for EditorialStyle {
    fn default() -> Self {
        Self {
            splash_duration: 4.0,
            chapter_title_duration: 3.5,
            caption_words: 10,
            transition_duration: 0.5,
            first_fade_in: 1.0,
            last_fade_out: 1.5,
            scene_fade: 0.5,
            quote_min_narration: 50,
            quote_min_sentence: 10,
            quote_max_chars: 70,
            quote_cut_chars: 65,
            letterbox_sentence_limit: 50,
            quote_inset: 0.5,
            music_fade_in: 2.0,
            music_fade_out: 3.0,
            splash_font_size: 120,
            chapter_font_size: 72,
            label_font_size: 36,
            caption_font_size: 42,
            quote_font_size: 54,
        }
    }
}

/// Errors that can occur while composing a timeline.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Chapter {chapter} scene {scene}: {message}")]
    InvalidScene {
        chapter: usize,
        scene: usize,
        message: String,
    },

    #[error(transparent)]
    InvalidTimeline(#[from] TimelineError),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The auto-edit composer.
pub struct AutoEditComposer {
    style: EditorialStyle,
}

/// Where a scene sits in the piece.
struct ScenePosition<'a> {
    /// Global index across all chapters.
    index: usize,
    chapter_index: usize,
    scene_index: usize,
    chapter: &'a Chapter,
    start: f64,
    is_last: bool,
}

impl AutoEditComposer {
    pub fn new(style: EditorialStyle) -> Self {
        Self { style }
    }

    /// Create a composer with the default editorial style.
    pub fn with_defaults() -> Self {
        Self::new(EditorialStyle::default())
    }

    pub fn style(&self) -> &EditorialStyle {
        &self.style
    }

    /// Compose a validated timeline from a request.
    pub fn compose(&self, request: &AutoEditRequest) -> Result<Timeline, ComposeError> {
        validate_scenes(request)?;

        let config = &request.config;
        let total: f64 = request
            .chapters
            .iter()
            .flat_map(|c| c.scenes.iter())
            .map(|s| s.duration)
            .sum();
        let scene_count: usize = request.chapters.iter().map(|c| c.scenes.len()).sum();
        let last_index = scene_count.checked_sub(1);

        let mut timeline = Timeline::new(config.resolution, config.fps, total);

        let grade = config.color_grade.unwrap_or_else(|| {
            infer_color_grade(&config.title, config.style.as_deref(), config.historical_bias)
        });

        let era = if scene_count > 0 {
            detect_era(&config.title)
        } else {
            None
        };
        if let Some(label) = &era {
            timeline.tracks.text.push(self.splash(label, total, config));
        }

        let mut current_time = 0.0;
        let mut index = 0;
        for (chapter_index, chapter) in request.chapters.iter().enumerate() {
            let chapter_start = current_time;
            let chapter_duration: f64 = chapter.scenes.iter().map(|s| s.duration).sum();

            if config.add_chapter_titles && chapter_duration > 0.0 {
                timeline.tracks.text.push(self.chapter_title(
                    chapter_index,
                    chapter,
                    chapter_start,
                    chapter_duration,
                    config,
                ));
            }

            for (scene_index, scene) in chapter.scenes.iter().enumerate() {
                let position = ScenePosition {
                    index,
                    chapter_index,
                    scene_index,
                    chapter,
                    start: current_time,
                    is_last: Some(index) == last_index,
                };
                self.place_scene(&mut timeline, scene, &position, grade, era.is_some(), config);

                current_time += scene.duration;
                index += 1;
            }
        }

        if let Some(music) = config.background_music.as_deref().filter(|m| !m.trim().is_empty()) {
            if total > 0.0 {
                let mut clip = AudioClip::new("music", music, AudioKind::Music, 0.0, total);
                clip.volume = config.music_volume;
                clip.ducking = true;
                clip.fade_in = self.style.music_fade_in.min(total);
                clip.fade_out = self.style.music_fade_out.min(total);
                timeline.tracks.audio.push(clip);
            }
        }

        timeline.validate()?;
        tracing::debug!(
            scenes = scene_count,
            duration = total,
            text_clips = timeline.tracks.text.len(),
            grade = ?grade,
            "Composed timeline"
        );
        Ok(timeline)
    }

    fn place_scene(
        &self,
        timeline: &mut Timeline,
        scene: &Scene,
        position: &ScenePosition<'_>,
        grade: ColorGrade,
        has_era: bool,
        config: &ComposeConfig,
    ) {
        let i = position.index;
        let start = position.start;
        let duration = scene.duration;
        let end = start + duration;
        let metadata = scene.metadata.clone().unwrap_or_default();

        let layout = self.layout_for(scene, position, has_era);

        let mut video = VideoClip::new(format!("video-{i}"), scene.image_url.clone(), start, duration);
        video.motion_effect = EFFECT_CYCLE[i % EFFECT_CYCLE.len()];
        video.color_grade = grade;
        video.layout = layout;
        video.transition_in = transition_for(i);
        video.transition_out = if position.is_last {
            Transition::Fade
        } else {
            transition_for(i + 1)
        };
        video.transition_duration = self.style.transition_duration;

        let fade_in = if i == 0 {
            self.style.first_fade_in
        } else {
            self.style.scene_fade
        };
        let fade_out = if position.is_last {
            self.style.last_fade_out
        } else {
            self.style.scene_fade
        };
        video.fade_in = fade_in.min(duration / 2.0);
        video.fade_out = fade_out.min(duration / 2.0);

        if layout == Layout::Letterbox {
            video.letterbox_caption = Some(self.letterbox_caption(scene, position.chapter, config));
        }
        timeline.tracks.video.push(video);

        if let Some(audio) = scene.audio_url.as_deref().filter(|a| !a.trim().is_empty()) {
            timeline.tracks.audio.push(AudioClip::new(
                format!("narration-{i}"),
                audio,
                AudioKind::Narration,
                start,
                duration,
            ));
        }

        if config.add_date_labels {
            let date = metadata.date();
            if let Some(date) = date {
                let mut label = self.label(format!("date-{i}"), date, TextType::DateLabel, start, end, config);
                label.x = "w*0.05".to_string();
                timeline.tracks.text.push(label);
            }
            if let Some(location) = metadata.location() {
                let mut label =
                    self.label(format!("location-{i}"), location, TextType::LocationLabel, start, end, config);
                label.x = if date.is_some() { "w*0.30" } else { "w*0.05" }.to_string();
                timeline.tracks.text.push(label);
            }
        }

        if layout == Layout::QuoteCard {
            if let Some(quote) = scene.narration().and_then(|n| {
                pull_quote(
                    n,
                    self.style.quote_min_sentence,
                    self.style.quote_max_chars,
                    self.style.quote_cut_chars,
                )
            }) {
                timeline.tracks.text.push(self.quote_card(i, quote, start, duration, config));
            }
        }

        if config.add_captions {
            if let Some(narration) = scene.narration() {
                let groups = caption_groups(narration, self.style.caption_words);
                let count = groups.len();
                let slot = duration / count.max(1) as f64;
                for (g, group) in groups.into_iter().enumerate() {
                    let caption_start = start + slot * g as f64;
                    // last caption absorbs rounding so it ends with the scene
                    let caption_end = if g + 1 == count {
                        end
                    } else {
                        (caption_start + slot).min(end)
                    };
                    let mut clip = TextClip::new(
                        format!("caption-{i}-{g}"),
                        group,
                        TextType::Caption,
                        caption_start,
                        caption_end,
                    );
                    clip.font_size = scaled(self.style.caption_font_size, config);
                    clip.y = "h-text_h-60".to_string();
                    clip.background = true;
                    clip.animation = TextAnimation::FadeIn;
                    clip.animation_duration = 0.3_f64.min(slot / 2.0);
                    timeline.tracks.text.push(clip);
                }
            }
        }
    }

    fn layout_for(&self, scene: &Scene, position: &ScenePosition<'_>, has_era: bool) -> Layout {
        let i = position.index;
        let narration_len = scene.narration().map(|n| n.chars().count()).unwrap_or(0);

        if position.chapter_index == 0 && position.scene_index == 0 && has_era {
            Layout::EraSplash
        } else if (i + 1) % 3 == 0 {
            Layout::Letterbox
        } else if i % 4 == 2 && narration_len > self.style.quote_min_narration {
            Layout::QuoteCard
        } else {
            Layout::Standard
        }
    }

    /// First non-empty caption in the letterbox fallback chain.
    fn letterbox_caption(&self, scene: &Scene, chapter: &Chapter, config: &ComposeConfig) -> String {
        let metadata = scene.metadata.clone().unwrap_or_default();
        if let Some(caption) = metadata.caption() {
            return caption.to_string();
        }
        if let (Some(location), Some(date)) = (metadata.location(), metadata.date()) {
            return format!("{location}, {date}");
        }
        if let Some(sentence) = scene.narration().and_then(first_sentence) {
            if sentence.chars().count() < self.style.letterbox_sentence_limit {
                return sentence.to_string();
            }
        }
        if let Some(short) = short_title(&chapter.title, &config.title) {
            return short;
        }
        let title = chapter.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        "Documentary".to_string()
    }

    fn splash(&self, label: &str, total: f64, config: &ComposeConfig) -> TextClip {
        let mut clip = TextClip::new(
            "era-splash",
            label,
            TextType::EraSplash,
            0.0,
            self.style.splash_duration.min(total),
        );
        clip.font_size = scaled(self.style.splash_font_size, config);
        clip.shadow = true;
        clip.shadow_offset = 4;
        clip.animation = TextAnimation::ScaleIn;
        clip.animation_duration = 0.8;
        clip
    }

    fn chapter_title(
        &self,
        chapter_index: usize,
        chapter: &Chapter,
        start: f64,
        chapter_duration: f64,
        config: &ComposeConfig,
    ) -> TextClip {
        let mut clip = TextClip::new(
            format!("chapter-title-{chapter_index}"),
            chapter.title.trim().to_uppercase(),
            TextType::ChapterTitle,
            start,
            start + self.style.chapter_title_duration.min(chapter_duration),
        );
        clip.font_size = scaled(self.style.chapter_font_size, config);
        clip.shadow = true;
        clip.animation = TextAnimation::FadeInOut;
        clip.animation_duration = 0.8_f64.min(clip.duration() / 2.0);
        clip
    }

    fn label(
        &self,
        id: String,
        text: &str,
        text_type: TextType,
        start: f64,
        end: f64,
        config: &ComposeConfig,
    ) -> TextClip {
        let mut clip = TextClip::new(id, text, text_type, start, end);
        clip.font_size = scaled(self.style.label_font_size, config);
        clip.y = "h-text_h-h*0.08".to_string();
        clip.background = true;
        clip.animation = TextAnimation::FadeIn;
        clip.animation_duration = 0.5_f64.min((end - start) / 2.0);
        clip
    }

    fn quote_card(&self, i: usize, quote: String, start: f64, duration: f64, config: &ComposeConfig) -> TextClip {
        let inset = if duration > self.style.quote_inset * 3.0 {
            self.style.quote_inset
        } else {
            0.0
        };
        let mut clip = TextClip::new(
            format!("quote-{i}"),
            quote,
            TextType::QuoteCard,
            start + inset,
            start + duration - inset,
        );
        clip.font_size = scaled(self.style.quote_font_size, config);
        clip.x = "w*0.08".to_string();
        clip.y = "h*0.12".to_string();
        clip.background = true;
        clip.background_opacity = 0.6;
        clip.box_padding = 24;
        clip.animation = TextAnimation::FadeInOut;
        clip.animation_duration = 0.6_f64.min(clip.duration() / 2.0);
        clip
    }
}

/// Parse a JSON request and compose it with the default style.
pub fn compose_from_json(json: &str) -> Result<Timeline, ComposeError> {
    let request: AutoEditRequest = serde_json::from_str(json)?;
    AutoEditComposer::with_defaults().compose(&request)
}

/// Editorial transition into the scene at global index `i`.
pub fn transition_for(i: usize) -> Transition {
    if i == 0 {
        Transition::Fade
    } else if i % 5 == 0 {
        Transition::WipeLeft
    } else if i % 3 == 0 {
        Transition::Dissolve
    } else {
        Transition::Fade
    }
}

/// Chapter title before any `:` subtitle, suffixed with a year when known.
fn short_title(chapter_title: &str, project_title: &str) -> Option<String> {
    let short = chapter_title.split(':').next().unwrap_or("").trim();
    if short.is_empty() {
        return None;
    }
    match find_year(chapter_title).or_else(|| find_year(project_title)) {
        Some(year) if !short.contains(&year.to_string()) => Some(format!("{short}, {year}")),
        _ => Some(short.to_string()),
    }
}

fn scaled(size: u32, config: &ComposeConfig) -> u32 {
    let factor = f64::from(config.resolution.height) / REFERENCE_HEIGHT;
    ((f64::from(size) * factor).round() as u32).max(1)
}

fn validate_scenes(request: &AutoEditRequest) -> Result<(), ComposeError> {
    for (chapter, c) in request.chapters.iter().enumerate() {
        for (scene, s) in c.scenes.iter().enumerate() {
            let invalid = |message: String| ComposeError::InvalidScene {
                chapter,
                scene,
                message,
            };
            if !s.duration.is_finite() || s.duration <= 0.0 {
                return Err(invalid(format!("duration {} must be > 0", s.duration)));
            }
            if s.image_url.trim().is_empty() {
                return Err(invalid("image reference is empty".to_string()));
            }
        }
    }
    Ok(())
}
