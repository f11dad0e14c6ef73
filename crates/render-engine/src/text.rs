//! Text overlay rendering: fonts, sizing, and animation strategies.

use reelsmith_timeline::{TextAnimation, TextClip, TextType};

use crate::expr::Expr;
use crate::graph::Filter;

/// Typewriter text longer than this falls back to a pulsing parametric draw.
pub const TYPEWRITER_MAX_CHARS: usize = 60;

/// Longest time a single character takes to appear (seconds).
const TYPEWRITER_STEP: f64 = 0.05;

/// Share of the clip the character reveal may take at most.
const TYPEWRITER_REVEAL_SHARE: f64 = 0.6;

pub const SERIF_FONT: &str = "DejaVu Serif";
pub const SANS_FONT: &str = "DejaVu Sans";
pub const BOLD_SANS_FONT: &str = "DejaVu Sans:style=Bold";

/// How a text clip is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStrategy {
    /// One draw per character prefix, each in its own time window.
    Typewriter,
    /// One draw with time-valued opacity, size, or position.
    Parametric,
    /// One draw with constant styling.
    Static,
}

/// Time-valued styling for a parametric draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCurves {
    pub alpha: Expr,
    pub size: Expr,
    pub y: Expr,
}

pub fn strategy_for(clip: &TextClip) -> TextStrategy {
    match clip.animation {
        TextAnimation::None => TextStrategy::Static,
        TextAnimation::Typewriter if fits_typewriter(&clip.text) => TextStrategy::Typewriter,
        _ => TextStrategy::Parametric,
    }
}

fn fits_typewriter(text: &str) -> bool {
    let count = text.chars().count();
    count > 0 && count <= TYPEWRITER_MAX_CHARS
}

/// Font for a clip; only generic overlays may name their own family.
pub fn font_for(clip: &TextClip) -> String {
    if clip.text_type == TextType::Overlay {
        if let Some(family) = clip.font_family.as_deref().filter(|f| !f.trim().is_empty()) {
            return family.trim().to_string();
        }
    }
    match clip.text_type {
        TextType::ChapterTitle
        | TextType::DateLabel
        | TextType::EraSplash
        | TextType::QuoteCard
        | TextType::Title => SERIF_FONT,
        TextType::CharacterLowerThird => BOLD_SANS_FONT,
        TextType::LocationLabel | TextType::Caption | TextType::Overlay => SANS_FONT,
    }
    .to_string()
}

/// Smallest plausible size per text type; smaller requests are raised.
pub fn min_font_size(text_type: TextType) -> u32 {
    match text_type {
        TextType::EraSplash => 72,
        TextType::ChapterTitle | TextType::Title => 48,
        TextType::QuoteCard => 36,
        TextType::Caption | TextType::CharacterLowerThird => 28,
        TextType::DateLabel | TextType::LocationLabel => 24,
        TextType::Overlay => 8,
    }
}

pub fn effective_font_size(clip: &TextClip) -> u32 {
    clip.font_size.max(min_font_size(clip.text_type))
}

/// Position expression; `center` centres the text on that axis.
pub fn position_expr(value: &str, horizontal: bool) -> Expr {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("center") || value.eq_ignore_ascii_case("centered") {
        return if horizontal {
            Expr::raw("(w-text_w)/2")
        } else {
            Expr::raw("(h-text_h)/2")
        };
    }
    // quotes would break out of the quoted option value
    Expr::raw(value.replace('\'', ""))
}

fn fade_in(clip: &TextClip, len: f64) -> Expr {
    if len <= 0.0 {
        return Expr::c(1.0);
    }
    ((Expr::t() - clip.start) / len).clamp(0.0, 1.0)
}

fn fade_out(clip: &TextClip, len: f64) -> Expr {
    if len <= 0.0 {
        return Expr::c(1.0);
    }
    ((Expr::c(clip.end) - Expr::t()) / len).clamp(0.0, 1.0)
}

/// Opacity, size, and y curves for a parametric draw.
pub fn parametric_curves(clip: &TextClip) -> TextCurves {
    let duration = clip.duration().max(0.0);
    let len = clip.animation_duration.clamp(0.0, duration / 2.0);
    let size = f64::from(effective_font_size(clip));
    let base_y = position_expr(&clip.y, false);

    let entrance = fade_in(clip, len);
    let mut curves = TextCurves {
        alpha: Expr::c(1.0),
        size: Expr::c(size),
        y: base_y.clone(),
    };

    match clip.animation {
        TextAnimation::None => {}
        TextAnimation::FadeIn => curves.alpha = entrance,
        TextAnimation::FadeOut => curves.alpha = fade_out(clip, len),
        TextAnimation::FadeInOut => curves.alpha = entrance.min(fade_out(clip, len)),
        TextAnimation::ScaleIn => {
            curves.size = (entrance.clone() * 0.5 + 0.5) * size;
            curves.alpha = entrance;
        }
        TextAnimation::ScaleBounce => {
            let overshoot = (entrance.clone() * std::f64::consts::PI).sin() * 0.15;
            curves.size = (entrance.clone() * 0.4 + 0.6 + overshoot) * size;
            curves.alpha = entrance;
        }
        TextAnimation::SlideUp => {
            let travel = size * 0.8;
            curves.y = base_y + (Expr::c(1.0) - entrance.clone()) * travel;
            curves.alpha = entrance;
        }
        TextAnimation::Typewriter => {
            let pulse = ((Expr::t() - clip.start) * 6.0).sin() * 0.15 + 0.85;
            curves.alpha = entrance.min(fade_out(clip, len)) * pulse;
        }
    }
    curves
}

fn drawtext(
    clip: &TextClip,
    text: &str,
    alpha: Expr,
    size: Expr,
    y: Expr,
    start: f64,
    end: f64,
) -> Filter {
    let mut filter = Filter::new("drawtext")
        .literal("font", &font_for(clip))
        .text("text", text);

    filter = match size {
        Expr::Const(v) => filter.opt("fontsize", v.round() as u32),
        other => filter.expr("fontsize", other),
    };
    filter = filter
        .opt("fontcolor", &clip.color)
        .expr("x", position_expr(&clip.x, true))
        .expr("y", y);
    if alpha != Expr::c(1.0) {
        filter = filter.expr("alpha", alpha);
    }
    if clip.background {
        filter = filter
            .opt("box", 1)
            .opt(
                "boxcolor",
                format!("{}@{}", clip.background_color, clip.background_opacity),
            )
            .opt("boxborderw", clip.box_padding);
    }
    if clip.shadow {
        filter = filter
            .opt("shadowcolor", &clip.shadow_color)
            .opt("shadowx", clip.shadow_offset)
            .opt("shadowy", clip.shadow_offset);
    }
    filter.expr("enable", Expr::window(start, end))
}

/// Draw filters for one text clip, in the order they must be applied.
pub fn text_filters(clip: &TextClip) -> Vec<Filter> {
    match strategy_for(clip) {
        TextStrategy::Typewriter => typewriter_filters(clip),
        TextStrategy::Parametric => {
            let curves = parametric_curves(clip);
            vec![drawtext(
                clip,
                &clip.text,
                curves.alpha,
                curves.size,
                curves.y,
                clip.start,
                clip.end,
            )]
        }
        TextStrategy::Static => vec![drawtext(
            clip,
            &clip.text,
            Expr::c(1.0),
            Expr::c(f64::from(effective_font_size(clip))),
            position_expr(&clip.y, false),
            clip.start,
            clip.end,
        )],
    }
}

/// Time windows for each character prefix; the last runs to the clip end.
pub fn typewriter_windows(clip: &TextClip) -> Vec<(String, f64, f64)> {
    let chars: Vec<char> = clip.text.chars().collect();
    let n = chars.len();
    if n == 0 {
        return vec![];
    }
    let step = TYPEWRITER_STEP.min(clip.duration() * TYPEWRITER_REVEAL_SHARE / n as f64);

    (1..=n)
        .map(|k| {
            let prefix: String = chars[..k].iter().collect();
            let start = clip.start + step * (k - 1) as f64;
            let end = if k == n {
                clip.end
            } else {
                clip.start + step * k as f64
            };
            (prefix, start, end)
        })
        .collect()
}

fn typewriter_filters(clip: &TextClip) -> Vec<Filter> {
    let size = Expr::c(f64::from(effective_font_size(clip)));
    let y = position_expr(&clip.y, false);
    let windows = typewriter_windows(clip);
    let last = windows.len().saturating_sub(1);

    windows
        .into_iter()
        .enumerate()
        .map(|(i, (prefix, start, end))| {
            let alpha = if i == last {
                let len = clip.animation_duration.clamp(0.0, (end - start) / 2.0);
                fade_out(clip, len)
            } else {
                Expr::c(1.0)
            };
            drawtext(clip, &prefix, alpha, size.clone(), y.clone(), start, end)
        })
        .collect()
}
