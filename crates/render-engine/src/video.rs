//! Per-clip video chains and the time-windowed composite.

use reelsmith_timeline::{ColorGrade, Layout, MotionEffect, Resolution, VideoClip};

use crate::expr::{Expr, Var};
use crate::graph::{format_secs, Filter};
use crate::text::SERIF_FONT;

/// Zoom reached at the end of a zoom-in, and the start of a zoom-out.
pub const MAX_ZOOM: f64 = 1.2;

/// Fixed zoom used while panning.
pub const PAN_ZOOM: f64 = 1.15;

/// Letterbox bar height as a share of the frame height.
pub const LETTERBOX_BAR: f64 = 0.12;

/// Canvas and encoder facts shared by every clip chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainContext {
    pub canvas: Resolution,
    pub fps: u32,
    /// Film-grain noise strength; 0 disables the grain pass.
    pub grain_intensity: u32,
}

/// Zoompan curves for a motion effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub zoom: Expr,
    pub x: Expr,
    pub y: Expr,
}

/// Seconds since the clip started, as seen by zoompan.
fn clip_time(fps: u32) -> Expr {
    Expr::var(Var::OutputFrame) / f64::from(fps.max(1))
}

fn centered(axis: Var) -> Expr {
    let size = Expr::var(axis);
    size.clone() / 2.0 - size / Expr::var(Var::Zoom) / 2.0
}

/// Free travel along an axis at the current zoom.
fn slack(axis: Var) -> Expr {
    let size = Expr::var(axis);
    size.clone() - size / Expr::var(Var::Zoom)
}

/// Motion curves for a clip, or `None` for a static still.
///
/// `index` is the clip's position on the track; Ken Burns alternates
/// between zooming in and out on it.
pub fn motion_for(effect: MotionEffect, duration: f64, index: usize, fps: u32) -> Option<Motion> {
    let t = clip_time(fps);
    let progress = (t.clone() / duration.max(f64::EPSILON)).min(Expr::c(1.0));
    let zoom_in = (progress.clone() * (MAX_ZOOM - 1.0) + 1.0).min(Expr::c(MAX_ZOOM));
    let zoom_out = (Expr::c(MAX_ZOOM) - progress.clone() * (MAX_ZOOM - 1.0)).max(Expr::c(1.0));

    let motion = match effect {
        MotionEffect::None => return None,
        MotionEffect::ZoomIn => Motion {
            zoom: zoom_in,
            x: centered(Var::InputWidth),
            y: centered(Var::InputHeight),
        },
        MotionEffect::ZoomOut => Motion {
            zoom: zoom_out,
            x: centered(Var::InputWidth),
            y: centered(Var::InputHeight),
        },
        MotionEffect::PanRight => Motion {
            zoom: Expr::c(PAN_ZOOM),
            x: slack(Var::InputWidth) * progress,
            y: centered(Var::InputHeight),
        },
        MotionEffect::PanLeft => Motion {
            zoom: Expr::c(PAN_ZOOM),
            x: slack(Var::InputWidth) * (Expr::c(1.0) - progress),
            y: centered(Var::InputHeight),
        },
        MotionEffect::KenBurns => {
            let wobble = (t * (2.0 * std::f64::consts::PI / duration.max(f64::EPSILON))).sin();
            Motion {
                zoom: if index % 2 == 0 { zoom_in } else { zoom_out },
                x: slack(Var::InputWidth) / 2.0 * (wobble * 0.5 + 1.0),
                y: centered(Var::InputHeight),
            }
        }
    };
    Some(motion)
}

/// Fixed color transform for a grade.
pub fn grade_filter(grade: ColorGrade) -> Option<Filter> {
    match grade {
        ColorGrade::None => None,
        ColorGrade::Grayscale => Some(Filter::new("hue").opt("s", 0)),
        ColorGrade::Sepia => Some(
            Filter::new("colorchannelmixer")
                .pos(".393:.769:.189:0:.349:.686:.168:0:.272:.534:.131"),
        ),
        ColorGrade::Vintage => Some(Filter::new("curves").opt("preset", "vintage")),
        ColorGrade::Warm => Some(
            Filter::new("colorbalance")
                .opt("rs", 0.1)
                .opt("gs", 0.02)
                .opt("bs", -0.08),
        ),
        ColorGrade::Cool => Some(
            Filter::new("colorbalance")
                .opt("rs", -0.08)
                .opt("gs", 0.0)
                .opt("bs", 0.1),
        ),
    }
}

fn layout_filters(clip: &VideoClip, canvas: Resolution) -> Vec<Filter> {
    match clip.layout {
        Layout::Standard | Layout::QuoteCard => vec![],
        Layout::EraSplash => vec![Filter::new("colorlevels")
            .opt("romax", 0.6)
            .opt("gomax", 0.6)
            .opt("bomax", 0.6)],
        Layout::Letterbox => {
            let bar = (f64::from(canvas.height) * LETTERBOX_BAR).round() as u32;
            let mut filters = vec![
                Filter::new("drawbox")
                    .opt("x", 0)
                    .opt("y", 0)
                    .opt("w", "iw")
                    .opt("h", bar)
                    .opt("color", "black")
                    .opt("t", "fill"),
                Filter::new("drawbox")
                    .opt("x", 0)
                    .opt("y", format!("ih-{bar}"))
                    .opt("w", "iw")
                    .opt("h", bar)
                    .opt("color", "black")
                    .opt("t", "fill"),
            ];
            if let Some(caption) = clip
                .letterbox_caption
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                let size = ((f64::from(bar) * 0.4).round() as u32).max(12);
                filters.push(
                    Filter::new("drawtext")
                        .literal("font", SERIF_FONT)
                        .text("text", caption)
                        .opt("fontsize", size)
                        .opt("fontcolor", "white")
                        .expr("x", Expr::raw("(w-text_w)/2"))
                        .expr("y", Expr::raw(format!("h-{bar}/2-text_h/2"))),
                );
            }
            filters
        }
    }
}

/// The full effect chain for one clip, from its looped still to a stream
/// shifted to the clip's start.
pub fn clip_chain(clip: &VideoClip, index: usize, ctx: &ChainContext) -> Vec<Filter> {
    let Resolution { width, height } = ctx.canvas;
    let mut filters = vec![
        Filter::new("scale")
            .pos(width)
            .pos(height)
            .opt("force_original_aspect_ratio", "decrease"),
        Filter::new("pad")
            .pos(width)
            .pos(height)
            .pos("(ow-iw)/2")
            .pos("(oh-ih)/2")
            .opt("color", "black"),
        Filter::new("setsar").pos(1),
    ];

    if let Some(motion) = motion_for(clip.motion_effect, clip.duration, index, ctx.fps) {
        filters.push(
            Filter::new("zoompan")
                .expr("z", motion.zoom)
                .expr("x", motion.x)
                .expr("y", motion.y)
                .opt("d", 1)
                .opt("s", format!("{width}x{height}"))
                .opt("fps", ctx.fps),
        );
    }

    filters.push(Filter::new("trim").opt("duration", format_secs(clip.duration)));
    filters.push(Filter::new("setpts").pos("PTS-STARTPTS"));

    if clip.blur {
        filters.push(Filter::new("gblur").opt("sigma", 20));
    }
    filters.extend(grade_filter(clip.color_grade));

    filters.push(Filter::new("eq").opt("contrast", 1.08).opt("saturation", 1.05));
    filters.push(Filter::new("unsharp").pos(5).pos(5).pos(0.6).pos(5).pos(5).pos(0.0));
    if ctx.grain_intensity > 0 {
        filters.push(
            Filter::new("noise")
                .opt("alls", ctx.grain_intensity)
                .opt("allf", "t"),
        );
    }
    filters.push(Filter::new("vignette").opt("angle", "PI/5"));
    filters.extend(layout_filters(clip, ctx.canvas));

    filters.push(Filter::new("format").pos("yuva420p"));
    if clip.fade_in > 0.0 {
        filters.push(
            Filter::new("fade")
                .opt("t", "in")
                .opt("st", 0)
                .opt("d", format_secs(clip.fade_in))
                .opt("alpha", 1),
        );
    }
    if clip.fade_out > 0.0 {
        filters.push(
            Filter::new("fade")
                .opt("t", "out")
                .opt("st", format_secs(clip.duration - clip.fade_out))
                .opt("d", format_secs(clip.fade_out))
                .opt("alpha", 1),
        );
    }
    filters.push(Filter::new("setpts").pos(format!(
        "PTS-STARTPTS+{}/TB",
        format_secs(clip.start)
    )));
    filters
}

/// Indices of `clips` in compositing order: ascending start, ties keep
/// track order, so later clips win where they overlap.
pub fn composite_order(clips: &[&VideoClip]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..clips.len()).collect();
    order.sort_by(|&a, &b| clips[a].start.total_cmp(&clips[b].start));
    order
}

/// Overlay enabled only while `start <= t < end`.
pub fn overlay_filter(clip: &VideoClip) -> Filter {
    Filter::new("overlay")
        .opt("x", 0)
        .opt("y", 0)
        .opt("eof_action", "pass")
        .expr("enable", Expr::window(clip.start, clip.end()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Env;

    fn zoom_at(motion: &Motion, seconds: f64, fps: f64) -> f64 {
        motion
            .zoom
            .eval(&Env {
                on: seconds * fps,
                ..Env::default()
            })
            .unwrap()
    }

    #[test]
    fn test_zoom_in_and_out_curves() {
        let zin = motion_for(MotionEffect::ZoomIn, 5.0, 0, 25).unwrap();
        assert_eq!(zoom_at(&zin, 0.0, 25.0), 1.0);
        assert!((zoom_at(&zin, 2.5, 25.0) - 1.1).abs() < 1e-9);
        assert!((zoom_at(&zin, 5.0, 25.0) - MAX_ZOOM).abs() < 1e-9);
        assert!((zoom_at(&zin, 9.0, 25.0) - MAX_ZOOM).abs() < 1e-9);

        let zout = motion_for(MotionEffect::ZoomOut, 5.0, 0, 25).unwrap();
        assert!((zoom_at(&zout, 0.0, 25.0) - MAX_ZOOM).abs() < 1e-9);
        assert!((zoom_at(&zout, 5.0, 25.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan_moves_linearly_across_slack() {
        let pan = motion_for(MotionEffect::PanRight, 4.0, 0, 25).unwrap();
        let x = |s: f64| {
            pan.x
                .eval(&Env {
                    on: s * 25.0,
                    iw: 1000.0,
                    zoom: PAN_ZOOM,
                    ..Env::default()
                })
                .unwrap()
        };
        let slack = 1000.0 - 1000.0 / PAN_ZOOM;
        assert_eq!(x(0.0), 0.0);
        assert!((x(2.0) - slack / 2.0).abs() < 1e-9);
        assert!((x(4.0) - slack).abs() < 1e-9);
        assert_eq!(pan.zoom, Expr::c(PAN_ZOOM));
    }

    #[test]
    fn test_kenburns_alternates_by_parity() {
        let even = motion_for(MotionEffect::KenBurns, 5.0, 4, 25).unwrap();
        let odd = motion_for(MotionEffect::KenBurns, 5.0, 5, 25).unwrap();
        assert_eq!(zoom_at(&even, 0.0, 25.0), 1.0);
        assert!((zoom_at(&odd, 0.0, 25.0) - MAX_ZOOM).abs() < 1e-9);
        assert!(motion_for(MotionEffect::None, 5.0, 0, 25).is_none());
    }

    #[test]
    fn test_chain_order_and_layout() {
        let ctx = ChainContext {
            canvas: Resolution::new(1280, 720),
            fps: 24,
            grain_intensity: 0,
        };
        let mut clip = VideoClip::new("v", "/a.png", 3.0, 4.0);
        clip.layout = Layout::Letterbox;
        clip.letterbox_caption = Some("Berlin, 1961".to_string());
        clip.color_grade = ColorGrade::Sepia;
        clip.fade_in = 0.5;

        let chain = clip_chain(&clip, 0, &ctx);
        let names: Vec<&str> = chain.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "scale", "pad", "setsar", "trim", "setpts", "colorchannelmixer", "eq",
                "unsharp", "vignette", "drawbox", "drawbox", "drawtext", "format", "fade",
                "setpts"
            ]
        );
    }

    #[test]
    fn test_grain_is_configurable() {
        let clip = VideoClip::new("v", "/a.png", 0.0, 2.0);
        let with = ChainContext {
            canvas: Resolution::FULL_HD,
            fps: 24,
            grain_intensity: 6,
        };
        let chain = clip_chain(&clip, 0, &with);
        assert!(chain.iter().any(|f| f.name() == "noise"));
        assert!(chain.iter().all(|f| f.name() != "zoompan"));
    }

    #[test]
    fn test_composite_order_is_stable() {
        let a = VideoClip::new("a", "/a.png", 2.0, 1.0);
        let b = VideoClip::new("b", "/b.png", 0.0, 3.0);
        let c = VideoClip::new("c", "/c.png", 2.0, 2.0);
        assert_eq!(composite_order(&[&a, &b, &c]), vec![1, 0, 2]);
    }
}
