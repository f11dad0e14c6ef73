//! Timeline → filter graph compilation.

use std::path::{Path, PathBuf};

use reelsmith_assets::{ResolvedAssets, ResolvedAudio, ResolvedVideo};
use reelsmith_common::{ReelError, ReelResult, RenderDefaults};
use reelsmith_timeline::{AudioKind, Timeline};

use crate::audio::{audio_chain, mix_filters};
use crate::graph::{format_secs, Filter, FilterGraph, InputSpec, Node, NodeKind, Pad};
use crate::text::text_filters;
use crate::video::{clip_chain, composite_order, overlay_filter, ChainContext};

/// Knobs that change the graph itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Film-grain strength; 0 disables the grain pass.
    pub grain_intensity: u32,
}

impl From<&RenderDefaults> for CompileOptions {
    fn from(render: &RenderDefaults) -> Self {
        Self {
            grain_intensity: render.grain_intensity,
        }
    }
}

/// Encoder parameters that only affect the command line.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    /// 0 leaves the rate unconstrained.
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for EncodeSettings {
    fn from(render: &RenderDefaults) -> Self {
        Self {
            video_codec: render.video_codec.clone(),
            preset: render.preset.clone(),
            crf: render.crf,
            video_bitrate_kbps: render.video_bitrate_kbps,
            audio_bitrate_kbps: render.audio_bitrate_kbps,
        }
    }
}

/// A compiled graph with its output pads.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub graph: FilterGraph,
    pub video_out: Pad,
    pub audio_out: Option<Pad>,
    /// Output duration in seconds.
    pub duration: f64,
    pub fps: u32,
}

impl CompiledGraph {
    pub fn filter_complex(&self) -> String {
        self.graph.to_filter_complex()
    }

    /// Full encoder command line writing to `output`.
    pub fn ffmpeg_args(&self, output: &Path, settings: &EncodeSettings) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];
        for input in &self.graph.inputs {
            args.extend(input.args());
        }

        args.push("-filter_complex".into());
        args.push(self.filter_complex());
        args.push("-map".into());
        args.push(self.video_out.to_string());
        if let Some(audio) = &self.audio_out {
            args.push("-map".into());
            args.push(audio.to_string());
        }

        args.extend([
            "-c:v".to_string(),
            settings.video_codec.clone(),
            "-preset".to_string(),
            settings.preset.clone(),
            "-crf".to_string(),
            settings.crf.to_string(),
        ]);
        if settings.video_bitrate_kbps > 0 {
            args.extend([
                "-maxrate".to_string(),
                format!("{}k", settings.video_bitrate_kbps),
                "-bufsize".to_string(),
                format!("{}k", settings.video_bitrate_kbps * 2),
            ]);
        }
        args.extend([
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
        ]);
        if self.audio_out.is_some() {
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", settings.audio_bitrate_kbps),
            ]);
        }
        args.extend([
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-t".to_string(),
            format_secs(self.duration),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Compile `timeline` against the assets that survived resolution.
///
/// Clips that did not resolve are simply absent from `assets`; text is
/// taken from the timeline as-is.
pub fn compile(
    timeline: &Timeline,
    assets: &ResolvedAssets,
    options: &CompileOptions,
) -> ReelResult<CompiledGraph> {
    if !timeline.duration.is_finite() || timeline.duration <= 0.0 {
        return Err(ReelError::compile(format!(
            "timeline duration must be positive, got {}",
            timeline.duration
        )));
    }
    if timeline.fps == 0 {
        return Err(ReelError::compile("frame rate must be positive"));
    }
    if assets.video.is_empty() {
        return Err(ReelError::NoRenderableContent);
    }

    let duration = timeline.duration;
    let canvas = timeline.resolution;
    let ctx = ChainContext {
        canvas,
        fps: timeline.fps,
        grain_intensity: options.grain_intensity,
    };
    let mut graph = FilterGraph::new();

    let mut composite = graph.push(Node::new(
        NodeKind::Source,
        vec![],
        vec![Filter::new("color")
            .opt("c", "black")
            .opt("s", format!("{}x{}", canvas.width, canvas.height))
            .opt("r", timeline.fps)
            .opt("d", format_secs(duration))],
        Pad::new("base"),
    ));

    let clips: Vec<_> = assets.video.iter().map(|v| &v.clip).collect();
    for (rank, i) in composite_order(&clips).into_iter().enumerate() {
        let ResolvedVideo { clip, path } = &assets.video[i];
        let track_index = timeline
            .tracks
            .video
            .iter()
            .position(|c| c.id == clip.id)
            .unwrap_or(i);

        let input = graph.add_input(InputSpec::Still {
            path: path.clone(),
            fps: timeline.fps,
            duration: clip.duration,
        });
        let chain = graph.push(Node::new(
            NodeKind::ClipChain,
            vec![Pad::input_video(input)],
            clip_chain(clip, track_index, &ctx),
            Pad::new(format!("v{rank}")),
        ));
        composite = graph.push(Node::new(
            NodeKind::Overlay,
            vec![composite, chain],
            vec![overlay_filter(clip)],
            Pad::new(format!("c{rank}")),
        ));
    }

    let mut text: Vec<Filter> = timeline.tracks.text.iter().flat_map(text_filters).collect();
    text.push(Filter::new("format").pos("yuv420p"));
    let video_out = graph.push(Node::new(
        NodeKind::TextDraw,
        vec![composite],
        text,
        Pad::new("vout"),
    ));

    let audio_out = compile_audio(&mut graph, &assets.audio, duration);

    tracing::debug!(
        inputs = graph.inputs.len(),
        nodes = graph.nodes.len(),
        video_clips = assets.video.len(),
        audio_clips = assets.audio.len(),
        text_clips = timeline.tracks.text.len(),
        duration,
        "Filter graph compiled"
    );

    Ok(CompiledGraph {
        graph,
        video_out,
        audio_out,
        duration,
        fps: timeline.fps,
    })
}

fn compile_audio(graph: &mut FilterGraph, audio: &[ResolvedAudio], duration: f64) -> Option<Pad> {
    let narration: Vec<(f64, f64)> = audio
        .iter()
        .filter(|a| a.clip.kind == AudioKind::Narration)
        .map(|a| (a.clip.start, a.clip.end()))
        .collect();

    let streams: Vec<Pad> = audio
        .iter()
        .enumerate()
        .map(|(k, ResolvedAudio { clip, path })| {
            let input = graph.add_input(InputSpec::Audio { path: path.clone() });
            graph.push(Node::new(
                NodeKind::AudioChain,
                vec![Pad::input_audio(input)],
                audio_chain(clip, &narration, duration),
                Pad::new(format!("a{k}")),
            ))
        })
        .collect();

    let filters = mix_filters(streams.len())?;
    Some(graph.push(Node::new(
        NodeKind::AudioMix,
        streams,
        filters,
        Pad::new("aout"),
    )))
}

/// Dry-run compile: every clip source is treated as an already-local path.
pub fn plan(timeline: &Timeline, options: &CompileOptions) -> ReelResult<CompiledGraph> {
    let assets = ResolvedAssets {
        video: timeline
            .tracks
            .video
            .iter()
            .map(|clip| ResolvedVideo {
                clip: clip.clone(),
                path: PathBuf::from(&clip.source),
            })
            .collect(),
        audio: timeline
            .tracks
            .audio
            .iter()
            .map(|clip| ResolvedAudio {
                clip: clip.clone(),
                path: PathBuf::from(&clip.source),
            })
            .collect(),
        failures: vec![],
    };
    compile(timeline, &assets, options)
}
