//! Reelsmith Render Engine
//!
//! Compiles a [`Timeline`](reelsmith_timeline::Timeline) into an ffmpeg
//! filter graph and drives the encoder to produce the final video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! stills ──► scale/pad ► zoompan ► grade ► grain ► layout ► fades ──┐
//!                                                                   ├── overlay (by start) ──┐
//! canvas (color source) ────────────────────────────────────────────┘                        │
//!                                                                         text (drawtext) ◄──┘
//!                                                                                │
//! audio ──► atrim ► adelay ► apad ► volume (ducking) ► afade ──► amix ► loudnorm │
//!                                                                      │         │
//!                                                                      ▼         ▼
//!                                                                   Encode (H.264 + AAC)
//! ```
//!
//! Graph building is pure: [`compile`] turns a timeline plus resolved
//! assets into a typed [`FilterGraph`], which is only serialized to
//! `-filter_complex` syntax at the command-line boundary.
//! [`RenderExecutor`] runs whole jobs on top of it.

pub mod audio;
pub mod compile;
pub mod encoder;
pub mod executor;
pub mod expr;
pub mod graph;
pub mod probe;
pub mod progress;
pub mod text;
pub mod video;

pub use compile::{compile, plan, CompileOptions, CompiledGraph, EncodeSettings};
pub use encoder::{EncoderBackend, FfmpegBackend};
pub use executor::{validate_output_name, RenderExecutor};
pub use expr::{Env, Expr, Var};
pub use graph::{Filter, FilterGraph, InputSpec, Node, NodeKind, Pad};
pub use probe::{command_exists, media_duration, MediaInfo, DEFAULT_SCENE_DURATION};
pub use progress::{ProgressCallback, ProgressReporter};
