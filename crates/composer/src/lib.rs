//! Scene-to-timeline auto-editing.
//!
//! Turns narrative content (chapters of scenes with images, narration, and
//! audio) into a fully specified [`Timeline`](reelsmith_timeline::Timeline):
//! - **Grading:** Infer a color grade from the project title
//! - **Splash:** Detect a year or era and open with a date reveal
//! - **Pacing:** Cycle motion effects, layouts, and transitions by scene index
//! - **Overlays:** Chapter titles, date/location labels, quote cards, captions
//! - **Audio:** Narration per scene plus ducked background music
//!
//! This crate is pure computation with no I/O and no randomness. Every decision is
//! a function of the scene index, chapter index, text, and configuration, so
//! composing the same request twice yields identical timelines.

pub mod captions;
pub mod compose;
pub mod era;
pub mod grade;
pub mod request;

pub use compose::{compose_from_json, AutoEditComposer, ComposeError, EditorialStyle};
pub use request::{AutoEditRequest, Chapter, ComposeConfig, Scene, SceneMetadata};
