//! Reelsmith Timeline Model
//!
//! Defines the core data contracts for Reelsmith renders:
//! - **Timeline:** Resolution, frame rate, duration, and three clip tracks
//! - **Clips:** Video (stills with motion and grading), audio, and text overlays
//! - **Jobs:** Render requests, outcomes, and progress reports
//!
//! All times are in seconds from the start of the timeline. A timeline is a
//! passive, validated value: nothing in this crate renders or mutates one.

pub mod clip;
pub mod job;
pub mod timeline;

pub use clip::*;
pub use job::*;
pub use timeline::*;
