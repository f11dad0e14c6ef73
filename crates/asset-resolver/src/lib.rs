//! Asset resolution for render jobs.
//!
//! Materializes every source a timeline references into a per-job
//! workspace before any encoding starts:
//! - **Sources:** Local paths, http(s) URLs, and object-storage keys
//! - **Fetching:** Streamed downloads with redirect and timeout limits
//! - **Validation:** Stills are size-checked and sniffed (JPEG/PNG/WebP)
//! - **Workspaces:** One directory per job, removed exactly once
//!
//! A failing asset only drops its own clip. A job fails here only when no
//! video clip survives.

pub mod error;
pub mod fetch;
pub mod resolve;
pub mod source;
pub mod storage;
pub mod validate;
pub mod workspace;

pub use error::AssetError;
pub use fetch::Fetcher;
pub use resolve::{AssetFailure, AssetResolver, ResolvedAssets, ResolvedAudio, ResolvedVideo};
pub use source::AssetSource;
pub use storage::{HttpObjectStore, LocalObjectStore, ObjectStore};
pub use validate::{sniff_image, ImageFormat, MIN_IMAGE_BYTES};
pub use workspace::JobWorkspace;
