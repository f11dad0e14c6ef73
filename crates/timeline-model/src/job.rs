//! Render job contracts: request, outcome, and progress reports.

use serde::{Deserialize, Serialize};

use crate::timeline::Timeline;

/// A request to render one timeline into one output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub timeline: Timeline,

    /// File name of the artifact inside the output directory.
    pub output_name: String,
}

/// Final result of a render job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutcome {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_storage_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderOutcome {
    pub fn completed(output_path: impl Into<String>, object_storage_url: Option<String>) -> Self {
        Self {
            success: true,
            output_path: Some(output_path.into()),
            object_storage_url,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Lifecycle stage of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Downloading,
    Rendering,
    Uploading,
    Complete,
    Failed,
}

impl JobStatus {
    /// `complete` and `failed` end a job's progress stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// One entry in a job's progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub status: JobStatus,

    /// Percentage in `[0, 100]`; non-decreasing within a job.
    pub progress: u8,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_storage_url: Option<String>,

    /// Wall-clock time of the report (RFC 3339).
    pub timestamp: String,
}

impl ProgressUpdate {
    pub fn new(status: JobStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress: progress.min(100),
            message: message.into(),
            output_path: None,
            object_storage_url: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Resolution;

    #[test]
    fn test_render_request_wire_format() {
        let json = r#"{
            "timeline": {"resolution": {"width": 640, "height": 360}, "fps": 24, "duration": 0},
            "outputName": "out.mp4"
        }"#;
        let request: RenderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.output_name, "out.mp4");
        assert_eq!(request.timeline.resolution, Resolution::new(640, 360));
    }

    #[test]
    fn test_outcome_omits_absent_fields() {
        let value = serde_json::to_value(RenderOutcome::failed("boom")).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "boom");
        assert!(value.get("outputPath").is_none());
        assert!(value.get("objectStorageUrl").is_none());
    }

    #[test]
    fn test_progress_is_clamped_and_status_serialized() {
        let update = ProgressUpdate::new(JobStatus::Downloading, 250, "fetching");
        assert_eq!(update.progress, 100);
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["status"], "downloading");
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Uploading.is_terminal());
    }
}
