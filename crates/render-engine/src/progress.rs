//! Job progress reporting.

use std::sync::Mutex;

use reelsmith_timeline::{JobStatus, ProgressUpdate};

/// Callback receiving each progress report of a job.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// First percentage of the download phase.
pub const DOWNLOAD_START: u8 = 5;
/// Last percentage of the download phase.
pub const DOWNLOAD_END: u8 = 40;
/// Reported once the graph is compiled.
pub const COMPILE_DONE: u8 = 45;
/// First percentage of the encode phase.
pub const ENCODE_START: u8 = 50;
/// Width of the encode phase.
pub const ENCODE_SPAN: u8 = 40;
pub const UPLOAD_START: u8 = 90;

/// Percentage after `done` of `total` downloads settled.
pub fn download_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return DOWNLOAD_END;
    }
    let span = usize::from(DOWNLOAD_END - DOWNLOAD_START);
    DOWNLOAD_START + (span * done.min(total) / total) as u8
}

/// Percentage once the encoder has produced `elapsed` of `duration` seconds.
pub fn encode_progress(elapsed: f64, duration: f64) -> u8 {
    if !duration.is_finite() || duration <= 0.0 {
        return ENCODE_START;
    }
    let share = (elapsed / duration).clamp(0.0, 1.0);
    ENCODE_START + (f64::from(ENCODE_SPAN) * share).floor() as u8
}

#[derive(Debug, Default)]
struct ReporterState {
    last: u8,
    finished: bool,
}

/// Serializes reports for one job.
///
/// Progress never goes backwards, and after the first terminal report
/// (`complete` or `failed`) every further report is dropped.
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            state: Mutex::new(ReporterState::default()),
        }
    }

    /// A reporter that only tracks state.
    pub fn silent() -> Self {
        Self::new(None)
    }

    /// Emit a report. Returns whether it was emitted.
    pub fn report(&self, status: JobStatus, progress: u8, message: impl Into<String>) -> bool {
        self.emit(ProgressUpdate::new(status, progress, message))
    }

    /// Emit the single `complete` report.
    pub fn complete(&self, output_path: impl Into<String>, object_storage_url: Option<String>) -> bool {
        let mut update = ProgressUpdate::new(JobStatus::Complete, 100, "Render complete");
        update.output_path = Some(output_path.into());
        update.object_storage_url = object_storage_url;
        self.emit(update)
    }

    /// Emit the single `failed` report, at the last reached percentage.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.emit(ProgressUpdate::new(JobStatus::Failed, 0, message))
    }

    pub fn last_progress(&self) -> u8 {
        self.lock().last
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    fn emit(&self, mut update: ProgressUpdate) -> bool {
        {
            let mut state = self.lock();
            if state.finished {
                return false;
            }
            if update.status == JobStatus::Complete {
                update.progress = 100;
            }
            update.progress = update.progress.max(state.last);
            state.last = update.progress;
            state.finished = update.status.is_terminal();
        }

        tracing::debug!(
            status = ?update.status,
            progress = update.progress,
            message = %update.message,
            "Progress"
        );
        // the callback may call back into this reporter
        if let Some(callback) = &self.callback {
            callback(update);
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ProgressReporter")
            .field("last", &state.last)
            .field("finished", &state.finished)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
