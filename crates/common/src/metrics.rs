//! Usage counters shared by pipeline stages.
//!
//! A single [`UsageMetrics`] instance is created by the caller and handed to
//! each stage as an `Arc`. Counters are plain atomics, so parallel jobs and
//! parallel downloads within a job can record without coordination.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Collector for per-process usage counters.
#[derive(Debug, Default)]
pub struct UsageMetrics {
    assets_fetched: AtomicU64,
    bytes_fetched: AtomicU64,
    assets_rejected: AtomicU64,
    encoder_runs: AtomicU64,
    uploads: AtomicU64,
    upload_failures: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
}

/// Point-in-time copy of [`UsageMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub assets_fetched: u64,
    pub bytes_fetched: u64,
    pub assets_rejected: u64,
    pub encoder_runs: u64,
    pub uploads: u64,
    pub upload_failures: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self, bytes: u64) {
        self.assets_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.assets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encoder_run(&self) {
        self.encoder_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self, ok: bool) {
        if ok {
            self.uploads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.upload_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_job(&self, ok: bool) {
        if ok {
            self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            assets_fetched: self.assets_fetched.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            assets_rejected: self.assets_rejected.load(Ordering::Relaxed),
            encoder_runs: self.encoder_runs.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            upload_failures: self.upload_failures.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter, returning the values they held.
    pub fn reset(&self) -> UsageSnapshot {
        UsageSnapshot {
            assets_fetched: self.assets_fetched.swap(0, Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.swap(0, Ordering::Relaxed),
            assets_rejected: self.assets_rejected.swap(0, Ordering::Relaxed),
            encoder_runs: self.encoder_runs.swap(0, Ordering::Relaxed),
            uploads: self.uploads.swap(0, Ordering::Relaxed),
            upload_failures: self.upload_failures.swap(0, Ordering::Relaxed),
            jobs_completed: self.jobs_completed.swap(0, Ordering::Relaxed),
            jobs_failed: self.jobs_failed.swap(0, Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let metrics = Arc::new(UsageMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_fetch(2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.assets_fetched, 8000);
        assert_eq!(snap.bytes_fetched, 16000);
    }

    #[test]
    fn test_reset_returns_previous_values() {
        let metrics = UsageMetrics::new();
        metrics.record_upload(true);
        metrics.record_upload(false);
        metrics.record_job(false);

        let before = metrics.reset();
        assert_eq!(before.uploads, 1);
        assert_eq!(before.upload_failures, 1);
        assert_eq!(before.jobs_failed, 1);
        assert_eq!(metrics.snapshot(), UsageSnapshot::default());
    }
}
