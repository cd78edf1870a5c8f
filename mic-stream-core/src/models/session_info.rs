use std::time::Instant;

use chrono::{DateTime, Utc};

use super::config::PcmFormat;

/// Snapshot of one recording run.
///
/// Created when the device opens, dropped when the session's teardown
/// completes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: String,
    pub format: PcmFormat,
    /// Samples requested per device read.
    pub block_size: usize,
    pub label: String,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl SessionInfo {
    pub fn new(format: PcmFormat, block_size: usize, label: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            format,
            block_size,
            label,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the session started, from a monotonic clock.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Nominal duration of one full block.
    pub fn block_duration_ms(&self) -> u64 {
        if self.format.sample_rate == 0 {
            return 0;
        }
        (self.block_size as u64 * 1000) / self.format.sample_rate as u64
    }
}
