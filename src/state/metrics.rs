// Execution metrics

use chrono::Utc;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Execution metrics
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetrics {
    pub start_time: i64,
    pub end_time: i64,
    pub total_duration: Duration,
    /// Sum of the elapsed times reported with each `endTest`
    pub test_time: Duration,
    #[serde(skip)]
    started: Instant,
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self {
            start_time: Utc::now().timestamp(),
            end_time: 0,
            total_duration: Duration::ZERO,
            test_time: Duration::ZERO,
            started: Instant::now(),
        }
    }
}

impl ExecutionMetrics {
    /// Stamp the end of the run
    pub fn finish(&mut self) {
        self.end_time = Utc::now().timestamp();
        self.total_duration = self.started.elapsed();
    }
}
