use std::time::{Duration, Instant};

/// Throttle for periodic reporting: allows an update at most once per
/// interval.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    /// Last time an update was allowed
    last_update: Option<Instant>,
    /// Minimum interval between updates
    throttle: Duration,
}

impl ProgressTracker {
    /// Create a new progress tracker with default throttling (100ms)
    pub fn new() -> Self {
        Self::with_throttle(Duration::from_millis(100))
    }

    /// Create a new progress tracker with custom throttling interval
    pub fn with_throttle(throttle: Duration) -> Self {
        Self {
            last_update: None,
            throttle,
        }
    }

    /// Check if we should allow a progress update based on throttling.
    /// The first call starts the clock and never reports.
    pub fn should_update(&mut self) -> bool {
        let now = Instant::now();
        match self.last_update {
            None => {
                self.last_update = Some(now);
                false
            }
            Some(last) if now.duration_since(last) >= self.throttle => {
                self.last_update = Some(now);
                true
            }
            Some(_) => false,
        }
    }

    /// Force an update regardless of throttling
    pub fn force_update(&mut self) {
        self.last_update = Some(Instant::now());
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a duration in whole seconds into hours, minutes and seconds
pub fn sec_to_hms(seconds: u64) -> (u64, u64, u64) {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    (h, m, s)
}

/// Format whole seconds as `h:mm:ss`; empty for durations under a second
pub fn timestr(seconds: u64) -> String {
    if seconds == 0 {
        return String::new();
    }
    let (h, m, s) = sec_to_hms(seconds);
    format!("{h}:{m:02}:{s:02}")
}

/// Estimated seconds remaining after `done` of `total` items took `elapsed`
pub fn eta_seconds(done: usize, total: usize, elapsed: Duration) -> u64 {
    if done == 0 || done >= total {
        return 0;
    }
    let remaining = (total - done) as f64;
    (elapsed.as_secs_f64() * remaining / done as f64).round() as u64
}

/// Integer percentage of `done` out of `total`, capped at 100
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Create a visual progress indicator
pub fn create_progress_indicator(progress: u8, width: usize) -> String {
    let filled = (width * progress.min(100) as usize) / 100;
    let empty = width - filled;
    format!("[{}{}] {}%", "=".repeat(filled), "-".repeat(empty), progress)
}
