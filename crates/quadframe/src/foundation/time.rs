//! Time management utilities
//!
//! The scheduler never reads `Instant` directly; it asks a [`Clock`] so
//! that hosts (and tests) can supply their own monotonic time source.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time source consumed by the frame scheduler
pub trait Clock: Send {
    /// Time elapsed since an arbitrary, fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock time source backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is "now"
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic stepping
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, step: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += step;
    }

    /// Jump to an absolute time
    pub fn set(&self, time: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshot of frame timing counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Frames measured so far
    pub frame_count: u64,
    /// Seconds accumulated across all measured frames
    pub total_time: f64,
    /// Seconds between the last two quanta
    pub delta_time: f64,
}

impl FrameStats {
    /// Average FPS since the timer was reset
    pub fn average_fps(&self) -> f64 {
        if self.total_time > 0.0 {
            self.frame_count as f64 / self.total_time
        } else {
            0.0
        }
    }

    /// FPS derived from the last delta
    pub fn current_fps(&self) -> f64 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

/// High-precision timer for frame timing
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Duration,
    stats: FrameStats,
}

impl Timer {
    /// Create a timer whose previous quantum ended at `now`
    pub fn new(now: Duration) -> Self {
        Self {
            last_frame: now,
            stats: FrameStats::default(),
        }
    }

    /// Forget previous frames and restart measuring from `now`
    pub fn reset(&mut self, now: Duration) {
        *self = Self::new(now);
    }

    /// Measure the time since the previous tick (call once per frame)
    ///
    /// Returns the new delta in seconds. A clock that steps backwards
    /// yields a zero delta rather than a negative one.
    pub fn tick(&mut self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.last_frame);
        self.last_frame = now;
        self.stats.delta_time = elapsed.as_secs_f64();
        self.stats.total_time += self.stats.delta_time;
        self.stats.frame_count += 1;
        self.stats.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.stats.delta_time
    }

    /// Current counters
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
