// ─── Progress ───
// The only channel installers report through. Implementations must tolerate
// concurrent calls from every fetch worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

pub trait ProgressSink: Send + Sync {
    fn set_max(&self, total: u64);
    fn advance(&self, by: u64);
    fn set_status(&self, text: &str);
    fn reset(&self);
}

pub type SharedProgress = Arc<dyn ProgressSink>;

/// Discards everything.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_max(&self, _total: u64) {}
    fn advance(&self, _by: u64) {}
    fn set_status(&self, _text: &str) {}
    fn reset(&self) {}
}

/// Atomic counters plus a serialized status line. Readers poll `snapshot`.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    max: AtomicU64,
    current: AtomicU64,
    status: Mutex<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub max: u64,
    pub current: u64,
    pub status: String,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            max: self.max.load(Ordering::Acquire),
            current: self.current.load(Ordering::Acquire),
            status: self
                .status
                .lock()
                .map(|status| status.clone())
                .unwrap_or_default(),
        }
    }

    /// Fraction complete in `[0, 1]`; zero while the total is unknown.
    pub fn fraction(&self) -> f64 {
        let max = self.max.load(Ordering::Acquire);
        if max == 0 {
            return 0.0;
        }
        (self.current.load(Ordering::Acquire) as f64 / max as f64).min(1.0)
    }
}

impl ProgressSink for ProgressCounter {
    fn set_max(&self, total: u64) {
        self.max.store(total, Ordering::Release);
    }

    fn advance(&self, by: u64) {
        self.current.fetch_add(by, Ordering::AcqRel);
    }

    fn set_status(&self, text: &str) {
        if let Ok(mut status) = self.status.lock() {
            *status = text.to_string();
        }
    }

    fn reset(&self) {
        self.max.store(0, Ordering::Release);
        self.current.store(0, Ordering::Release);
        self.set_status("");
    }
}

/// Wraps a counter and emits an `info!` line every `step` percent.
#[derive(Debug)]
pub struct LogProgress {
    counter: ProgressCounter,
    step: u64,
    last_logged: AtomicU64,
}

impl LogProgress {
    pub fn new(step_percent: u64) -> Self {
        Self {
            counter: ProgressCounter::new(),
            step: step_percent.clamp(1, 100),
            last_logged: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.counter.snapshot()
    }
}

impl ProgressSink for LogProgress {
    fn set_max(&self, total: u64) {
        self.counter.set_max(total);
        info!("Total download size: {} bytes", total);
    }

    fn advance(&self, by: u64) {
        self.counter.advance(by);
        let percent = (self.counter.fraction() * 100.0) as u64;
        let bucket = percent / self.step * self.step;
        let previous = self.last_logged.fetch_max(bucket, Ordering::AcqRel);
        if bucket > previous {
            info!("Progress: {}%", bucket);
        }
    }

    fn set_status(&self, text: &str) {
        self.counter.set_status(text);
        info!("{}", text);
    }

    fn reset(&self) {
        self.counter.reset();
        self.last_logged.store(0, Ordering::Release);
    }
}
