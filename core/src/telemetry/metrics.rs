use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Running totals for one aggregator session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: usize,
    pub fixes: usize,
    pub empty_cycles: usize,
    pub fetch_failures: usize,
    pub rejected_pairs: usize,
    pub outliers: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_cycle(&self, produced_fix: bool) {
        self.update(|m| {
            m.cycles += 1;
            if produced_fix {
                m.fixes += 1;
            } else {
                m.empty_cycles += 1;
            }
        });
    }

    pub fn record_fetch_failures(&self, count: usize) {
        self.update(|m| m.fetch_failures += count);
    }

    pub fn record_rejected_pairs(&self, count: usize) {
        self.update(|m| m.rejected_pairs += count);
    }

    pub fn record_outliers(&self, count: usize) {
        self.update(|m| m.outliers += count);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
