use std::collections::HashMap;
use std::time::Instant;

/// Observer for per-tick timing of the live loop.
///
/// Keeps timing concerns out of [`LiveSession`](super::live_session::LiveSession)
/// so the CLI can summarise and tests can stay silent.
pub trait TickLogger {
    /// Record how long a named stage took during one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Count one completed tick (a frame that reached the display).
    fn tick_completed(&mut self);

    /// Count a tick that produced no frame.
    fn tick_skipped(&mut self);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullTickLogger;

impl TickLogger for NullTickLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn tick_completed(&mut self) {}
    fn tick_skipped(&mut self) {}
}

/// Accumulates stage timings and reports averages through `log` at shutdown.
pub struct LogTickLogger {
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    completed: usize,
    skipped: usize,
}

impl LogTickLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            start_time: Instant::now(),
            completed: 0,
            skipped: 0,
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.completed == 0 && self.skipped == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Session summary ({} frames, {} skipped, {:.1}s total):",
            self.completed,
            self.skipped,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        if self.completed > 0 && elapsed_ms > 0.0 {
            let fps = self.completed as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Default for LogTickLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TickLogger for LogTickLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn tick_completed(&mut self) {
        self.completed += 1;
    }

    fn tick_skipped(&mut self) {
        self.skipped += 1;
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
