use chrono::{DateTime, Local};

/// Shortest interval the meter will divide by, in seconds.
pub const MIN_TICK_SECONDS: f64 = 0.0001;

/// Instantaneous frame rate from the gap between consecutive ticks.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    previous: DateTime<Local>,
}

impl FpsMeter {
    pub fn new(start: DateTime<Local>) -> Self {
        Self { previous: start }
    }

    /// Returns `1 / max(now - previous, MIN_TICK_SECONDS)` and makes `now`
    /// the new reference. Always finite and positive, even when the clock
    /// stands still or steps backwards.
    pub fn tick(&mut self, now: DateTime<Local>) -> f64 {
        let elapsed = (now - self.previous)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.previous = now;
        1.0 / elapsed.max(MIN_TICK_SECONDS)
    }

    pub fn reset(&mut self, now: DateTime<Local>) {
        self.previous = now;
    }
}
