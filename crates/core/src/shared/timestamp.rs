use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeDelta};

/// Human-readable timestamp used in overlays and the stats file.
pub fn display_timestamp(at: &DateTime<Local>) -> String {
    at.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// `<prefix>_<YYYYMMDD>_<HHMMSS>.<extension>` under `dir`.
pub fn timestamped_path(dir: &Path, prefix: &str, at: &DateTime<Local>, extension: &str) -> PathBuf {
    dir.join(format!(
        "{prefix}_{}.{extension}",
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Formats an elapsed duration as `HH:MM:SS`. Negative durations read as zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
