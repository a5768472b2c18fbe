use chrono::Duration;

/// Formats seconds as `HH:MM:SS`, truncating any fraction.
pub fn format_hhmmss(seconds: f64) -> String {
    let whole = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let secs = whole % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

pub fn format_duration(duration: Duration) -> String {
    format_hhmmss(duration_secs(duration))
}

/// Duration as fractional seconds.
pub fn duration_secs(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
