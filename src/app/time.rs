/// Placeholder shown while a time is unknown.
pub const UNKNOWN_TIME: &str = "-:--";

/// Format seconds as `M:SS`.
///
/// There is no hours field: an hour renders as `60:00`. Unknown (`NaN`),
/// infinite or negative values render as `-:--`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return UNKNOWN_TIME.to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
