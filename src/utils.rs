/// Store timestamps are nanoseconds, the local clock is milliseconds.
pub const NANOS_PER_MILLI: i64 = 1_000_000;

pub fn nanos_to_millis(nanos: i64) -> i64 {
    nanos / NANOS_PER_MILLI
}

pub fn millis_to_nanos(millis: i64) -> i64 {
    millis.saturating_mul(NANOS_PER_MILLI)
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// `H:MM:SS` once past the hour, `MM:SS` before.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

pub fn format_volume(volume: f64) -> String {
    if volume >= 1000.0 {
        format!("{:.1}k kg", volume / 1000.0)
    } else {
        format!("{:.0} kg", volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_conversion_truncates() {
        assert_eq!(nanos_to_millis(1_999_999), 1);
        assert_eq!(millis_to_nanos(1_500), 1_500_000_000);
    }

    #[test]
    fn elapsed_switches_format_after_an_hour() {
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(3_725), "1:02:05");
    }

    #[test]
    fn volume_abbreviates_thousands() {
        assert_eq!(format_volume(950.0), "950 kg");
        assert_eq!(format_volume(12_340.0), "12.3k kg");
    }
}
