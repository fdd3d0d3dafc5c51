//! Formatting helpers for sizes, transfer rates and times.

use std::time::Duration;

/// Formats a byte count as a human-readable string (B, KB, MB, GB).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

/// Formats a transfer rate in bytes per second, or `--/s` when unknown.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
    bytes_per_sec
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map_or_else(|| "--/s".to_string(), |s| format!("{}/s", format_bytes(s as u64)))
}

/// Formats a remaining time as a clock (`m:ss` or `h:mm:ss`), or `-:--:--`.
#[must_use]
pub fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "-:--:--".to_string();
    };
    let secs = eta.as_secs();
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// Formats an elapsed time (e.g. "5.0s", "1m 05s", "1h 01m 05s").
#[must_use]
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 3600 {
        format!(
            "{}h {:02}m {:02}s",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    } else if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}.{:01}s", secs, d.subsec_millis() / 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn speed_known_and_unknown() {
        assert_eq!(format_speed(Some(2048.0)), "2.00 KB/s");
        assert_eq!(format_speed(Some(0.0)), "0 B/s");
        assert_eq!(format_speed(None), "--/s");
        assert_eq!(format_speed(Some(f64::NAN)), "--/s");
    }

    #[test]
    fn eta_clock() {
        assert_eq!(format_eta(Some(Duration::from_secs(7))), "0:07");
        assert_eq!(format_eta(Some(Duration::from_secs(125))), "2:05");
        assert_eq!(format_eta(Some(Duration::from_secs(3725))), "1:02:05");
        assert_eq!(format_eta(None), "-:--:--");
    }

    #[test]
    fn elapsed_units() {
        assert_eq!(format_elapsed(Duration::ZERO), "0.0s");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_elapsed(Duration::from_secs(3665)), "1h 01m 05s");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn speed_never_panics(speed in proptest::num::f64::ANY) {
                let _ = format_speed(Some(speed));
            }

            #[test]
            fn eta_always_has_a_colon(secs in 0u64..10_000_000) {
                prop_assert!(format_eta(Some(Duration::from_secs(secs))).contains(':'));
            }
        }
    }
}
