// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Display-string helpers for the rendering layer.
//!
//! The engine hands these strings to the (external) dial: a short
//! `HH:MM` time at the instant's own UTC offset, and a duration rendered
//! as `HHhMMmSSs` with a `24h00m00s` cap for a full day.

use crate::instant::Instant;

/// Short local time, `HH:MM`.
///
/// Falls back to `--:--` for instants outside chrono's representable
/// range.
pub fn short_time(instant: &Instant) -> String {
    match instant.local() {
        Some(local) => local.format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Duration in seconds rendered as `HHhMMmSSs`.
///
/// Durations of a day or more collapse to `24h00m00s`; negative inputs
/// are treated as zero.
pub fn time_length_string(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let days = (seconds / 86_400.0).floor();
    if days >= 1.0 {
        return "24h00m00s".to_string();
    }

    let hours = (seconds / 3_600.0).floor();
    let minutes = ((seconds - hours * 3_600.0) / 60.0).floor();
    let secs = (seconds - hours * 3_600.0 - minutes * 60.0).floor();

    format!("{:02}h{:02}m{:02}s", hours as u32, minutes as u32, secs as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_time_uses_the_local_offset() {
        let instant = Instant::from_calendar(2004, 4, 1, 7, 5, 0, 3_600_000).expect("valid");
        assert_eq!(short_time(&instant), "07:05");

        let utc_view = instant.with_offset(0);
        assert_eq!(short_time(&utc_view), "06:05");
    }

    #[test]
    fn time_length_formats_parts() {
        assert_eq!(time_length_string(0.0), "00h00m00s");
        assert_eq!(time_length_string(3_661.0), "01h01m01s");
        assert_eq!(time_length_string(47_703.0), "13h15m03s");
        assert_eq!(time_length_string(86_399.0), "23h59m59s");
    }

    #[test]
    fn time_length_caps_at_a_full_day() {
        assert_eq!(time_length_string(86_400.0), "24h00m00s");
        assert_eq!(time_length_string(200_000.0), "24h00m00s");
    }

    #[test]
    fn time_length_clamps_negative_input() {
        assert_eq!(time_length_string(-5.0), "00h00m00s");
    }
}
