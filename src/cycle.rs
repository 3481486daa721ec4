// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Repeating day/night schedule ("Cetus cycle").
//!
//! The schedule is a fixed-length cycle anchored at a calibrated night
//! start: every cycle opens with a night of [`CycleParams::night_ms`]
//! milliseconds, followed by day until the next cycle.  The built-in
//! parameters keep the schedule fully functional offline; a remote
//! dataset (see [`crate::feed`]) may override any of them.
//!
//! [`night_intervals`] enumerates the nights intersecting a half-open
//! window and clips them to its bounds, so a caller asking for one
//! calendar day never receives an interval leaking into another day.
//! [`next_transition`] works on the unclipped cycle arithmetic instead,
//! so a countdown across midnight stays correct.

use crate::instant::Instant;
use serde::{Deserialize, Serialize};

/// Default cycle length: 150 minutes.
pub const DEFAULT_CYCLE_LENGTH_MS: i64 = 150 * 60 * 1_000;

/// Default night length: 50 minutes.
pub const DEFAULT_NIGHT_LENGTH_MS: i64 = 50 * 60 * 1_000;

/// Calibrated night-start anchor: 2017-10-30T13:55:00Z.
pub const DEFAULT_NIGHT_EPOCH_UNIX_MS: i64 = 1_509_371_700_000;

/// Parameters of the repeating schedule.
///
/// Invariants (enforced by [`CycleParams::sanitized`]): `cycle_ms > 0`
/// and `0 < night_ms < cycle_ms`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleParams {
    /// Unix milliseconds of a night start anchoring the cycle.
    pub epoch_unix_ms: i64,
    /// Full cycle length in milliseconds.
    pub cycle_ms: i64,
    /// Night length at the start of each cycle, milliseconds.
    pub night_ms: i64,
}

impl Default for CycleParams {
    fn default() -> Self {
        Self {
            epoch_unix_ms: DEFAULT_NIGHT_EPOCH_UNIX_MS,
            cycle_ms: DEFAULT_CYCLE_LENGTH_MS,
            night_ms: DEFAULT_NIGHT_LENGTH_MS,
        }
    }
}

impl CycleParams {
    /// Replace out-of-range lengths with the built-in defaults.
    ///
    /// A remote dataset can deliver any numbers; generation only ever
    /// runs on parameters satisfying the struct invariants.
    pub fn sanitized(self) -> Self {
        let cycle_ms = if self.cycle_ms > 0 {
            self.cycle_ms
        } else {
            DEFAULT_CYCLE_LENGTH_MS
        };
        let night_ms = if self.night_ms > 0 && self.night_ms < cycle_ms {
            self.night_ms
        } else {
            DEFAULT_NIGHT_LENGTH_MS.min(cycle_ms - 1).max(1)
        };
        Self {
            epoch_unix_ms: self.epoch_unix_ms,
            cycle_ms,
            night_ms,
        }
    }
}

/// One night of the repeating schedule, `start < end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightInterval {
    /// Start of the night (inclusive).
    pub start: Instant,
    /// End of the night (exclusive).
    pub end: Instant,
}

impl NightInterval {
    /// Length of the interval in milliseconds.
    #[inline]
    pub fn duration_ms(&self) -> i64 {
        self.end.unix_millis() - self.start.unix_millis()
    }
}

/// Nights of the schedule intersecting `[window_start, window_end)`,
/// clipped to the window, in chronological order.
///
/// The returned intervals are disjoint, each with `start < end`, and
/// never extend past the window bounds.  The instants carry the
/// window's UTC offset.
pub fn night_intervals(
    params: CycleParams,
    window_start: Instant,
    window_end: Instant,
) -> Vec<NightInterval> {
    let params = params.sanitized();
    let ws = window_start.unix_millis();
    let we = window_end.unix_millis();
    let offset = window_start.offset_millis();

    let mut nights = Vec::new();
    if we <= ws {
        return nights;
    }

    // First cycle index whose night can still overlap the window:
    // night end = epoch + k·cycle + night must exceed the window start.
    let mut k = (ws - params.epoch_unix_ms - params.night_ms).div_euclid(params.cycle_ms);
    loop {
        let start = params.epoch_unix_ms + k * params.cycle_ms;
        if start >= we {
            break;
        }
        let end = start + params.night_ms;
        if end > ws {
            nights.push(NightInterval {
                start: Instant::new(start.max(ws), offset),
                end: Instant::new(end.min(we), offset),
            });
        }
        k += 1;
    }
    nights
}

/// What the next schedule transition does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Day ends, a night begins.
    NightStart,
    /// Night ends, a day begins.
    NightEnd,
}

/// Time remaining until the next schedule transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    /// Milliseconds until the transition.
    pub remaining_ms: i64,
    /// Whether the transition starts or ends a night.
    pub upcoming: Transition,
}

impl Countdown {
    /// True while the schedule is currently inside a night.
    #[inline]
    pub fn in_night(&self) -> bool {
        self.upcoming == Transition::NightEnd
    }
}

/// Countdown to the next transition of the repeating schedule at `now`.
///
/// Uses the cycle arithmetic directly (no window, no clipping), so the
/// answer is correct even when the transition falls on the far side of
/// a calendar-day boundary.
pub fn next_transition(params: CycleParams, now: Instant) -> Countdown {
    let params = params.sanitized();
    let phase = (now.unix_millis() - params.epoch_unix_ms).rem_euclid(params.cycle_ms);
    if phase < params.night_ms {
        Countdown {
            remaining_ms: params.night_ms - phase,
            upcoming: Transition::NightEnd,
        }
    } else {
        Countdown {
            remaining_ms: params.cycle_ms - phase,
            upcoming: Transition::NightStart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small round numbers keep the expected interval maths readable.
    fn test_params() -> CycleParams {
        CycleParams {
            epoch_unix_ms: 1_000_000,
            cycle_ms: 150_000,
            night_ms: 50_000,
        }
    }

    #[test]
    fn intervals_are_ordered_disjoint_and_nonempty() {
        let window_start = Instant::new(900_000, 0);
        let window_end = Instant::new(1_900_000, 0);
        let nights = night_intervals(test_params(), window_start, window_end);

        assert!(!nights.is_empty());
        for night in &nights {
            assert!(night.start < night.end, "empty interval: {:?}", night);
            assert!(night.start >= window_start && night.end <= window_end);
        }
        for pair in nights.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap: {:?}", pair);
        }
    }

    #[test]
    fn full_nights_inside_the_window() {
        let nights = night_intervals(
            test_params(),
            Instant::new(1_000_000, 0),
            Instant::new(1_300_000, 0),
        );
        assert_eq!(nights.len(), 2);
        assert_eq!(nights[0].start.unix_millis(), 1_000_000);
        assert_eq!(nights[0].end.unix_millis(), 1_050_000);
        assert_eq!(nights[1].start.unix_millis(), 1_150_000);
        assert_eq!(nights[1].end.unix_millis(), 1_200_000);
    }

    #[test]
    fn nights_are_clipped_to_the_window() {
        // Window opens mid-night and closes mid-night.
        let nights = night_intervals(
            test_params(),
            Instant::new(1_020_000, 0),
            Instant::new(1_170_000, 0),
        );
        assert_eq!(nights.len(), 2);
        assert_eq!(nights[0].start.unix_millis(), 1_020_000);
        assert_eq!(nights[0].end.unix_millis(), 1_050_000);
        assert_eq!(nights[1].start.unix_millis(), 1_150_000);
        assert_eq!(nights[1].end.unix_millis(), 1_170_000);
    }

    #[test]
    fn window_touching_a_night_end_excludes_it() {
        // Half-open semantics: a night ending exactly at the window
        // start does not appear.
        let nights = night_intervals(
            test_params(),
            Instant::new(1_050_000, 0),
            Instant::new(1_150_000, 0),
        );
        assert!(nights.is_empty());
    }

    #[test]
    fn window_before_the_epoch_still_produces_nights() {
        let nights = night_intervals(
            test_params(),
            Instant::new(400_000, 0),
            Instant::new(700_000, 0),
        );
        assert_eq!(nights.len(), 2);
        assert_eq!(nights[0].start.unix_millis(), 400_000);
        assert_eq!(nights[0].end.unix_millis(), 450_000);
        assert_eq!(nights[1].start.unix_millis(), 550_000);
        assert_eq!(nights[1].end.unix_millis(), 600_000);
    }

    #[test]
    fn empty_window_yields_nothing() {
        let nights = night_intervals(
            test_params(),
            Instant::new(1_000_000, 0),
            Instant::new(1_000_000, 0),
        );
        assert!(nights.is_empty());
    }

    #[test]
    fn intervals_carry_the_window_offset() {
        let nights = night_intervals(
            test_params(),
            Instant::new(1_000_000, 3_600_000),
            Instant::new(1_300_000, 3_600_000),
        );
        assert!(nights.iter().all(|n| n.start.offset_millis() == 3_600_000));
    }

    #[test]
    fn countdown_during_a_night() {
        let countdown = next_transition(test_params(), Instant::new(1_010_000, 0));
        assert_eq!(countdown.upcoming, Transition::NightEnd);
        assert_eq!(countdown.remaining_ms, 40_000);
        assert!(countdown.in_night());
    }

    #[test]
    fn countdown_during_a_day() {
        let countdown = next_transition(test_params(), Instant::new(1_060_000, 0));
        assert_eq!(countdown.upcoming, Transition::NightStart);
        assert_eq!(countdown.remaining_ms, 90_000);
        assert!(!countdown.in_night());
    }

    #[test]
    fn countdown_before_the_epoch() {
        // 940 000 is 60 000 into the cycle starting at 850 000.
        let countdown = next_transition(test_params(), Instant::new(940_000, 0));
        assert_eq!(countdown.upcoming, Transition::NightStart);
        assert_eq!(countdown.remaining_ms, 60_000);
    }

    #[test]
    fn sanitize_restores_broken_lengths() {
        let params = CycleParams {
            epoch_unix_ms: 0,
            cycle_ms: 0,
            night_ms: -5,
        }
        .sanitized();
        assert_eq!(params.cycle_ms, DEFAULT_CYCLE_LENGTH_MS);
        assert_eq!(params.night_ms, DEFAULT_NIGHT_LENGTH_MS);

        let params = CycleParams {
            epoch_unix_ms: 0,
            cycle_ms: 60_000,
            night_ms: 90_000,
        }
        .sanitized();
        assert_eq!(params.cycle_ms, 60_000);
        assert!(params.night_ms < params.cycle_ms);
    }

    #[test]
    fn defaults_describe_a_150_minute_cycle() {
        let params = CycleParams::default();
        assert_eq!(params.cycle_ms, 9_000_000);
        assert_eq!(params.night_ms, 3_000_000);
        assert_eq!(params.sanitized(), params);
    }
}
