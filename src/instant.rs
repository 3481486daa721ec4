// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Wall-clock instants with an attached UTC offset.
//!
//! [`Instant`] is the boundary type between the caller's wall-clock world
//! and the crate's astronomical core: unix milliseconds plus the UTC
//! offset the caller is displaying in.  The offset is resolved *before*
//! any astronomy happens — conversion to [`JulianDate`] always goes
//! through the absolute (UTC) millisecond count, never through local
//! calendar fields.

use crate::julian::{CalendarError, JulianDate, UNIX_EPOCH_JD};
use chrono::{DateTime, FixedOffset, Utc};
use qtty::Days;
use serde::{Deserialize, Serialize};

/// Milliseconds in one day.
pub(crate) const MILLIS_PER_DAY: i64 = 86_400_000;

/// A wall-clock instant: absolute unix milliseconds plus a UTC offset.
///
/// Ordering and equality consider the absolute millisecond count first
/// and the offset second, so instants sharing an offset (the usual
/// case) compare by their position in time.  The offset only affects
/// calendar-facing operations (local day window, formatted times).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    unix_millis: i64,
    offset_millis: i32,
}

impl Instant {
    // ── constructors ──────────────────────────────────────────────────

    /// Create from unix milliseconds and a UTC offset in milliseconds.
    ///
    /// The offset is clamped to ±24 h − 1 s, the range `chrono` can
    /// represent as a fixed offset.
    pub const fn new(unix_millis: i64, offset_millis: i32) -> Self {
        let clamped = if offset_millis > 86_399_000 {
            86_399_000
        } else if offset_millis < -86_399_000 {
            -86_399_000
        } else {
            offset_millis
        };
        Self {
            unix_millis,
            offset_millis: clamped,
        }
    }

    /// The current wall-clock time with the given UTC offset.
    pub fn now(offset_millis: i32) -> Self {
        Self::new(Utc::now().timestamp_millis(), offset_millis)
    }

    /// Create from a `chrono::DateTime<Utc>` and a UTC offset.
    pub fn from_utc(datetime: DateTime<Utc>, offset_millis: i32) -> Self {
        Self::new(datetime.timestamp_millis(), offset_millis)
    }

    /// Create from local calendar fields interpreted at the given offset.
    ///
    /// Invalid fields fail with [`CalendarError::InvalidCalendarValue`]
    /// before any arithmetic runs.
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        offset_millis: i32,
    ) -> Result<Self, CalendarError> {
        let local_jd = JulianDate::from_calendar(year, month, day, hour, minute, second)?;
        let utc_millis = jd_to_unix_millis(local_jd) - i64::from(offset_millis);
        Ok(Self::new(utc_millis, offset_millis))
    }

    // ── accessors ─────────────────────────────────────────────────────

    /// Absolute unix milliseconds.
    #[inline]
    pub const fn unix_millis(&self) -> i64 {
        self.unix_millis
    }

    /// UTC offset in milliseconds.
    #[inline]
    pub const fn offset_millis(&self) -> i32 {
        self.offset_millis
    }

    /// This instant shifted by the given number of milliseconds.
    #[inline]
    pub const fn add_millis(&self, millis: i64) -> Self {
        Self {
            unix_millis: self.unix_millis + millis,
            offset_millis: self.offset_millis,
        }
    }

    /// The same absolute instant carrying a different UTC offset.
    #[inline]
    pub const fn with_offset(&self, offset_millis: i32) -> Self {
        Self::new(self.unix_millis, offset_millis)
    }

    // ── conversions ───────────────────────────────────────────────────

    /// Convert to the Julian Date axis (always through UTC).
    pub fn to_julian_date(&self) -> JulianDate {
        JulianDate::from_days(
            UNIX_EPOCH_JD + Days::new(self.unix_millis as f64 / MILLIS_PER_DAY as f64),
        )
    }

    /// Build an instant from a Julian Date, attaching a UTC offset.
    pub fn from_julian_date(jd: JulianDate, offset_millis: i32) -> Self {
        Self::new(jd_to_unix_millis(jd), offset_millis)
    }

    /// The instant as a local `chrono` datetime at its own offset.
    ///
    /// Returns `None` if the millisecond count falls outside chrono's
    /// representable range.
    pub fn local(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_millis / 1_000)?;
        DateTime::<Utc>::from_timestamp_millis(self.unix_millis)
            .map(|utc| utc.with_timezone(&offset))
    }

    /// Fraction of the local calendar day elapsed at this instant, in [0,1).
    #[inline]
    pub fn local_day_fraction(&self) -> f64 {
        let local_millis = self.unix_millis + i64::from(self.offset_millis);
        local_millis.rem_euclid(MILLIS_PER_DAY) as f64 / MILLIS_PER_DAY as f64
    }

    /// Half-open window `[start, end)` of the local calendar day
    /// containing this instant.
    pub fn day_window(&self) -> (Instant, Instant) {
        let offset = i64::from(self.offset_millis);
        let local_millis = self.unix_millis + offset;
        let start = local_millis.div_euclid(MILLIS_PER_DAY) * MILLIS_PER_DAY - offset;
        (
            Self::new(start, self.offset_millis),
            Self::new(start + MILLIS_PER_DAY, self.offset_millis),
        )
    }
}

#[inline]
fn jd_to_unix_millis(jd: JulianDate) -> i64 {
    let days_since_epoch = jd.quantity() - UNIX_EPOCH_JD;
    (days_since_epoch.value() * MILLIS_PER_DAY as f64).round() as i64
}
