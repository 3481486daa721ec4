// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Julian Date arithmetic and Gregorian-calendar conversion.
//!
//! [`JulianDate`] is the continuous time axis every astronomical routine in
//! this crate works on.  It stores a single [`Days`] quantity counting days
//! since the Julian Period, so the struct is `Copy` and layout-identical to
//! an `f64`.
//!
//! The crate deals exclusively with civil (UTC) timestamps, so the Julian
//! Day values here live on the UT axis — the low-precision solar model in
//! [`crate::ephemeris`] is formulated directly in UT and needs no ΔT
//! correction layer.
//!
//! Calendar conversion follows the classical Gregorian algorithm
//! (Fliegel & Van Flandern), valid for the proleptic Gregorian calendar
//! from year 1 onward.  Invalid calendar fields are rejected with
//! [`CalendarError::InvalidCalendarValue`] before any arithmetic runs.

use chrono::{DateTime, Utc};
use qtty::{Day, Days, Second, Seconds};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use thiserror::Error;

/// JD of the Unix epoch (1970-01-01T00:00:00Z).
pub(crate) const UNIX_EPOCH_JD: Days = Days::new(2_440_587.5);

/// Error raised by calendar-field validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// One or more calendar fields do not form a valid date or time.
    #[error("invalid calendar value: {0}")]
    InvalidCalendarValue(String),
}

/// A point on the Julian Date axis.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct JulianDate {
    quantity: Days,
}

impl JulianDate {
    /// J2000.0 epoch: 2000-01-01T12:00:00 UTC (JD 2 451 545.0).
    pub const J2000: Self = Self::new(2_451_545.0);

    /// One Julian century expressed in days.
    pub const JULIAN_CENTURY: Days = Days::new(36_525.0);

    // ── constructors ──────────────────────────────────────────────────

    /// Create from a raw Julian Day scalar.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self {
            quantity: Days::new(value),
        }
    }

    /// Create from a [`Days`] quantity.
    #[inline]
    pub const fn from_days(days: Days) -> Self {
        Self { quantity: days }
    }

    /// Julian Date of midnight opening the given proleptic Gregorian date.
    ///
    /// The Julian Day *number* changes at noon, so the returned value is
    /// `JDN − 0.5` for the date's day number.
    pub fn from_calendar_date(year: i32, month: u32, day: u32) -> Result<Self, CalendarError> {
        let jdn = gregorian_day_number(year, month, day)?;
        Ok(Self::new(jdn as f64 - 0.5))
    }

    /// Julian Date of the given proleptic Gregorian date and UTC time of day.
    pub fn from_calendar(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self, CalendarError> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(CalendarError::InvalidCalendarValue(format!(
                "time of day {hour:02}:{minute:02}:{second:02} is out of range"
            )));
        }
        let midnight = Self::from_calendar_date(year, month, day)?;
        let day_fraction = f64::from(hour * 3_600 + minute * 60 + second) / 86_400.0;
        Ok(midnight + Days::new(day_fraction))
    }

    // ── accessors ─────────────────────────────────────────────────────

    /// The underlying quantity in days.
    #[inline]
    pub const fn quantity(&self) -> Days {
        self.quantity
    }

    /// The underlying scalar value in days.
    #[inline]
    pub const fn value(&self) -> f64 {
        self.quantity.value()
    }

    /// Julian Day Number of the calendar day containing this instant:
    /// `floor(JD + 0.5)`.
    #[inline]
    pub fn day_number(&self) -> i64 {
        (self.value() + 0.5).floor() as i64
    }

    /// Days elapsed since the J2000.0 epoch.
    #[inline]
    pub fn days_since_j2000(&self) -> Days {
        self.quantity - Self::J2000.quantity
    }

    // ── UTC helpers ───────────────────────────────────────────────────

    /// Convert to a `chrono::DateTime<Utc>`.
    ///
    /// Returns `None` if the value falls outside chrono's representable range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let seconds_since_epoch = (self.quantity - UNIX_EPOCH_JD).to::<Second>().value();
        let secs = seconds_since_epoch.floor() as i64;
        let nanos = ((seconds_since_epoch - secs as f64) * 1e9) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }

    /// Build a Julian Date from a `chrono::DateTime<Utc>`.
    pub fn from_utc(datetime: DateTime<Utc>) -> Self {
        let seconds_since_epoch = Seconds::new(datetime.timestamp() as f64);
        let nanos = Seconds::new(datetime.timestamp_subsec_nanos() as f64 / 1e9);
        Self::from_days(UNIX_EPOCH_JD + (seconds_since_epoch + nanos).to::<Day>())
    }

    // ── min / max ─────────────────────────────────────────────────────

    /// Element-wise minimum.
    #[inline]
    pub const fn min(self, other: Self) -> Self {
        Self::from_days(self.quantity.min_const(other.quantity))
    }

    /// Element-wise maximum.
    #[inline]
    pub const fn max(self, other: Self) -> Self {
        Self::from_days(self.quantity.max_const(other.quantity))
    }
}

/// Gregorian calendar date → Julian Day Number (Fliegel & Van Flandern).
///
/// Valid for the proleptic Gregorian calendar from year 1 onward; earlier
/// years and invalid month/day combinations are rejected.
fn gregorian_day_number(year: i32, month: u32, day: u32) -> Result<i64, CalendarError> {
    if year < 1 {
        return Err(CalendarError::InvalidCalendarValue(format!(
            "year {year} precedes the supported calendar range"
        )));
    }
    if chrono::NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(CalendarError::InvalidCalendarValue(format!(
            "{year:04}-{month:02}-{day:02} is not a valid calendar date"
        )));
    }

    let y = i64::from(year);
    let m = i64::from(month);
    let d = i64::from(day);

    // Integer divisions truncate toward zero, as the algorithm requires.
    let a = (m - 14) / 12;
    Ok((1_461 * (y + 4_800 + a)) / 4 + (367 * (m - 2 - 12 * a)) / 12
        - (3 * ((y + 4_900 + a) / 100)) / 4
        + d
        - 32_075)
}

// ── Display ───────────────────────────────────────────────────────────────

impl std::fmt::Display for JulianDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JD {}", self.quantity)
    }
}

// ── Serde ─────────────────────────────────────────────────────────────────

impl Serialize for JulianDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

impl<'de> Deserialize<'de> for JulianDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = f64::deserialize(deserializer)?;
        Ok(Self::new(v))
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────

impl Add<Days> for JulianDate {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity + rhs)
    }
}

impl AddAssign<Days> for JulianDate {
    #[inline]
    fn add_assign(&mut self, rhs: Days) {
        self.quantity += rhs;
    }
}

impl Sub<Days> for JulianDate {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Days) -> Self::Output {
        Self::from_days(self.quantity - rhs)
    }
}

impl SubAssign<Days> for JulianDate {
    #[inline]
    fn sub_assign(&mut self, rhs: Days) {
        self.quantity -= rhs;
    }
}

impl Sub for JulianDate {
    type Output = Days;
    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.quantity - rhs.quantity
    }
}

impl From<Days> for JulianDate {
    #[inline]
    fn from(days: Days) -> Self {
        Self::from_days(days)
    }
}

impl From<JulianDate> for Days {
    #[inline]
    fn from(jd: JulianDate) -> Self {
        jd.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn j2000_day_number() {
        assert_eq!(JulianDate::J2000.day_number(), 2_451_545);
    }

    #[test]
    fn day_number_changes_at_noon() {
        let before_noon = JulianDate::new(2_453_096.999);
        let after_noon = JulianDate::new(2_453_097.001);
        assert_eq!(before_noon.day_number(), 2_453_097);
        assert_eq!(after_noon.day_number(), 2_453_098);
    }

    #[test]
    fn calendar_date_known_values() {
        // 2000-01-01 opens at JD 2451544.5 (JDN 2451545 at its noon).
        let jd = JulianDate::from_calendar_date(2000, 1, 1).expect("valid date");
        assert_eq!(jd.value(), 2_451_544.5);

        // 2004-04-01 — the repository's reference day.
        let jd = JulianDate::from_calendar_date(2004, 4, 1).expect("valid date");
        assert_eq!(jd.value(), 2_453_096.5);
    }

    #[test]
    fn calendar_with_time_of_day() {
        let jd = JulianDate::from_calendar(2004, 4, 1, 12, 0, 0).expect("valid date");
        assert_eq!(jd.value(), 2_453_097.0);

        let jd = JulianDate::from_calendar(2004, 4, 1, 18, 0, 0).expect("valid date");
        assert!((jd.value() - 2_453_097.25).abs() < 1e-12);
    }

    #[test]
    fn invalid_calendar_fields_are_rejected() {
        assert!(matches!(
            JulianDate::from_calendar_date(2004, 2, 30),
            Err(CalendarError::InvalidCalendarValue(_))
        ));
        assert!(matches!(
            JulianDate::from_calendar_date(2004, 13, 1),
            Err(CalendarError::InvalidCalendarValue(_))
        ));
        assert!(matches!(
            JulianDate::from_calendar_date(0, 1, 1),
            Err(CalendarError::InvalidCalendarValue(_))
        ));
        assert!(matches!(
            JulianDate::from_calendar(2004, 4, 1, 24, 0, 0),
            Err(CalendarError::InvalidCalendarValue(_))
        ));
    }

    #[test]
    fn leap_day_is_accepted() {
        let jd = JulianDate::from_calendar_date(2004, 2, 29).expect("2004 is a leap year");
        let next = JulianDate::from_calendar_date(2004, 3, 1).expect("valid date");
        assert_eq!((next - jd).value(), 1.0);
    }

    #[test]
    fn utc_roundtrip_is_stable() {
        let datetime = DateTime::from_timestamp(946_728_000, 0).unwrap();
        let jd = JulianDate::from_utc(datetime);
        assert!((jd.value() - 2_451_545.0).abs() < 1e-9);

        let back = jd.to_utc().expect("to_utc");
        let delta_ns =
            back.timestamp_nanos_opt().unwrap() - datetime.timestamp_nanos_opt().unwrap();
        assert!(delta_ns.abs() < 1_000, "roundtrip error: {} ns", delta_ns);
    }

    #[test]
    fn calendar_agrees_with_utc_conversion() {
        let datetime = DateTime::from_timestamp(1_080_777_600, 0).unwrap(); // 2004-04-01T00:00:00Z
        let via_utc = JulianDate::from_utc(datetime);
        let via_calendar = JulianDate::from_calendar_date(2004, 4, 1).expect("valid date");
        assert!((via_utc - via_calendar).abs() < Days::new(1e-9));
    }

    #[test]
    fn add_sub_days() {
        let mut jd = JulianDate::new(2_451_545.0);
        jd += Days::new(1.0);
        assert_eq!(jd.quantity(), Days::new(2_451_546.0));
        jd -= Days::new(0.5);
        assert_eq!(jd.quantity(), Days::new(2_451_545.5));

        let diff = jd - JulianDate::new(2_451_545.0);
        assert_eq!(diff, Days::new(0.5));
    }

    #[test]
    fn min_max() {
        let earlier = JulianDate::J2000;
        let later = earlier + Days::new(1.0);
        assert_eq!(earlier.min(later), earlier);
        assert_eq!(earlier.max(later), later);
    }

    #[test]
    fn display_contains_label() {
        let jd = JulianDate::new(2_451_545.0);
        assert!(format!("{jd}").contains("JD"));
    }
}
