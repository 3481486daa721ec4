// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Low-precision solar ephemeris.
//!
//! Implements the classic short-series solar position model: mean anomaly
//! with a linear rate from J2000, a three-term equation of center, the
//! ecliptic-longitude composition, a slow secular obliquity term, and
//! spherical trigonometry for right ascension and declination.  Sidereal
//! time and hour angle are evaluated for an observer longitude.
//!
//! # Accuracy
//!
//! The series is intentionally low precision: compared to a full
//! planetary theory the positions are off by up to about a hundredth of
//! a degree, which translates to horizon-event errors on the order of
//! seconds of time.  That error is an accepted property of the model,
//! not a defect; callers needing VSOP87-class precision need a different
//! engine.
//!
//! All public angles are degrees; conversions to radians happen at the
//! trigonometric call sites only.

use crate::angle::{normalize_deg, normalize_signed_deg};
use crate::julian::JulianDate;
use serde::{Deserialize, Serialize};

/// Mean anomaly at J2000.0, degrees.
const MEAN_ANOMALY_EPOCH: f64 = 357.5291;
/// Mean anomaly rate, degrees per day.
const MEAN_ANOMALY_RATE: f64 = 0.985_600_28;

/// Equation-of-center series coefficients, degrees.
const CENTER_SIN_M: f64 = 1.9148;
const CENTER_SIN_2M: f64 = 0.0200;
const CENTER_SIN_3M: f64 = 0.0003;

/// Argument of perihelion of the Earth's orbit, degrees.
const PERIHELION: f64 = 102.9373;

/// Mean obliquity of the ecliptic at J2000.0, degrees.
const OBLIQUITY_EPOCH: f64 = 23.4393;
/// Secular obliquity drift, degrees per day.
const OBLIQUITY_RATE: f64 = -3.563e-7;

/// Sidereal time at J2000.0 for longitude 0, degrees.
const SIDEREAL_EPOCH: f64 = 280.1470;
/// Sidereal rate, degrees per day.
const SIDEREAL_RATE: f64 = 360.985_623_5;

/// Sun position on the celestial sphere for one instant and observer
/// longitude.
///
/// Right ascension and declination depend only on the instant; sidereal
/// time and hour angle additionally depend on the observer's longitude.
/// All fields are degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Mean anomaly of the Sun, `[0, 360)`.
    pub mean_anomaly: f64,
    /// Equation of center, the mean → true anomaly correction.
    pub equation_of_center: f64,
    /// Ecliptic longitude of the Sun, `[0, 360)`.
    pub ecliptic_longitude: f64,
    /// Obliquity of the ecliptic.
    pub obliquity: f64,
    /// Right ascension, `[0, 360)`.
    pub right_ascension: f64,
    /// Declination, `[-90, 90]`.
    pub declination: f64,
    /// Local sidereal time, `[0, 360)`.
    pub sidereal_time: f64,
    /// Hour angle of the Sun, `[-180, 180)`; zero at solar transit.
    pub hour_angle: f64,
}

/// Compute the Sun's position for a Julian Date and observer longitude
/// (degrees, east positive).
///
/// Pure function, no state; safe to call concurrently.
pub fn solar_position(jd: JulianDate, longitude: f64) -> SolarPosition {
    let d = jd.days_since_j2000().value();

    let mean_anomaly = normalize_deg(MEAN_ANOMALY_EPOCH + MEAN_ANOMALY_RATE * d);
    let equation_of_center = equation_of_center(mean_anomaly);
    let ecliptic_longitude = normalize_deg(mean_anomaly + equation_of_center + PERIHELION + 180.0);
    let obliquity = OBLIQUITY_EPOCH + OBLIQUITY_RATE * d;

    let lambda = ecliptic_longitude.to_radians();
    let epsilon = obliquity.to_radians();
    let right_ascension =
        normalize_deg((lambda.sin() * epsilon.cos()).atan2(lambda.cos()).to_degrees());
    let declination = (lambda.sin() * epsilon.sin()).asin().to_degrees();

    let sidereal_time = normalize_deg(SIDEREAL_EPOCH + SIDEREAL_RATE * d + longitude);
    let hour_angle = normalize_signed_deg(sidereal_time - right_ascension);

    SolarPosition {
        mean_anomaly,
        equation_of_center,
        ecliptic_longitude,
        obliquity,
        right_ascension,
        declination,
        sidereal_time,
        hour_angle,
    }
}

/// Three-term equation of center for the given mean anomaly (degrees).
#[inline]
fn equation_of_center(mean_anomaly: f64) -> f64 {
    let m = mean_anomaly.to_radians();
    CENTER_SIN_M * m.sin() + CENTER_SIN_2M * (2.0 * m).sin() + CENTER_SIN_3M * (3.0 * m).sin()
}
