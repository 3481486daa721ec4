// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Geographic positions and horizon events.
//!
//! [`horizon_events`] derives solar noon, sunrise and sunset for the
//! calendar day around a Julian Date.  Solar noon comes from a
//! closed-form transit estimate refined once by re-evaluating the
//! equation-of-time terms at the estimate (two passes, no iteration
//! loop).  Sunrise and sunset come from the horizon hour-angle equation
//! with the standard −0.833° altitude (atmospheric refraction plus the
//! solar disk radius).
//!
//! Polar conditions are explicit values, not errors: when the Sun never
//! crosses the horizon that day the result carries a
//! [`Crossings::PolarDay`] or [`Crossings::PolarNight`] sentinel and the
//! day length is a full day or zero.

use crate::angle::normalize_deg;
use crate::ephemeris::solar_position;
use crate::julian::JulianDate;
use qtty::{Days, Seconds};
use serde::{Deserialize, Serialize};

/// Sun altitude defining sunrise and sunset, degrees.
///
/// −0.833° accounts for standard atmospheric refraction and the
/// apparent solar disk radius.
pub const SUN_HORIZON_ALTITUDE: f64 = -0.833;

/// Transit-estimate epoch correction, days.
const TRANSIT_EPOCH_BIAS: f64 = 0.0009;
/// Equation-of-time coefficients for the transit correction, days.
const TRANSIT_SIN_M: f64 = 0.0053;
const TRANSIT_SIN_2L: f64 = 0.0069;

/// An observer position on the geographic grid.
///
/// Longitude lives in `[-180, 180)` and wraps; latitude lives in
/// `[-90, 90]` and clamps (there is no wrap across the poles).  The
/// constructor normalizes any out-of-range input, so a value built
/// through [`GeoPosition::new`] always satisfies the invariant.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    longitude: f64,
    latitude: f64,
}

impl GeoPosition {
    /// Create a position, wrapping longitude and clamping latitude.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude: normalize_deg(longitude + 180.0) - 180.0,
            latitude: latitude.clamp(-90.0, 90.0),
        }
    }

    /// Longitude in degrees, east positive, `[-180, 180)`.
    #[inline]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees, north positive, `[-90, 90]`.
    #[inline]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }
}

/// Whether and when the Sun crosses the horizon on a given day.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Crossings {
    /// The Sun rises and sets.
    Rises {
        /// Julian Date of sunrise.
        sunrise: JulianDate,
        /// Julian Date of sunset.
        sunset: JulianDate,
    },
    /// The Sun stays above the horizon all day.
    PolarDay,
    /// The Sun stays below the horizon all day.
    PolarNight,
}

/// Solar noon and horizon crossings for one calendar day and position.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonEvents {
    /// Julian Date of solar transit (hour angle zero).
    pub solar_noon: JulianDate,
    /// Horizon crossings, or the polar sentinel for days without any.
    pub crossings: Crossings,
}

impl HorizonEvents {
    /// Julian Date of sunrise, absent on polar days.
    #[inline]
    pub fn sunrise(&self) -> Option<JulianDate> {
        match self.crossings {
            Crossings::Rises { sunrise, .. } => Some(sunrise),
            _ => None,
        }
    }

    /// Julian Date of sunset, absent on polar days.
    #[inline]
    pub fn sunset(&self) -> Option<JulianDate> {
        match self.crossings {
            Crossings::Rises { sunset, .. } => Some(sunset),
            _ => None,
        }
    }

    /// Length of the lit day.
    ///
    /// `sunset − sunrise` when the Sun crosses the horizon, a full day
    /// for polar day, zero for polar night.
    pub fn day_length(&self) -> Seconds {
        match self.crossings {
            Crossings::Rises { sunrise, sunset } => (sunset - sunrise).to::<qtty::Second>(),
            Crossings::PolarDay => Seconds::new(86_400.0),
            Crossings::PolarNight => Seconds::new(0.0),
        }
    }
}

/// Compute solar noon, sunrise and sunset for the calendar day around
/// `jd` at `position`.
///
/// The transit nearest to `jd` is selected, so passing any instant of
/// the day of interest yields that day's events.
pub fn horizon_events(jd: JulianDate, position: GeoPosition) -> HorizonEvents {
    let longitude = position.longitude();
    let latitude = position.latitude();

    // Closed-form transit estimate for the cycle index nearest `jd`.
    let cycle =
        (jd.days_since_j2000().value() - TRANSIT_EPOCH_BIAS + longitude / 360.0).round();
    let base = JulianDate::J2000 + Days::new(TRANSIT_EPOCH_BIAS - longitude / 360.0 + cycle);

    // Two-pass refinement: evaluate the equation-of-time terms at the
    // estimate, then once more at the corrected transit.
    let noon = transit_correction(base, base);
    let noon = transit_correction(base, noon);

    let at_noon = solar_position(noon, longitude);
    let declination = at_noon.declination.to_radians();
    let phi = latitude.to_radians();

    let cos_h0 = (SUN_HORIZON_ALTITUDE.to_radians().sin() - phi.sin() * declination.sin())
        / (phi.cos() * declination.cos());

    let crossings = if cos_h0 > 1.0 {
        Crossings::PolarNight
    } else if cos_h0 < -1.0 {
        Crossings::PolarDay
    } else {
        let half_arc = Days::new(cos_h0.acos().to_degrees() / 360.0);
        Crossings::Rises {
            sunrise: noon - half_arc,
            sunset: noon + half_arc,
        }
    };

    HorizonEvents {
        solar_noon: noon,
        crossings,
    }
}

/// One equation-of-time correction pass: the transit for `base`, with
/// the solar terms evaluated at `estimate`.
fn transit_correction(base: JulianDate, estimate: JulianDate) -> JulianDate {
    let sp = solar_position(estimate, 0.0);
    base + Days::new(
        TRANSIT_SIN_M * sp.mean_anomaly.to_radians().sin()
            - TRANSIT_SIN_2L * (2.0 * sp.ecliptic_longitude).to_radians().sin(),
    )
}
