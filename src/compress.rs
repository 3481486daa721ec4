// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Night-compression transform.
//!
//! The 24-hour dial places noon at 0° and midnight at 180°.  To let the
//! night arc shrink or grow visually without touching the underlying
//! astronomy, every displayed angle passes through [`compress`]: a
//! piecewise-linear remap that pulls the two quadrants around midnight
//! together (positive factor) or apart (negative factor) while leaving
//! 0°, 180° and the horizontal axis fixed points of the dial layout.
//!
//! The transform is strictly one-directional: it produces
//! [`DisplayAngle`] values for the rendering layer and is never inverted
//! or fed back into astronomical computation.

use crate::angle::normalize_deg;
use serde::{Deserialize, Serialize};

/// Largest allowed compression factor, in degrees.
pub const MAX_NIGHT_COMPRESSION: f64 = 45.0;

/// Smallest allowed compression factor, in degrees.
pub const MIN_NIGHT_COMPRESSION: f64 = -45.0;

/// Step applied by the engine's increase/decrease mutators (360°/96).
pub const NIGHT_COMPRESSION_STEP: f64 = 360.0 / 96.0;

/// An angle that has passed through the night-compression remap.
///
/// Owned by presentation; nothing in this crate converts it back.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DisplayAngle(f64);

impl DisplayAngle {
    /// The remapped angle in degrees, in `[0, 360)`.
    #[inline]
    pub const fn degrees(&self) -> f64 {
        self.0
    }
}

/// Remap a dial angle by the night-compression factor.
///
/// `angle` is wrapped to `[0, 360)` first; `factor` is assumed to be in
/// `[-45, 45]` — the stepwise mutators on the engine clamp it, this
/// function does not.  Per quadrant:
///
/// ```text
/// (0,   90]: a + a·f/90
/// (90, 180]: a + (180 − a)·f/90
/// (180,270]: a − (a − 180)·f/90
/// (270,360): a − (360 − a)·f/90
/// ```
///
/// The map is the identity for `f = 0` and continuous at the quadrant
/// boundaries for every factor in range.
pub fn compress(angle: f64, factor: f64) -> DisplayAngle {
    let a = normalize_deg(angle);
    let remapped = if a <= 90.0 {
        a + a * factor / 90.0
    } else if a <= 180.0 {
        a + (180.0 - a) * factor / 90.0
    } else if a <= 270.0 {
        a - (a - 180.0) * factor / 90.0
    } else {
        a - (360.0 - a) * factor / 90.0
    };
    DisplayAngle(normalize_deg(remapped))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORS: [f64; 7] = [-45.0, -20.0, -3.75, 0.0, 3.75, 20.0, 45.0];

    #[test]
    fn zero_factor_is_the_identity() {
        let mut a = 0.0;
        while a < 360.0 {
            assert_eq!(compress(a, 0.0).degrees(), a, "angle {}", a);
            a += 0.5;
        }
    }

    #[test]
    fn continuous_at_quadrant_boundaries() {
        const EPS: f64 = 1e-6;
        for &factor in &FACTORS {
            for &boundary in &[0.0, 90.0, 180.0, 270.0, 360.0] {
                let below = compress(normalize_deg(boundary - EPS), factor).degrees();
                let above = compress(boundary + EPS, factor).degrees();
                // Compare on the circle: 359.999… and 0.000… are adjacent.
                let gap = (below - above).abs().min(360.0 - (below - above).abs());
                assert!(
                    gap < 1e-3,
                    "factor {} discontinuous at {}: {} vs {}",
                    factor,
                    boundary,
                    below,
                    above
                );
            }
        }
    }

    #[test]
    fn fixed_points_stay_fixed() {
        for &factor in &FACTORS {
            assert!(compress(0.0, factor).degrees().abs() < 1e-12);
            assert!((compress(180.0, factor).degrees() - 180.0).abs() < 1e-12);
        }
    }

    #[test]
    fn positive_factor_widens_the_day_half() {
        // With f = 45 the 90° marker moves to 135° and 270° to 225°:
        // the night arc around 180° shrinks.
        assert!((compress(90.0, 45.0).degrees() - 135.0).abs() < 1e-12);
        assert!((compress(270.0, 45.0).degrees() - 225.0).abs() < 1e-12);
    }

    #[test]
    fn negative_factor_widens_the_night_half() {
        assert!((compress(90.0, -45.0).degrees() - 45.0).abs() < 1e-12);
        assert!((compress(270.0, -45.0).degrees() - 315.0).abs() < 1e-12);
    }

    #[test]
    fn output_stays_in_range() {
        for &factor in &FACTORS {
            let mut a = 0.0;
            while a < 360.0 {
                let out = compress(a, factor).degrees();
                assert!((0.0..360.0).contains(&out), "angle {} factor {}", a, factor);
                a += 1.0;
            }
        }
    }

    #[test]
    fn out_of_range_angles_are_wrapped_first() {
        assert_eq!(
            compress(450.0, 20.0).degrees(),
            compress(90.0, 20.0).degrees()
        );
        assert_eq!(
            compress(-90.0, 20.0).degrees(),
            compress(270.0, 20.0).degrees()
        );
    }
}
