// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Engine facade: configuration, state, and the per-tick frame.
//!
//! [`SolarEngine`] is the one handle a caller constructs and passes
//! around — there is no ambient global state.  The display driver calls
//! [`SolarEngine::compute_frame`] once per tick with a fresh
//! [`Instant`]; the call is synchronous, closed-form and never
//! suspends.  Everything a dial needs for that tick comes back in one
//! [`Frame`]: solar position, horizon events with formatted strings,
//! globe drive values, compressed dial angles, the day's night arcs and
//! the schedule countdown, plus the remote-cache health flag.
//!
//! The only suspending operation in the crate — the remote dataset
//! fetch — is triggered by [`SolarEngine::refresh_cycle`] and runs as a
//! background task; the tick path merely reads its latest completed
//! result.

use crate::angle::{dial_angle, normalize_deg};
use crate::compress::{
    compress, DisplayAngle, MAX_NIGHT_COMPRESSION, MIN_NIGHT_COMPRESSION, NIGHT_COMPRESSION_STEP,
};
use crate::cycle::{next_transition, night_intervals, Countdown, CycleParams, NightInterval};
use crate::ephemeris::{solar_position, SolarPosition};
use crate::feed::{CycleFeed, CycleHealth, CycleService, FeedError, HttpCycleFeed};
use crate::format::{short_time, time_length_string};
use crate::horizon::{horizon_events, GeoPosition, HorizonEvents};
use crate::instant::Instant;
use crate::julian::JulianDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default observer longitude (degrees east).
pub const DEFAULT_LONGITUDE: f64 = 5.0;

/// Default observer latitude (degrees north).
pub const DEFAULT_LATITUDE: f64 = 52.0;

/// Default remote endpoint for the schedule dataset.
pub const DEFAULT_FEED_URL: &str = "https://cetus.heliodial.dev/cycle.json";

/// Default remote fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine construction parameters.
///
/// A plain struct with usable defaults; override the fields you need
/// and hand it to [`SolarEngine::new`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Observer position (wrapped/clamped on construction).
    pub position: GeoPosition,
    /// Initial night-compression factor, degrees in `[-45, 45]`.
    pub night_compression: f64,
    /// Built-in schedule parameters used until a fetch succeeds.
    pub cycle: CycleParams,
    /// Remote dataset endpoint.
    pub feed_url: String,
    /// Remote fetch timeout.
    pub fetch_timeout: Duration,
    /// TTL applied when the dataset carries none.
    pub feed_ttl_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            position: GeoPosition::new(DEFAULT_LONGITUDE, DEFAULT_LATITUDE),
            night_compression: 0.0,
            cycle: CycleParams::default(),
            feed_url: DEFAULT_FEED_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            feed_ttl_ms: crate::feed::DEFAULT_FEED_TTL_MS,
        }
    }
}

/// Compressed dial angles for one tick.
///
/// Sunrise and sunset are absent on polar days, matching the horizon
/// events they derive from.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DialAngles {
    /// Solar-time hand: zero at solar transit.
    pub sun_time: DisplayAngle,
    /// Solar-noon marker.
    pub high_noon: DisplayAngle,
    /// Sunrise marker, absent on polar days.
    pub sunrise: Option<DisplayAngle>,
    /// Sunset marker, absent on polar days.
    pub sunset: Option<DisplayAngle>,
    /// Local wall-clock hand.
    pub local_time: DisplayAngle,
}

/// A night interval prepared for the dial: clipped to the local day,
/// labelled, and remapped to display angles.
#[derive(Debug, Clone, Serialize)]
pub struct NightArc {
    /// The clipped interval itself.
    pub interval: NightInterval,
    /// `HH:MM` label of the interval start.
    pub start_label: String,
    /// `HH:MM` label of the interval end.
    pub end_label: String,
    /// Compressed dial angle of the interval start.
    pub start_angle: DisplayAngle,
    /// Compressed dial angle of the interval end.
    pub end_angle: DisplayAngle,
}

/// Everything a renderer needs for one tick, computed in one pull.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// The instant this frame was computed for.
    pub instant: Instant,
    /// Its Julian Date.
    pub julian_date: JulianDate,
    /// Observer position used.
    pub position: GeoPosition,
    /// Solar coordinates at the instant.
    pub solar: SolarPosition,
    /// The day's horizon events.
    pub horizon: HorizonEvents,
    /// `HH:MM` local time of solar noon.
    pub noon_label: String,
    /// `HH:MM` local time of sunrise, absent on polar days.
    pub sunrise_label: Option<String>,
    /// `HH:MM` local time of sunset, absent on polar days.
    pub sunset_label: Option<String>,
    /// Day length as `HHhMMmSSs`.
    pub day_length_label: String,
    /// Globe rotation phase: day fraction of the Julian Date, degrees.
    pub globe_phase: f64,
    /// Globe tilt: negated solar declination, degrees.
    pub globe_tilt: f64,
    /// Compressed dial angles.
    pub dial: DialAngles,
    /// The local day's night arcs, clipped and labelled.
    pub nights: Vec<NightArc>,
    /// Countdown to the next schedule transition.
    pub countdown: Countdown,
    /// Freshness of the remote schedule dataset.
    pub cycle_health: CycleHealth,
}

/// The engine: one explicit value owning position, compression state
/// and the schedule cache.
///
/// Construct once, share by reference; all astronomical inputs are
/// passed per call.
pub struct SolarEngine {
    position: GeoPosition,
    night_compression: f64,
    cycle_defaults: CycleParams,
    cycle: CycleService,
}

impl SolarEngine {
    /// Build an engine with the production HTTP transport.
    pub fn new(config: EngineConfig) -> Result<Self, FeedError> {
        let feed = HttpCycleFeed::new(config.feed_url.clone(), config.fetch_timeout)?;
        Ok(Self::with_feed(config, Arc::new(feed)))
    }

    /// Build an engine around a custom dataset transport.
    pub fn with_feed(config: EngineConfig, feed: Arc<dyn CycleFeed>) -> Self {
        Self {
            position: config.position,
            night_compression: config
                .night_compression
                .clamp(MIN_NIGHT_COMPRESSION, MAX_NIGHT_COMPRESSION),
            cycle_defaults: config.cycle.sanitized(),
            cycle: CycleService::new(feed, config.feed_ttl_ms),
        }
    }

    // ── observer position ─────────────────────────────────────────────

    /// Current observer position.
    #[inline]
    pub fn position(&self) -> GeoPosition {
        self.position
    }

    /// Move the observer; longitude wraps, latitude clamps.
    pub fn set_position(&mut self, longitude: f64, latitude: f64) {
        self.position = GeoPosition::new(longitude, latitude);
    }

    // ── night compression ─────────────────────────────────────────────

    /// Current night-compression factor.
    #[inline]
    pub fn night_compression(&self) -> f64 {
        self.night_compression
    }

    /// Step the compression factor up by 360°/96, clamped to +45.
    pub fn increase_night_compression(&mut self) {
        self.step_night_compression(1.0);
    }

    /// Step the compression factor down by 360°/96, clamped to −45.
    pub fn decrease_night_compression(&mut self) {
        self.step_night_compression(-1.0);
    }

    /// Reset the compression factor to zero.
    pub fn reset_night_compression(&mut self) {
        self.night_compression = 0.0;
    }

    fn step_night_compression(&mut self, direction: f64) {
        self.night_compression = (self.night_compression + direction * NIGHT_COMPRESSION_STEP)
            .clamp(MIN_NIGHT_COMPRESSION, MAX_NIGHT_COMPRESSION);
    }

    // ── remote schedule ───────────────────────────────────────────────

    /// Start a background refresh of the schedule dataset.
    ///
    /// Single-flight: returns `false` when a fetch is already running
    /// and this request was coalesced.  Requires a tokio runtime.
    pub fn refresh_cycle(&self) -> bool {
        self.cycle.refresh()
    }

    /// True when the schedule cache is worth refreshing at `now`.
    pub fn cycle_expired(&self, now: Instant) -> bool {
        self.cycle.expired(now)
    }

    /// Freshness of the schedule cache at `now`.
    pub fn cycle_health(&self, now: Instant) -> CycleHealth {
        self.cycle.health(now)
    }

    /// Schedule parameters currently in effect (last good dataset over
    /// the built-in defaults).
    pub fn cycle_params(&self) -> CycleParams {
        self.cycle.params(self.cycle_defaults)
    }

    // ── the tick ──────────────────────────────────────────────────────

    /// Compute one display frame at the engine's stored position.
    /// Synchronous and non-blocking.
    pub fn compute_frame(&self, instant: Instant) -> Frame {
        self.compute_frame_at(instant, self.position)
    }

    /// Compute one display frame for an explicit observer position
    /// (wrapped/clamped by [`GeoPosition::new`] at the call site).
    pub fn compute_frame_at(&self, instant: Instant, position: GeoPosition) -> Frame {
        let factor = self.night_compression;
        let offset = instant.offset_millis();

        let julian_date = instant.to_julian_date();
        let solar = solar_position(julian_date, position.longitude());
        let horizon = horizon_events(julian_date, position);

        let noon_instant = Instant::from_julian_date(horizon.solar_noon, offset);
        let sunrise_instant = horizon.sunrise().map(|jd| Instant::from_julian_date(jd, offset));
        let sunset_instant = horizon.sunset().map(|jd| Instant::from_julian_date(jd, offset));

        let dial = DialAngles {
            sun_time: compress(normalize_deg(solar.hour_angle), factor),
            high_noon: compress(instant_dial_angle(&noon_instant), factor),
            sunrise: sunrise_instant
                .as_ref()
                .map(|i| compress(instant_dial_angle(i), factor)),
            sunset: sunset_instant
                .as_ref()
                .map(|i| compress(instant_dial_angle(i), factor)),
            local_time: compress(instant_dial_angle(&instant), factor),
        };

        let params = self.cycle_params();
        let (day_start, day_end) = instant.day_window();
        let nights = night_intervals(params, day_start, day_end)
            .into_iter()
            .map(|interval| NightArc {
                start_label: short_time(&interval.start),
                end_label: short_time(&interval.end),
                start_angle: compress(instant_dial_angle(&interval.start), factor),
                end_angle: compress(instant_dial_angle(&interval.end), factor),
                interval,
            })
            .collect();

        let day_fraction = julian_date.value() - julian_date.day_number() as f64;

        Frame {
            instant,
            julian_date,
            position,
            solar,
            horizon,
            noon_label: short_time(&noon_instant),
            sunrise_label: sunrise_instant.as_ref().map(short_time),
            sunset_label: sunset_instant.as_ref().map(short_time),
            day_length_label: time_length_string(horizon.day_length().value()),
            globe_phase: day_fraction * 360.0,
            globe_tilt: -solar.declination,
            dial,
            nights,
            countdown: next_transition(params, instant),
            cycle_health: self.cycle.health(instant),
        }
    }
}

/// Raw (uncompressed) dial angle of a wall-clock instant.
#[inline]
fn instant_dial_angle(instant: &Instant) -> f64 {
    dial_angle(instant.local_day_fraction())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::CycleDataset;
    use async_trait::async_trait;

    struct OfflineFeed;

    #[async_trait]
    impl CycleFeed for OfflineFeed {
        async fn fetch(&self) -> Result<CycleDataset, FeedError> {
            Err(FeedError::Timeout)
        }
    }

    fn offline_engine(config: EngineConfig) -> SolarEngine {
        SolarEngine::with_feed(config, Arc::new(OfflineFeed))
    }

    #[test]
    fn compression_steps_and_clamps() {
        let mut engine = offline_engine(EngineConfig::default());
        assert_eq!(engine.night_compression(), 0.0);

        engine.increase_night_compression();
        assert!((engine.night_compression() - 3.75).abs() < 1e-12);

        for _ in 0..40 {
            engine.increase_night_compression();
        }
        assert_eq!(engine.night_compression(), MAX_NIGHT_COMPRESSION);

        for _ in 0..100 {
            engine.decrease_night_compression();
        }
        assert_eq!(engine.night_compression(), MIN_NIGHT_COMPRESSION);

        engine.reset_night_compression();
        assert_eq!(engine.night_compression(), 0.0);
    }

    #[test]
    fn initial_compression_is_clamped() {
        let engine = offline_engine(EngineConfig {
            night_compression: 90.0,
            ..EngineConfig::default()
        });
        assert_eq!(engine.night_compression(), MAX_NIGHT_COMPRESSION);
    }

    #[test]
    fn set_position_normalizes_input() {
        let mut engine = offline_engine(EngineConfig::default());
        engine.set_position(200.0, 99.0);
        assert!((engine.position().longitude() - (-160.0)).abs() < 1e-9);
        assert_eq!(engine.position().latitude(), 90.0);
    }

    #[test]
    fn frame_reports_the_reference_day() {
        let engine = offline_engine(EngineConfig::default());
        // 2004-04-01 12:00 UTC — JD 2453097.0.
        let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 0).expect("valid date");
        let frame = engine.compute_frame(instant);

        assert!((frame.julian_date.value() - 2_453_097.0).abs() < 1e-6);
        assert_eq!(frame.noon_label, "11:44");
        assert_eq!(frame.sunrise_label.as_deref(), Some("05:14"));
        assert_eq!(frame.sunset_label.as_deref(), Some("18:14"));
        assert_eq!(&frame.day_length_label[..3], "12h");
        assert_eq!(frame.cycle_health, CycleHealth::Unfetched);
    }

    #[test]
    fn zero_compression_leaves_the_local_hand_raw() {
        let engine = offline_engine(EngineConfig::default());
        let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 0).expect("valid date");
        let frame = engine.compute_frame(instant);

        // Local noon sits at the top of the dial.
        assert!(frame.dial.local_time.degrees().abs() < 1e-9);
        // Solar time is the hour angle, a few degrees past transit.
        assert!((frame.dial.sun_time.degrees() - frame.solar.hour_angle).abs() < 1e-9);
    }

    #[test]
    fn frame_nights_stay_inside_the_local_day() {
        let engine = offline_engine(EngineConfig::default());
        let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 7_200_000).expect("valid date");
        let frame = engine.compute_frame(instant);
        let (day_start, day_end) = instant.day_window();

        assert!(!frame.nights.is_empty());
        for arc in &frame.nights {
            assert!(arc.interval.start >= day_start);
            assert!(arc.interval.end <= day_end);
            assert!(arc.interval.start < arc.interval.end);
            assert_eq!(arc.start_label.len(), 5);
            assert_eq!(arc.end_label.len(), 5);
        }
    }

    #[test]
    fn frame_countdown_matches_the_params() {
        let engine = offline_engine(EngineConfig::default());
        let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 0).expect("valid date");
        let frame = engine.compute_frame(instant);

        let expected = next_transition(engine.cycle_params(), instant);
        assert_eq!(frame.countdown, expected);
        assert!(frame.countdown.remaining_ms > 0);
        assert!(frame.countdown.remaining_ms <= engine.cycle_params().cycle_ms);
    }

    #[test]
    fn globe_values_track_the_solar_state() {
        let engine = offline_engine(EngineConfig::default());
        let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 0).expect("valid date");
        let frame = engine.compute_frame(instant);

        assert_eq!(frame.globe_tilt, -frame.solar.declination);
        // JD 2453097.0 opens a Julian day: phase 0 at its noon epoch.
        assert!(frame.globe_phase.abs() < 1e-6);
    }
}
