// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Solar Time & Cyclic Schedule Engine
//!
//! This crate computes, for a geographic position and a point in
//! calendar time, the Sun's position and the day's horizon events, a
//! repeating day/night schedule with a remotely overridable dataset,
//! and the nonlinear dial-angle remap ("night compression") applied to
//! every displayed angle.
//!
//! # Core types
//!
//! - [`Instant`] — wall-clock milliseconds plus a UTC offset.
//! - [`JulianDate`] — the continuous astronomical time axis.
//! - [`GeoPosition`] — observer longitude/latitude (wrap/clamp).
//! - [`SolarPosition`] — the Sun's coordinates for one instant.
//! - [`HorizonEvents`] — solar noon, sunrise, sunset, polar sentinels.
//! - [`NightInterval`] — one night of the repeating schedule.
//! - [`DisplayAngle`] — a compressed, display-only dial angle.
//! - [`SolarEngine`] — the engine handle; [`SolarEngine::compute_frame`]
//!   returns a full [`Frame`] per display tick.
//!
//! # Pipeline
//!
//! ```text
//! (longitude, latitude, instant)
//!        │
//!        ├─ ephemeris ─► SolarPosition ──┐
//!        ├─ horizon ───► HorizonEvents ──┤─ compress ─► Frame
//!        └─ cycle ─────► NightIntervals ─┘
//! ```
//!
//! The tick path is synchronous and closed-form; the only suspending
//! operation is the remote dataset fetch, which runs as a background
//! task behind [`SolarEngine::refresh_cycle`] (single-flight, cached,
//! stale-tolerant).
//!
//! # Quick example
//!
//! ```
//! use heliodial::{EngineConfig, Instant, SolarEngine};
//! use heliodial::feed::{CycleDataset, CycleFeed, FeedError};
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl CycleFeed for Offline {
//!     async fn fetch(&self) -> Result<CycleDataset, FeedError> {
//!         Err(FeedError::Timeout)
//!     }
//! }
//!
//! let engine = SolarEngine::with_feed(EngineConfig::default(), Arc::new(Offline));
//! let instant = Instant::from_calendar(2004, 4, 1, 12, 0, 0, 0).unwrap();
//! let frame = engine.compute_frame(instant);
//! println!("sunrise {:?} sunset {:?}", frame.sunrise_label, frame.sunset_label);
//! ```

pub mod angle;
pub mod compress;
pub mod cycle;
pub mod engine;
pub mod ephemeris;
pub mod feed;
pub mod format;
pub mod horizon;
pub(crate) mod instant;
pub(crate) mod julian;

// ── Re-exports ────────────────────────────────────────────────────────────

pub use compress::{
    compress, DisplayAngle, MAX_NIGHT_COMPRESSION, MIN_NIGHT_COMPRESSION, NIGHT_COMPRESSION_STEP,
};
pub use cycle::{next_transition, night_intervals, Countdown, CycleParams, NightInterval, Transition};
pub use engine::{DialAngles, EngineConfig, Frame, NightArc, SolarEngine};
pub use ephemeris::{solar_position, SolarPosition};
pub use feed::{CycleCacheEntry, CycleHealth, CycleService, FeedError, FeedStatus};
pub use horizon::{horizon_events, Crossings, GeoPosition, HorizonEvents};
pub use instant::Instant;
pub use julian::{CalendarError, JulianDate};
