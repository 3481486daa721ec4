// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Remote dataset lifecycle for the repeating schedule.
//!
//! The schedule parameters in [`crate::cycle`] can be overridden by a
//! small key→value dataset fetched from a remote endpoint.  This module
//! owns that lifecycle:
//!
//! - [`CycleFeed`] — pluggable async transport returning a
//!   [`CycleDataset`]; [`HttpCycleFeed`] is the production GET client.
//! - [`CycleCacheEntry`] — the in-memory cache: last good dataset,
//!   fetch/expiry stamps and a status flag.  Replaced atomically as a
//!   whole, never mutated field by field.
//! - [`CycleService`] — shared handle driving single-flight background
//!   refreshes off the caller's tick path.
//!
//! Failure policy: a failed fetch (timeout, bad status, malformed
//! payload) marks the entry `Failed` but keeps the previous good
//! dataset; schedule generation always prefers the most recent good
//! dataset regardless of its freshness and only widens to the built-in
//! defaults if no fetch ever succeeded.  Expiry (`now > expires_at`)
//! means "worth refreshing", never "data invalid".

use crate::cycle::CycleParams;
use crate::instant::Instant;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Default time-to-live for a fetched dataset: 15 minutes.
pub const DEFAULT_FEED_TTL_MS: i64 = 15 * 60 * 1_000;

/// Dataset keys recognized by the schedule engine.
pub const KEY_CYCLE_START_MS: &str = "cycle_start_ms";
pub const KEY_CYCLE_LENGTH_MS: &str = "cycle_length_ms";
pub const KEY_NIGHT_LENGTH_MS: &str = "night_length_ms";
pub const KEY_TTL_MS: &str = "ttl_ms";

/// Errors of the remote fetch path.
///
/// These never propagate into astronomical computation; they only end
/// up in [`FeedStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// The endpoint answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The payload is not the expected flat JSON object.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// A flat key→value dataset fetched from the remote endpoint.
///
/// Values are kept as `f64`; strings holding numbers or RFC 3339
/// timestamps are coerced (timestamps to unix milliseconds), anything
/// else is skipped.  Unrecognized keys are retained for display but
/// ignored by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleDataset {
    values: BTreeMap<String, f64>,
}

impl CycleDataset {
    /// Parse a dataset from a JSON document.
    ///
    /// The document must be an object; its scalar entries are coerced
    /// as described on the type.
    pub fn from_json(document: &Value) -> Result<Self, FeedError> {
        let object = document
            .as_object()
            .ok_or_else(|| FeedError::Malformed("expected a JSON object".to_string()))?;

        let mut values = BTreeMap::new();
        for (key, value) in object {
            if let Some(number) = coerce_scalar(value) {
                values.insert(key.clone(), number);
            }
        }
        Ok(Self { values })
    }

    /// Build a dataset from raw key→value pairs (used by tests and
    /// custom transports).
    pub fn from_values(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    /// Look up a value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// All key→value pairs, for status displays.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Time-to-live delivered with the dataset, if any.
    pub fn ttl_ms(&self) -> Option<i64> {
        self.get(KEY_TTL_MS).map(|v| v as i64)
    }

    /// Schedule parameters with this dataset's overrides applied on top
    /// of `defaults`, sanitized to the cycle invariants.
    pub fn params_over(&self, defaults: CycleParams) -> CycleParams {
        let get_i64 = |key: &str| self.get(key).map(|v| v as i64);
        CycleParams {
            epoch_unix_ms: get_i64(KEY_CYCLE_START_MS).unwrap_or(defaults.epoch_unix_ms),
            cycle_ms: get_i64(KEY_CYCLE_LENGTH_MS).unwrap_or(defaults.cycle_ms),
            night_ms: get_i64(KEY_NIGHT_LENGTH_MS).unwrap_or(defaults.night_ms),
        }
        .sanitized()
    }
}

fn coerce_scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis() as f64)
        }),
        _ => None,
    }
}

/// Stored outcome of the last fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    /// No fetch has completed yet.
    NeverFetched,
    /// The last fetch succeeded.
    Ok,
    /// The last fetch failed; the reason is kept for status displays.
    Failed(String),
}

/// Freshness classification of the cache at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CycleHealth {
    /// No dataset was ever obtained; the engine runs on defaults.
    Unfetched,
    /// A good dataset is present and within its TTL.
    Ok,
    /// A good dataset is present but past its TTL — still usable,
    /// worth refreshing.
    Stale,
    /// The last fetch failed; the previous good dataset (if any)
    /// remains in use.
    Failed(String),
}

/// The in-memory cache entry for the remote dataset.
///
/// Created empty at service construction, replaced as a whole by each
/// completed fetch.  `dataset` always holds the most recent *good*
/// dataset — a failed fetch updates `status` but leaves it in place.
#[derive(Debug, Clone)]
pub struct CycleCacheEntry {
    /// Most recent successfully fetched dataset.
    pub dataset: Option<CycleDataset>,
    /// When that dataset was fetched.
    pub fetched_at: Option<Instant>,
    /// When it should be considered stale.
    pub expires_at: Option<Instant>,
    /// Outcome of the most recent fetch attempt.
    pub status: FeedStatus,
}

impl CycleCacheEntry {
    /// The empty entry used at construction time.
    pub fn empty() -> Self {
        Self {
            dataset: None,
            fetched_at: None,
            expires_at: None,
            status: FeedStatus::NeverFetched,
        }
    }

    /// True when the entry should be refreshed (`now > expires_at`).
    ///
    /// An entry with no successful fetch yet is always refresh-worthy.
    /// Expired data is still usable — this is a refresh hint, not a
    /// validity check.
    pub fn expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at.with_offset(now.offset_millis()),
            None => true,
        }
    }

    /// Freshness classification at `now`.
    pub fn health(&self, now: Instant) -> CycleHealth {
        match &self.status {
            FeedStatus::NeverFetched => CycleHealth::Unfetched,
            FeedStatus::Failed(reason) => CycleHealth::Failed(reason.clone()),
            FeedStatus::Ok => {
                if self.expired(now) {
                    CycleHealth::Stale
                } else {
                    CycleHealth::Ok
                }
            }
        }
    }
}

/// Async transport delivering the remote dataset.
#[async_trait]
pub trait CycleFeed: Send + Sync {
    /// Fetch the dataset once.
    async fn fetch(&self) -> Result<CycleDataset, FeedError>;
}

/// Production transport: a GET request to a fixed URL with a timeout.
pub struct HttpCycleFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpCycleFeed {
    /// Build a client for `url` with the given request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CycleFeed for HttpCycleFeed {
    async fn fetch(&self) -> Result<CycleDataset, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let document: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout
            } else {
                FeedError::Malformed(e.to_string())
            }
        })?;
        CycleDataset::from_json(&document)
    }
}

fn map_transport_error(error: reqwest::Error) -> FeedError {
    if error.is_timeout() {
        FeedError::Timeout
    } else {
        FeedError::Transport(error.to_string())
    }
}

/// Shared handle to the remote-dataset cache with single-flight refresh.
///
/// Reads (`snapshot`, `params`, `health`) are synchronous and cheap —
/// safe on a display tick.  [`CycleService::refresh`] spawns the fetch
/// on the ambient tokio runtime and returns immediately; while one
/// fetch is in flight further refresh requests are coalesced into it.
pub struct CycleService {
    feed: Arc<dyn CycleFeed>,
    cache: Arc<RwLock<CycleCacheEntry>>,
    in_flight: Arc<AtomicBool>,
    default_ttl_ms: i64,
}

impl CycleService {
    /// Create a service around a transport.  The cache starts empty.
    pub fn new(feed: Arc<dyn CycleFeed>, default_ttl_ms: i64) -> Self {
        Self {
            feed,
            cache: Arc::new(RwLock::new(CycleCacheEntry::empty())),
            in_flight: Arc::new(AtomicBool::new(false)),
            default_ttl_ms,
        }
    }

    /// A copy of the current cache entry.
    pub fn snapshot(&self) -> CycleCacheEntry {
        read_cache(&self.cache).clone()
    }

    /// Schedule parameters derived from the last good dataset, or
    /// `defaults` if no fetch ever succeeded.
    pub fn params(&self, defaults: CycleParams) -> CycleParams {
        match &read_cache(&self.cache).dataset {
            Some(dataset) => dataset.params_over(defaults),
            None => defaults.sanitized(),
        }
    }

    /// Freshness classification at `now`.
    pub fn health(&self, now: Instant) -> CycleHealth {
        read_cache(&self.cache).health(now)
    }

    /// True when the cache is worth refreshing at `now`.
    pub fn expired(&self, now: Instant) -> bool {
        read_cache(&self.cache).expired(now)
    }

    /// Start a background refresh.
    ///
    /// Returns `true` if a fetch was started, `false` if one was
    /// already in flight and this request was coalesced into it.  Must
    /// be called within a tokio runtime; the completed fetch replaces
    /// the cache entry atomically, so the next read observes either the
    /// prior state or the full new one.
    pub fn refresh(&self) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("cycle refresh already in flight; coalescing");
            return false;
        }

        let feed = Arc::clone(&self.feed);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let default_ttl_ms = self.default_ttl_ms;

        tokio::spawn(async move {
            let outcome = feed.fetch().await;
            let now = Instant::now(0);

            let next = match outcome {
                Ok(dataset) => {
                    let ttl_ms = dataset.ttl_ms().unwrap_or(default_ttl_ms).max(0);
                    tracing::info!(ttl_ms, "cycle dataset refreshed");
                    CycleCacheEntry {
                        dataset: Some(dataset),
                        fetched_at: Some(now),
                        expires_at: Some(now.add_millis(ttl_ms)),
                        status: FeedStatus::Ok,
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "cycle dataset refresh failed");
                    let prior = read_cache(&cache).clone();
                    CycleCacheEntry {
                        status: FeedStatus::Failed(error.to_string()),
                        ..prior
                    }
                }
            };

            *write_cache(&cache) = next;
            in_flight.store(false, Ordering::Release);
        });
        true
    }
}

fn read_cache(cache: &RwLock<CycleCacheEntry>) -> std::sync::RwLockReadGuard<'_, CycleCacheEntry> {
    cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_cache(
    cache: &RwLock<CycleCacheEntry>,
) -> std::sync::RwLockWriteGuard<'_, CycleCacheEntry> {
    cache
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
