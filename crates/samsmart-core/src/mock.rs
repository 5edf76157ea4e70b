//! Mock sensor source for testing.
//!
//! [`MockSource`] implements [`SensorSource`] over in-memory samples, so
//! orchestration code can be exercised without the remote API.
//!
//! # Features
//!
//! - **Failure injection**: make single sensors fail with a chosen error
//! - **Latency simulation**: delay every fetch to exercise concurrent fan-out
//! - **Call counting**: observe how many fetches were issued

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use samsmart_types::{Source, Tag};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{Error, Result, UpstreamError};
use crate::series::{RawTable, TIMESTAMP_COLUMN};
use crate::source::SensorSource;

type Key = (String, Source);

/// An in-memory [`SensorSource`].
///
/// Sensors without samples answer with [`UpstreamError::NotFound`], like
/// the remote API does for an empty range.
#[derive(Default)]
pub struct MockSource {
    samples: RwLock<HashMap<Key, Vec<(OffsetDateTime, f64)>>>,
    failing: RwLock<HashSet<String>>,
    fetch_count: AtomicU32,
    latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("fetch_count", &self.fetch_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MockSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add samples of one sensor of one box.
    pub async fn add_samples(
        &self,
        sensor_id: &str,
        source: Source,
        samples: impl IntoIterator<Item = (OffsetDateTime, f64)>,
    ) {
        self.samples
            .write()
            .await
            .entry((sensor_id.to_string(), source))
            .or_default()
            .extend(samples);
    }

    /// Make every fetch of `sensor_id` fail with an HTTP 500.
    pub async fn set_failing(&self, sensor_id: &str, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(sensor_id.to_string());
        } else {
            failing.remove(sensor_id);
        }
    }

    /// Set simulated latency of every fetch.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Get the number of fetches performed.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::Relaxed)
    }

    async fn lookup(
        &self,
        sensor_id: &str,
        source: Source,
        tag: Option<&Tag>,
    ) -> Result<Vec<(OffsetDateTime, f64)>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let tag = tag.cloned().unwrap_or_else(|| Tag::for_source(source));
        let url = format!("mock://{}/{}{}", tag, source.sensor_prefix(), sensor_id);

        if self.failing.read().await.contains(sensor_id) {
            return Err(UpstreamError::Http { url, status: 500 }.into());
        }

        match self.samples.read().await.get(&(sensor_id.to_string(), source)) {
            Some(rows) if !rows.is_empty() => Ok(rows.clone()),
            _ => Err(UpstreamError::NotFound { url }.into()),
        }
    }
}

fn table(sensor_id: &str, rows: Vec<(OffsetDateTime, f64)>) -> Result<RawTable> {
    RawTable::new(&[TIMESTAMP_COLUMN, sensor_id], rows)
}

#[async_trait]
impl SensorSource for MockSource {
    async fn fetch_range(
        &self,
        sensor_id: &str,
        source: Source,
        oldest: OffsetDateTime,
        newest: OffsetDateTime,
        tag: Option<&Tag>,
    ) -> Result<RawTable> {
        if oldest > newest {
            return Err(Error::InvalidArgument(format!(
                "range {} to {} is reversed",
                oldest, newest
            )));
        }
        let rows = self
            .lookup(sensor_id, source, tag)
            .await?
            .into_iter()
            .filter(|(ts, _)| oldest <= *ts && *ts <= newest)
            .collect();
        table(sensor_id, rows)
    }

    async fn fetch_latest(
        &self,
        sensor_id: &str,
        source: Source,
        n: usize,
        tag: Option<&Tag>,
        at: OffsetDateTime,
    ) -> Result<RawTable> {
        let mut rows: Vec<_> = self
            .lookup(sensor_id, source, tag)
            .await?
            .into_iter()
            .filter(|(ts, _)| *ts <= at)
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.truncate(n);
        table(sensor_id, rows)
    }
}
