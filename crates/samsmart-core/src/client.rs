//! HTTP client for the SamSmart measurement API.
//!
//! # Example
//!
//! ```no_run
//! use samsmart_core::{ApiClient, Config, SensorSource};
//! use samsmart_types::Source;
//! use time::OffsetDateTime;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let now = OffsetDateTime::now_utc();
//! let deployment = Config::load_validated("config.toml", now)?;
//! let client = ApiClient::from_deployment(&deployment)?;
//!
//! let gas = client
//!     .fetch_past("Gas", Source::Koffer1, time::Duration::hours(48), None, now)
//!     .await?;
//! println!("{} readings", gas.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use samsmart_types::{SensorRecord, Source, Tag};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::Deployment;
use crate::error::{Error, Result, UpstreamError};
use crate::registry::SensorRegistry;
use crate::series::RawTable;
use crate::source::SensorSource;

/// Name of the session header expected by the API.
pub const SESSION_HEADER: &str = "OD-SESSION";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the measurement API.
///
/// Cloning is cheap and shares the underlying connection pool, so one
/// client serves all concurrent fetches of an orchestration call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: String,
    registry: SensorRegistry,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("sensors", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client with the default timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the data API (e.g., "https://host/api/data")
    /// * `session` - Value sent in the `OD-SESSION` header
    /// * `registry` - Sensors that may be queried
    pub fn new(base_url: &str, session: &str, registry: SensorRegistry) -> Result<Self> {
        Self::with_timeout(base_url, session, registry, DEFAULT_TIMEOUT)
    }

    /// Create a new API client with a custom per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        session: &str,
        registry: SensorRegistry,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            UpstreamError::Transport {
                url: base_url.to_string(),
                message: e.to_string(),
            }
        })?;
        Self::with_client(base_url, session, registry, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(
        base_url: &str,
        session: &str,
        registry: SensorRegistry,
        client: Client,
    ) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidArgument(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            session: session.to_string(),
            registry,
        })
    }

    /// Create a client from a loaded deployment.
    pub fn from_deployment(deployment: &Deployment) -> Result<Self> {
        Self::with_timeout(
            &deployment.server.base_url,
            &deployment.user.od_session,
            deployment.sensors.clone(),
            Duration::from_secs(deployment.server.timeout_secs),
        )
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sensors this client may query.
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// The current reading of every accessible sensor, one table each.
    ///
    /// Restricted to one box when `source` is given.
    pub async fn fetch_current(&self, source: Option<Source>) -> Result<Vec<RawTable>> {
        let url = match source {
            Some(source) => format!("{}/items/{}", self.base_url, source),
            None => format!("{}/items", self.base_url),
        };
        let records: Vec<SensorRecord> = self.get(&url, &[]).await?;
        info!("Obtained current readings of {} sensors", records.len());
        Ok(records.iter().map(RawTable::from_record).collect())
    }

    fn sensor_path(&self, sensor_id: &str, source: Source, tag: Option<&Tag>) -> Result<String> {
        self.registry.check_sensor_id(sensor_id)?;
        let tag = tag.cloned().unwrap_or_else(|| Tag::for_source(source));
        Ok(format!("{}/{}", tag, expand_sensor_id(sensor_id, source)))
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET requesting URL {} with parameters {:?}", url, query);
        let response = self
            .client
            .get(url)
            .header(SESSION_HEADER, &self.session)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        handle_response(url, response).await
    }
}

async fn handle_response<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(UpstreamError::NotFound {
            url: url.to_string(),
        }
        .into());
    }
    if !status.is_success() {
        return Err(UpstreamError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let decode = |message: String| UpstreamError::Decode {
        url: url.to_string(),
        message,
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.contains("application/json") {
        return Err(decode(format!(
            "response is not JSON (content type '{}')",
            content_type
        ))
        .into());
    }

    let body = response.text().await.map_err(|e| decode(e.to_string()))?;
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return Err(decode("response is empty".to_string()).into());
    }

    serde_json::from_str(trimmed).map_err(|e| decode(e.to_string()).into())
}

/// `<source>.sensor.<id>`, the API's full sensor name.
fn expand_sensor_id(sensor_id: &str, source: Source) -> String {
    format!("{}{}", source.sensor_prefix(), sensor_id)
}

/// Whole seconds since the epoch, times 1000.
fn posix_millis(ts: OffsetDateTime) -> i64 {
    ts.unix_timestamp() * 1000
}

#[async_trait]
impl SensorSource for ApiClient {
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
        let path = self.sensor_path(sensor_id, source, tag)?;
        let url = format!(
            "{}/historical/{}/{}/{}",
            self.base_url,
            path,
            posix_millis(oldest),
            posix_millis(newest)
        );
        let record: SensorRecord = self.get(&url, &[]).await?;
        let table = RawTable::from_record(&record);
        info!(
            "Obtained {} records for sensor {}, source {} and tag {} from the time between {} and {}",
            table.len(),
            sensor_id,
            source,
            tag.map_or(source.as_str(), Tag::as_str),
            oldest,
            newest
        );
        Ok(table)
    }

    async fn fetch_latest(
        &self,
        sensor_id: &str,
        source: Source,
        n: usize,
        tag: Option<&Tag>,
        at: OffsetDateTime,
    ) -> Result<RawTable> {
        let path = self.sensor_path(sensor_id, source, tag)?;
        let url = format!("{}/live/{}", self.base_url, path);
        let query = [("at", posix_millis(at).to_string()), ("values", n.to_string())];
        let record: SensorRecord = self.get(&url, &query).await?;
        let mut table = RawTable::from_record(&record);
        table.truncate(n);
        info!(
            "Obtained {} latest records for sensor {}, source {} and tag {}",
            table.len(),
            sensor_id,
            source,
            tag.map_or(source.as_str(), Tag::as_str)
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn registry() -> SensorRegistry {
        toml::from_str(r#"Gas = "cardinal""#).unwrap()
    }

    #[test]
    fn test_client_new_valid_url() {
        let client = ApiClient::new("http://localhost:8080/api/data", "s", registry()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/data");
    }

    #[test]
    fn test_client_new_strips_trailing_slash() {
        let client = ApiClient::new("https://host/api/data/", "s", registry()).unwrap();
        assert_eq!(client.base_url(), "https://host/api/data");
    }

    #[test]
    fn test_client_new_invalid_url() {
        let err = ApiClient::new("host/api", "s", registry()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_sensor_path() {
        let client = ApiClient::new("http://h", "s", registry()).unwrap();
        assert_eq!(
            client.sensor_path("Gas", Source::Koffer2, None).unwrap(),
            "koffer2/koffer2.sensor.Gas"
        );
        let tag: Tag = "haushalt3".parse().unwrap();
        assert_eq!(
            client.sensor_path("Gas", Source::Koffer1, Some(&tag)).unwrap(),
            "haushalt3/koffer1.sensor.Gas"
        );
        assert!(
            client
                .sensor_path("Radon", Source::Koffer1, None)
                .unwrap_err()
                .is_invalid_argument()
        );
    }

    #[test]
    fn test_posix_millis_truncates_and_uses_utc() {
        assert_eq!(posix_millis(datetime!(2024-01-01 0:00:00.999 UTC)), 1_704_067_200_000);
        assert_eq!(posix_millis(datetime!(2024-01-01 1:00 +1)), 1_704_067_200_000);
    }

    #[test]
    fn test_debug_hides_session() {
        let client = ApiClient::new("http://h", "very-secret", registry()).unwrap();
        assert!(!format!("{:?}", client).contains("very-secret"));
    }
}
