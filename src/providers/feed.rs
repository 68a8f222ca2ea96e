//! Client for the polling-place GeoJSON feature service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::sync::types::{FetchCycleResult, PollingPlaceRecord};

/// Maximum allowed feed response size (8 MiB)
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Network error: {0}")]
    NetworkMessage(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Diagnostics for the most recent feed request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedRequestLog {
    /// Unique request ID
    pub id: String,
    /// Timestamp when the request was made
    pub requested_at: DateTime<Utc>,
    /// Query URL called
    pub url: String,
    /// Duration of the request in milliseconds
    pub duration_ms: u64,
    /// HTTP status code, when a response was received
    pub http_status: Option<u16>,
    /// Response size in bytes
    pub response_size: Option<usize>,
    /// Error message if the request failed
    pub error: Option<String>,
}

/// Shared handle to the last feed request's diagnostics
pub type RequestLogStore = Arc<RwLock<Option<FeedRequestLog>>>;

pub fn new_request_log_store() -> RequestLogStore {
    Arc::new(RwLock::new(None))
}

// Wire format of the ArcGIS GeoJSON query response. Only the fields the
// dashboard consumes are modeled; everything else is ignored.

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    properties: Option<FeatureProperties>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// [longitude, latitude]. Kept loosely typed so a stray non-point
    /// feature skips instead of failing the whole payload.
    #[serde(default)]
    coordinates: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    objectid: Option<i64>,
    name: Option<String>,
    address: Option<String>,
    zip: Option<serde_json::Value>,
    inline: Option<String>,
    gmap: Option<String>,
}

/// Read-only client for the polling-place feature service.
pub struct FeedClient {
    client: reqwest::Client,
    query_url: String,
    timeout: Duration,
    requests: RequestLogStore,
}

impl FeedClient {
    pub fn new(config: &FeedConfig, requests: RequestLogStore) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            query_url: build_query_url(&config.url),
            timeout: Duration::from_secs(config.timeout_secs),
            requests,
        })
    }

    /// Run one fetch and fold any failure into the cycle result.
    ///
    /// Transport errors, non-2xx statuses, oversized bodies, and parse
    /// failures all surface as a failure result; nothing escapes this
    /// boundary as an `Err`.
    pub async fn fetch_cycle(&self) -> FetchCycleResult {
        let fetched_at = Utc::now();
        let started = Instant::now();
        let outcome = self.fetch().await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let log = match &outcome {
            Ok((_, status, size)) => FeedRequestLog {
                id: Uuid::new_v4().to_string(),
                requested_at: fetched_at,
                url: self.query_url.clone(),
                duration_ms,
                http_status: Some(*status),
                response_size: Some(*size),
                error: None,
            },
            Err(e) => FeedRequestLog {
                id: Uuid::new_v4().to_string(),
                requested_at: fetched_at,
                url: self.query_url.clone(),
                duration_ms,
                http_status: None,
                response_size: None,
                error: Some(e.to_string()),
            },
        };
        *self.requests.write().await = Some(log);

        match outcome {
            Ok((records, _, _)) => FetchCycleResult::ok(records, fetched_at),
            Err(e) => FetchCycleResult::failure(e.to_string(), fetched_at),
        }
    }

    async fn fetch(&self) -> Result<(Vec<PollingPlaceRecord>, u16, usize), FeedError> {
        let response = self
            .client
            .get(&self.query_url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::NetworkMessage(format!("feed HTTP {}", status)));
        }

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(FeedError::NetworkMessage(format!(
                "feed response too large: {} bytes (max {} bytes)",
                bytes.len(),
                MAX_RESPONSE_SIZE
            )));
        }

        let records = parse_feature_collection(&bytes)?;
        Ok((records, status.as_u16(), bytes.len()))
    }
}

/// Build the GeoJSON query URL from the feature-service base URL.
fn build_query_url(base: &str) -> String {
    format!(
        "{}/query?where={}&outFields=*&f=geojson",
        base.trim_end_matches('/'),
        urlencoding::encode("1=1")
    )
}

/// Parse a GeoJSON payload into polling-place records.
///
/// Features missing geometry, coordinates, or properties are skipped.
fn parse_feature_collection(bytes: &[u8]) -> Result<Vec<PollingPlaceRecord>, FeedError> {
    let collection: FeatureCollection = serde_json::from_slice(bytes)?;

    let mut records = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            debug!("Skipping feature without geometry");
            continue;
        };
        let (Some(lon), Some(lat)) = (
            geometry.coordinates.first().and_then(|v| v.as_f64()),
            geometry.coordinates.get(1).and_then(|v| v.as_f64()),
        ) else {
            debug!("Skipping feature with incomplete coordinates");
            continue;
        };
        let Some(properties) = feature.properties else {
            debug!("Skipping feature without properties");
            continue;
        };

        let name = properties.name.unwrap_or_default();
        let address = properties.address.unwrap_or_default();
        let id = properties
            .objectid
            .map(|oid| oid.to_string())
            .unwrap_or_else(|| format!("{}|{}", name, address));

        records.push(PollingPlaceRecord {
            id,
            name,
            address,
            zip: properties.zip.map(|z| match z {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            lat,
            lon,
            wait_annotation: properties.inline,
            map_link: properties.gmap,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_url_encodes_where_clause() {
        let url = build_query_url("https://example.com/FeatureServer/0");
        assert_eq!(
            url,
            "https://example.com/FeatureServer/0/query?where=1%3D1&outFields=*&f=geojson"
        );
    }

    #[test]
    fn query_url_tolerates_trailing_slash() {
        let url = build_query_url("https://example.com/FeatureServer/0/");
        assert!(url.starts_with("https://example.com/FeatureServer/0/query?"));
    }

    #[test]
    fn parses_features_with_lon_lat_coordinate_order() {
        let payload = br#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-90.33, 38.63]},
                "properties": {
                    "objectid": 7,
                    "name": "Precinct 7",
                    "address": "7 Main St",
                    "zip": "63101",
                    "inline": "12 people",
                    "gmap": "https://maps.example/7"
                }
            }]
        }"#;

        let records = parse_feature_collection(payload).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "7");
        assert_eq!(record.lat, 38.63);
        assert_eq!(record.lon, -90.33);
        assert_eq!(record.wait_annotation.as_deref(), Some("12 people"));
        assert_eq!(record.map_link.as_deref(), Some("https://maps.example/7"));
    }

    #[test]
    fn malformed_features_are_skipped_without_failing_the_payload() {
        let payload = br#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"name": "no geometry"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-90.0]}, "properties": {"name": "short coords"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-90.0, 38.0]}, "properties": null},
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[-90.0, 38.0], [-90.1, 38.1]]]}, "properties": {"name": "not a point", "address": "2 St"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-90.1, 38.1]}, "properties": {"name": "ok", "address": "1 St"}}
            ]
        }"#;

        let records = parse_feature_collection(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn numeric_zip_is_stringified() {
        let payload = br#"{
            "features": [{
                "geometry": {"coordinates": [-90.0, 38.0]},
                "properties": {"name": "n", "address": "a", "zip": 63101}
            }]
        }"#;
        let records = parse_feature_collection(payload).unwrap();
        assert_eq!(records[0].zip.as_deref(), Some("63101"));
    }

    #[test]
    fn missing_objectid_falls_back_to_name_and_address() {
        let payload = br#"{
            "features": [{
                "geometry": {"coordinates": [-90.0, 38.0]},
                "properties": {"name": "Precinct", "address": "1 Main St"}
            }]
        }"#;
        let records = parse_feature_collection(payload).unwrap();
        assert_eq!(records[0].id, "Precinct|1 Main St");
    }

    #[test]
    fn empty_feature_array_parses_to_no_records() {
        let records = parse_feature_collection(br#"{"features": []}"#).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let result = parse_feature_collection(b"not json");
        assert!(matches!(result, Err(FeedError::JsonError(_))));
    }
}
