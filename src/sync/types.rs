use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// One polling place parsed from a cycle's feed payload.
///
/// Immutable once parsed; a new set is produced every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PollingPlaceRecord {
    /// Stable identity (feature objectid, or name|address when absent)
    pub id: String,
    pub name: String,
    pub address: String,
    pub zip: Option<String>,
    pub lat: f64,
    pub lon: f64,
    /// Raw wait annotation, e.g. "12 people in line". Free text whose
    /// leading integer is the reported wait count.
    pub wait_annotation: Option<String>,
    /// External map link for the popup
    pub map_link: Option<String>,
}

impl PollingPlaceRecord {
    /// Wait count derived from the leading ASCII digits of the annotation.
    ///
    /// Missing, empty, or non-digit-leading annotations yield no
    /// observation. No whitespace tolerance: " 7" does not parse.
    pub fn wait_observation(&self) -> Option<u32> {
        let annotation = self.wait_annotation.as_deref()?;
        let digits: &str = {
            let end = annotation
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(annotation.len());
            &annotation[..end]
        };
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }
}

/// Outcome of one fetch cycle. Produced exactly once per tick.
#[derive(Debug, Clone)]
pub struct FetchCycleResult {
    pub success: bool,
    pub records: Vec<PollingPlaceRecord>,
    pub fetched_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl FetchCycleResult {
    pub fn ok(records: Vec<PollingPlaceRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            records,
            fetched_at,
            error: None,
        }
    }

    pub fn failure(error: String, fetched_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            records: Vec::new(),
            fetched_at,
            error: Some(error),
        }
    }
}

/// One rendered marker. The popup echoes the record's raw fields verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// Severity class index assigned by the classifier
    pub class: usize,
    /// Severity color assigned by the classifier
    pub color: String,
    pub popup: MarkerPopup,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MarkerPopup {
    pub name: String,
    pub address: String,
    pub wait_annotation: String,
    pub map_link: Option<String>,
}

/// Update notification sent to WebSocket clients after a rendered cycle
#[derive(Debug, Clone, Serialize)]
pub struct MapUpdate {
    /// Timestamp when this update was generated
    pub timestamp: String,
    /// Whether this is the initial render after startup
    pub is_initial: bool,
}

/// Sender for map update notifications
pub type MapUpdateSender = broadcast::Sender<MapUpdate>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_annotation(annotation: Option<&str>) -> PollingPlaceRecord {
        PollingPlaceRecord {
            id: "1".to_string(),
            name: "Precinct 1".to_string(),
            address: "1 Main St".to_string(),
            zip: Some("63101".to_string()),
            lat: 38.6,
            lon: -90.3,
            wait_annotation: annotation.map(|s| s.to_string()),
            map_link: None,
        }
    }

    #[test]
    fn observation_parses_leading_integer() {
        assert_eq!(
            record_with_annotation(Some("12 voters")).wait_observation(),
            Some(12)
        );
        assert_eq!(record_with_annotation(Some("45")).wait_observation(), Some(45));
        assert_eq!(record_with_annotation(Some("0")).wait_observation(), Some(0));
    }

    #[test]
    fn observation_absent_for_missing_or_empty_annotation() {
        assert_eq!(record_with_annotation(None).wait_observation(), None);
        assert_eq!(record_with_annotation(Some("")).wait_observation(), None);
    }

    #[test]
    fn observation_absent_for_non_numeric_annotation() {
        assert_eq!(record_with_annotation(Some("abc")).wait_observation(), None);
        assert_eq!(
            record_with_annotation(Some("about 20")).wait_observation(),
            None
        );
        // Leading whitespace does not count as a leading integer
        assert_eq!(record_with_annotation(Some(" 7")).wait_observation(), None);
    }

    #[test]
    fn observation_absent_on_overflow() {
        assert_eq!(
            record_with_annotation(Some("99999999999999999999 people")).wait_observation(),
            None
        );
    }
}
