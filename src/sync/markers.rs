//! Marker-set construction for the current cycle.

use super::classify::Classification;
use super::types::{Marker, MarkerPopup, PollingPlaceRecord};

/// Build the full marker set for one cycle's filtered records.
///
/// Pure and deterministic: equal input produces byte-for-byte equal
/// output, so re-rendering the same cycle is idempotent. One marker per
/// filtered record, in feed order; popup fields echo the record verbatim.
pub fn build_markers(
    filtered: &[&PollingPlaceRecord],
    classification: &Classification,
) -> Vec<Marker> {
    filtered
        .iter()
        .map(|record| {
            // Filtered records always carry an observation.
            let wait = record.wait_observation().unwrap_or(0);
            let class = classification.classify(wait);
            Marker {
                id: record.id.clone(),
                lat: record.lat,
                lon: record.lon,
                class,
                color: classification.colors[class].clone(),
                popup: MarkerPopup {
                    name: record.name.clone(),
                    address: record.address.clone(),
                    wait_annotation: record
                        .wait_annotation
                        .clone()
                        .unwrap_or_default(),
                    map_link: record.map_link.clone(),
                },
            }
        })
        .collect()
}
