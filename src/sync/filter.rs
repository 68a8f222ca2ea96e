//! Pure filtering of parsed records ahead of classification.
//!
//! A record is classifiable only if its wait annotation is present,
//! non-empty, and starts with a non-negative integer. Records that fail
//! this test produce neither an observation nor a marker; the rendered
//! marker set is always exactly the filtered set.

use super::types::PollingPlaceRecord;

/// Records retained for classification and rendering, in feed order.
pub fn classifiable(records: &[PollingPlaceRecord]) -> Vec<&PollingPlaceRecord> {
    records
        .iter()
        .filter(|r| r.wait_observation().is_some())
        .collect()
}

/// Wait counts of the filtered records, parallel to [`classifiable`].
pub fn observations(filtered: &[&PollingPlaceRecord]) -> Vec<u32> {
    filtered
        .iter()
        .filter_map(|r| r.wait_observation())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, annotation: Option<&str>) -> PollingPlaceRecord {
        PollingPlaceRecord {
            id: id.to_string(),
            name: format!("Precinct {id}"),
            address: "1 Main St".to_string(),
            zip: None,
            lat: 38.6,
            lon: -90.3,
            wait_annotation: annotation.map(|s| s.to_string()),
            map_link: None,
        }
    }

    #[test]
    fn mixed_annotations_yield_only_parseable_observations() {
        let records = vec![
            record("a", Some("12 voters")),
            record("b", Some("45")),
            record("c", Some("")),
            record("d", Some("abc")),
            record("e", None),
        ];

        let filtered = classifiable(&records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].id, "a");
        assert_eq!(filtered[1].id, "b");
        assert_eq!(observations(&filtered), vec![12, 45]);
    }

    #[test]
    fn empty_input_filters_to_empty() {
        let filtered = classifiable(&[]);
        assert!(filtered.is_empty());
        assert!(observations(&filtered).is_empty());
    }

    #[test]
    fn feed_order_is_preserved() {
        let records = vec![
            record("z", Some("30")),
            record("y", Some("10")),
            record("x", Some("20")),
        ];
        let filtered = classifiable(&records);
        let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "y", "x"]);
    }
}
