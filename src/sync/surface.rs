//! The shared map surface: the marker set and legend currently drawn.
//!
//! Owned by the cycle's render step, which replaces its contents
//! wholesale; API handlers only read it. Holding the write lock for the
//! whole replacement keeps a render atomic from a reader's perspective.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::legend::Legend;
use super::types::Marker;

/// Marker set and legend of the last rendered cycle.
#[derive(Debug, Default)]
pub struct MapSurfaceState {
    markers: Vec<Marker>,
    legend: Option<Legend>,
}

impl MapSurfaceState {
    /// Clear everything previously drawn and add the new marker set.
    pub fn replace_markers(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }

    pub fn set_legend(&mut self, legend: Legend) {
        self.legend = Some(legend);
    }

    pub fn clear_legend(&mut self) {
        self.legend = None;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }
}

/// Shared handle to the map surface for the render step and API access
pub type MapSurfaceStore = Arc<RwLock<MapSurfaceState>>;

pub fn new_store() -> MapSurfaceStore {
    Arc::new(RwLock::new(MapSurfaceState::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::MarkerPopup;

    fn marker(id: &str) -> Marker {
        Marker {
            id: id.to_string(),
            lat: 38.6,
            lon: -90.3,
            class: 0,
            color: "#1a9641".to_string(),
            popup: MarkerPopup {
                name: id.to_string(),
                address: "1 Main St".to_string(),
                wait_annotation: "5".to_string(),
                map_link: None,
            },
        }
    }

    #[test]
    fn replace_discards_previous_markers() {
        let mut surface = MapSurfaceState::default();
        surface.replace_markers(vec![marker("a"), marker("b")]);
        assert_eq!(surface.markers().len(), 2);

        surface.replace_markers(vec![marker("c")]);
        assert_eq!(surface.markers().len(), 1);
        assert_eq!(surface.markers()[0].id, "c");
    }

    #[test]
    fn legend_registration_round_trips() {
        let mut surface = MapSurfaceState::default();
        assert!(surface.legend().is_none());

        surface.set_legend(Legend {
            title: "t".to_string(),
            entries: vec![],
        });
        assert!(surface.legend().is_some());

        surface.clear_legend();
        assert!(surface.legend().is_none());
    }
}
