use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::{bad_request, ErrorResponse};
use crate::sync::{Legend, MapSurfaceStore, Marker};

#[derive(Clone)]
pub struct MarkersState {
    pub surface: MapSurfaceStore,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MarkerListQuery {
    /// Restrict the result to one severity class index
    pub class: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkerListResponse {
    /// Marker set of the last rendered cycle
    pub markers: Vec<Marker>,
    /// Legend registered alongside the markers, absent when nothing is drawn
    pub legend: Option<Legend>,
}

/// Current marker set and legend
#[utoipa::path(
    get,
    path = "/api/markers",
    params(MarkerListQuery),
    responses(
        (status = 200, description = "Markers and legend of the last rendered cycle", body = MarkerListResponse),
        (status = 400, description = "Severity class index out of range", body = ErrorResponse)
    ),
    tag = "markers"
)]
pub async fn list_markers(
    State(state): State<MarkersState>,
    Query(query): Query<MarkerListQuery>,
) -> Result<Json<MarkerListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let surface = state.surface.read().await;
    let legend = surface.legend().cloned();

    let markers: Vec<Marker> = match query.class {
        None => surface.markers().to_vec(),
        Some(class) => {
            let classes = legend.as_ref().map(|l| l.entries.len()).unwrap_or(0);
            if class >= classes {
                return Err(bad_request(format!(
                    "class index {} out of range ({} classes)",
                    class, classes
                )));
            }
            surface
                .markers()
                .iter()
                .filter(|m| m.class == class)
                .cloned()
                .collect()
        }
    };

    Ok(Json(MarkerListResponse { markers, legend }))
}

pub fn router(surface: MapSurfaceStore) -> Router {
    let state = MarkersState { surface };
    Router::new()
        .route("/", get(list_markers))
        .with_state(state)
}
