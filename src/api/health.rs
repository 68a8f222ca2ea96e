use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::sync::{CyclePhase, MapSurfaceStore, NoticeStore, PhaseStore};

#[derive(Clone)]
pub struct HealthState {
    pub surface: MapSurfaceStore,
    pub notice: NoticeStore,
    pub phase: PhaseStore,
    pub last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether the service is running
    pub healthy: bool,
    /// Number of markers currently drawn
    pub marker_count: usize,
    /// Whether a legend is currently registered
    pub legend_registered: bool,
    /// Whether the degraded-state notice is raised
    pub degraded: bool,
    /// Current phase of the fetch cycle
    pub cycle_phase: CyclePhase,
    /// When the last successful cycle completed
    pub last_success_at: Option<DateTime<Utc>>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let surface = state.surface.read().await;
    let notice = state.notice.read().await;
    let phase = *state.phase.read().await;
    let last_success_at = *state.last_success.read().await;

    Json(HealthResponse {
        healthy: true,
        marker_count: surface.markers().len(),
        legend_registered: surface.legend().is_some(),
        degraded: notice.degraded,
        cycle_phase: phase,
        last_success_at,
    })
}

pub fn router(
    surface: MapSurfaceStore,
    notice: NoticeStore,
    phase: PhaseStore,
    last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
) -> Router {
    let state = HealthState {
        surface,
        notice,
        phase,
        last_success,
    };
    Router::new().route("/", get(health_check)).with_state(state)
}
