use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::providers::feed::{FeedRequestLog, RequestLogStore};
use crate::sync::{CycleSummary, CycleSummaryStore, DegradedNotice, NoticeStore};

#[derive(Clone)]
pub struct StatusState {
    pub notice: NoticeStore,
    pub summary: CycleSummaryStore,
    pub last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub requests: RequestLogStore,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Degraded-state notice for the UI banner/modal
    pub notice: DegradedNotice,
    /// Summary of the most recently completed cycle
    pub last_cycle: Option<CycleSummary>,
    /// When the last successful cycle completed
    pub last_success_at: Option<DateTime<Utc>>,
    /// Diagnostics for the most recent feed request
    pub last_request: Option<FeedRequestLog>,
}

/// Degraded-state notice and cycle diagnostics
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Current availability status", body = StatusResponse)
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<StatusState>) -> Json<StatusResponse> {
    let notice = state.notice.read().await.clone();
    let last_cycle = state.summary.read().await.clone();
    let last_success_at = *state.last_success.read().await;
    let last_request = state.requests.read().await.clone();

    Json(StatusResponse {
        notice,
        last_cycle,
        last_success_at,
        last_request,
    })
}

pub fn router(
    notice: NoticeStore,
    summary: CycleSummaryStore,
    last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
    requests: RequestLogStore,
) -> Router {
    let state = StatusState {
        notice,
        summary,
        last_success,
        requests,
    };
    Router::new().route("/", get(get_status)).with_state(state)
}
