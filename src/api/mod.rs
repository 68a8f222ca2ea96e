pub mod error;
pub mod health;
pub mod markers;
pub mod status;
pub mod ws;

pub use error::ErrorResponse;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::sync::CycleManager;

pub fn router(manager: &Arc<CycleManager>) -> Router {
    let ws_state = ws::WsState {
        surface: manager.surface_store(),
        notice: manager.notice_store(),
        map_updates_tx: manager.map_updates_sender(),
    };

    Router::new()
        .nest("/markers", markers::router(manager.surface_store()))
        .nest(
            "/status",
            status::router(
                manager.notice_store(),
                manager.summary_store(),
                manager.last_success_store(),
                manager.request_log_store(),
            ),
        )
        .nest(
            "/health",
            health::router(
                manager.surface_store(),
                manager.notice_store(),
                manager.phase_store(),
                manager.last_success_store(),
            ),
        )
        .route("/ws/markers", get(ws::ws_markers).with_state(ws_state))
}
