//! Availability monitoring: the degraded-state notice.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::types::FetchCycleResult;

/// Reason reported when a cycle succeeds but yields no usable records
pub const NO_DATA_REASON: &str = "no data";

/// Degraded-state signal consumed by the UI banner/modal.
///
/// The monitor only sets and clears this value; it never touches the
/// rendered marker set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DegradedNotice {
    pub degraded: bool,
    /// Human-readable reason, present while degraded
    pub reason: Option<String>,
    /// When the current degraded episode began
    pub since: Option<DateTime<Utc>>,
}

/// Shared handle to the degraded-state notice
pub type NoticeStore = Arc<RwLock<DegradedNotice>>;

pub fn new_store() -> NoticeStore {
    Arc::new(RwLock::new(DegradedNotice::default()))
}

/// Reason the cycle should be considered degraded, if any.
pub fn degraded_reason(result: &FetchCycleResult, filtered_count: usize) -> Option<String> {
    if !result.success {
        return Some(
            result
                .error
                .clone()
                .unwrap_or_else(|| "feed fetch failed".to_string()),
        );
    }
    if filtered_count == 0 {
        return Some(NO_DATA_REASON.to_string());
    }
    None
}

/// Observe one cycle's outcome, raising or clearing the notice.
pub async fn observe(store: &NoticeStore, result: &FetchCycleResult, filtered_count: usize) {
    let mut notice = store.write().await;
    match degraded_reason(result, filtered_count) {
        Some(reason) => {
            // Keep the original episode start across consecutive bad cycles.
            let since = if notice.degraded {
                notice.since
            } else {
                Some(result.fetched_at)
            };
            *notice = DegradedNotice {
                degraded: true,
                reason: Some(reason),
                since,
            };
        }
        None => {
            *notice = DegradedNotice::default();
        }
    }
}
