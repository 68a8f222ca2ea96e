//! The recurring fetch-classify-render cycle.
//!
//! Every poll interval the cycle fetches the polling-place feed, filters
//! out records without a usable wait annotation, recomputes the severity
//! classification from scratch, and replaces the map surface's marker set
//! and legend. Failures never propagate: a failed fetch leaves the last
//! good render standing and raises the degraded-state notice instead.

pub mod classify;
pub mod filter;
pub mod legend;
pub mod markers;
pub mod monitor;
pub mod surface;
pub mod types;

pub use classify::Classification;
pub use legend::Legend;
pub use monitor::{DegradedNotice, NoticeStore};
pub use surface::MapSurfaceStore;
pub use types::{
    FetchCycleResult, MapUpdate, MapUpdateSender, Marker, MarkerPopup, PollingPlaceRecord,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::config::Config;
use crate::providers::feed::{FeedClient, FeedError, RequestLogStore};

/// Where the cycle currently is in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Fetching,
    Filtering,
    Classifying,
    Rendering,
    NotifyDegraded,
}

/// Shared handle to the current cycle phase
pub type PhaseStore = Arc<RwLock<CyclePhase>>;

/// Summary of the most recently completed cycle
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CycleSummary {
    pub completed_at: DateTime<Utc>,
    pub success: bool,
    /// Records parsed from the payload
    pub record_count: usize,
    /// Records with a usable wait annotation
    pub filtered_count: usize,
}

/// Shared handle to the last cycle summary
pub type CycleSummaryStore = Arc<RwLock<Option<CycleSummary>>>;

/// Drives the fetch-classify-render cycle on a fixed schedule.
pub struct CycleManager {
    feed: FeedClient,
    classes: usize,
    palette: Vec<String>,
    poll_interval: Duration,
    surface: MapSurfaceStore,
    notice: NoticeStore,
    phase: PhaseStore,
    summary: CycleSummaryStore,
    last_success: Arc<RwLock<Option<DateTime<Utc>>>>,
    requests: RequestLogStore,
    map_updates_tx: MapUpdateSender,
    rendered_once: AtomicBool,
}

impl CycleManager {
    pub fn new(config: &Config, requests: RequestLogStore) -> Result<Self, FeedError> {
        let feed = FeedClient::new(&config.feed, requests.clone())?;

        // Capacity 16: clients always rebuild from the stores anyway
        let (map_updates_tx, _) = broadcast::channel(16);

        Ok(Self {
            feed,
            classes: config.classification.classes,
            palette: config.classification.palette.clone(),
            poll_interval: Duration::from_millis(config.feed.poll_interval_ms),
            surface: surface::new_store(),
            notice: monitor::new_store(),
            phase: Arc::new(RwLock::new(CyclePhase::Idle)),
            summary: Arc::new(RwLock::new(None)),
            last_success: Arc::new(RwLock::new(None)),
            requests,
            map_updates_tx,
            rendered_once: AtomicBool::new(false),
        })
    }

    /// Get a reference to the map surface store for API access
    pub fn surface_store(&self) -> MapSurfaceStore {
        self.surface.clone()
    }

    /// Get a reference to the degraded-notice store for API access
    pub fn notice_store(&self) -> NoticeStore {
        self.notice.clone()
    }

    pub fn phase_store(&self) -> PhaseStore {
        self.phase.clone()
    }

    pub fn summary_store(&self) -> CycleSummaryStore {
        self.summary.clone()
    }

    pub fn last_success_store(&self) -> Arc<RwLock<Option<DateTime<Utc>>>> {
        self.last_success.clone()
    }

    /// Get the feed request diagnostics store for API access
    pub fn request_log_store(&self) -> RequestLogStore {
        self.requests.clone()
    }

    /// Get the map updates sender for passing to API handlers
    pub fn map_updates_sender(&self) -> MapUpdateSender {
        self.map_updates_tx.clone()
    }

    /// Run the cycle loop until the owning task is cancelled.
    ///
    /// The cycle body is awaited inline, so at most one cycle is ever in
    /// flight; ticks that fire while a cycle is still running are skipped
    /// rather than bursting afterwards.
    pub async fn start(self: Arc<Self>) {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            classes = self.classes,
            "Starting fetch cycle loop"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // First tick fires immediately, giving an initial render on startup.
            interval.tick().await;
            self.run_cycle().await;
        }
    }

    async fn run_cycle(&self) {
        self.set_phase(CyclePhase::Fetching).await;
        let result = self.feed.fetch_cycle().await;
        self.apply_cycle(result).await;
    }

    /// Apply one fetch outcome to the stores.
    pub async fn apply_cycle(&self, result: FetchCycleResult) {
        if !result.success {
            self.set_phase(CyclePhase::NotifyDegraded).await;
            error!(
                error = result.error.as_deref().unwrap_or("unknown"),
                "Fetch cycle failed, keeping previous markers"
            );
            monitor::observe(&self.notice, &result, 0).await;
            *self.summary.write().await = Some(CycleSummary {
                completed_at: result.fetched_at,
                success: false,
                record_count: 0,
                filtered_count: 0,
            });
            self.set_phase(CyclePhase::Idle).await;
            return;
        }

        self.set_phase(CyclePhase::Filtering).await;
        let filtered = filter::classifiable(&result.records);
        let observations = filter::observations(&filtered);

        self.set_phase(CyclePhase::Classifying).await;
        let classification = Classification::compute(&observations, self.classes, &self.palette);
        let legend = legend::build_legend(&classification);
        let new_markers = markers::build_markers(&filtered, &classification);

        let record_count = result.records.len();
        let filtered_count = filtered.len();
        let marker_count = new_markers.len();

        self.set_phase(CyclePhase::Rendering).await;
        {
            let mut surface = self.surface.write().await;
            surface.replace_markers(new_markers);
            if marker_count > 0 {
                surface.set_legend(legend);
            } else {
                surface.clear_legend();
            }
        }

        monitor::observe(&self.notice, &result, filtered_count).await;
        *self.last_success.write().await = Some(result.fetched_at);
        *self.summary.write().await = Some(CycleSummary {
            completed_at: result.fetched_at,
            success: true,
            record_count,
            filtered_count,
        });

        let is_initial = !self.rendered_once.swap(true, Ordering::Relaxed);
        // Ignore send errors - they just mean no one is listening
        let _ = self.map_updates_tx.send(MapUpdate {
            timestamp: Utc::now().to_rfc3339(),
            is_initial,
        });

        info!(
            records = record_count,
            filtered = filtered_count,
            markers = marker_count,
            "Completed fetch cycle"
        );
        self.set_phase(CyclePhase::Idle).await;
    }

    async fn set_phase(&self, phase: CyclePhase) {
        *self.phase.write().await = phase;
    }
}
