//! Application state: lifecycle phase, panes, series store.
//!
//! Everything here is owned and mutated by the UI thread only.

mod layout;

pub use layout::{PaneLayout, Viewport};

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::model::{EntityRef, MetricRecord, ResourceKind};
use crate::series::{RollingSeriesStore, SeriesPoint};
use crate::source::Query;

use super::detail::DetailPane;
use super::graph::GraphPane;
use super::list::ListPane;
use super::selection::{Focus, SelectionController};

/// Lifecycle of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppPhase {
    /// Waiting for the first refresh and the first size.
    #[default]
    Initializing,
    Ready,
    /// A refresh failed under the fatal error policy.
    Error(String),
    Terminated,
}

/// Conditions that must both hold before the first full render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Gates {
    pub data: bool,
    pub size: bool,
}

impl Gates {
    pub fn open(&self) -> bool {
        self.data && self.size
    }
}

/// All UI-owned state.
#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,
    pub gates: Gates,
    pub kind: ResourceKind,
    /// Scope label for titles (`ns:default`, `all namespaces`, `cluster`).
    pub scope: String,
    pub interval: Duration,
    /// Latest snapshot in display order.
    pub records: Vec<MetricRecord>,
    pub store: RollingSeriesStore,
    pub selection: SelectionController,
    pub list: ListPane,
    pub graph: GraphPane,
    pub detail: DetailPane,
    pub viewport: Viewport,
    pub show_help: bool,
    /// Error of the most recent refresh, cleared by the next good one.
    pub last_error: Option<String>,
    pub last_refresh: Option<DateTime<Local>>,
    /// Manifest lookup in flight; results for anything else are stale.
    pub pending_detail: Option<EntityRef>,
}

impl AppState {
    pub fn new(query: &Query, interval: Duration) -> Self {
        let kind = query.kind();
        Self {
            phase: AppPhase::Initializing,
            gates: Gates::default(),
            kind,
            scope: query.scope_label(),
            interval,
            records: Vec::new(),
            store: RollingSeriesStore::default(),
            selection: SelectionController::new(),
            list: ListPane::new(kind, query.empty_message()),
            graph: GraphPane::new(),
            detail: DetailPane::new(),
            viewport: Viewport::default(),
            show_help: false,
            last_error: None,
            last_refresh: None,
            pending_detail: None,
        }
    }

    pub fn focus(&self) -> Focus {
        self.selection.focus()
    }

    /// Moves to `next`, logging the transition.
    pub fn transition(&mut self, next: AppPhase) {
        if self.phase != next {
            info!("phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }

    /// Leaves `Initializing` once both gates are open.
    pub fn check_gates(&mut self) {
        if self.phase == AppPhase::Initializing && self.gates.open() {
            self.transition(AppPhase::Ready);
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport = Viewport::new(width, height, self.detail.has_content());
        self.relayout();
        self.gates.size = true;
        self.check_gates();
    }

    /// Pushes the current geometry into the panes.
    pub fn relayout(&mut self) {
        self.viewport = Viewport::new(
            self.viewport.width,
            self.viewport.height,
            self.detail.has_content(),
        );
        let graphs = self.viewport.layout.graphs;
        self.graph.set_size(graphs.width, graphs.height);
        self.list.set_height(self.viewport.list_rows());
        let (w, h) = self.viewport.detail_text_size();
        self.detail.set_size(w, h);
        // Keep the selected row's page in view after the height changed.
        self.list.select_key(self.selection.current());
    }

    /// Applies a successful refresh: records every sample, replaces the list
    /// and re-resolves the selection.
    pub fn apply_records(&mut self, records: Vec<MetricRecord>) {
        for r in &records {
            self.store.upsert(
                &r.key(),
                SeriesPoint::new(r.cpu_limit as f64, r.cpu_usage as f64),
                SeriesPoint::new(r.mem_limit as f64, r.mem_usage as f64),
            );
        }
        self.list.set_data(&records, self.kind);
        self.records = records;

        if self.selection.refresh(&self.records) {
            debug!("selection -> '{}'", self.selection.current());
        }
        self.list.select_key(self.selection.current());
        self.sync_graph();

        self.last_error = None;
        self.last_refresh = Some(Local::now());
    }

    /// Points the graph pane at the current entity's series.
    pub fn sync_graph(&mut self) {
        let key = self.selection.current();
        let (cpu, mem) = self.store.get(key);
        self.graph.update(key, cpu, mem);
    }

    /// Record of the current entity, if it is in the latest snapshot.
    pub fn current_record(&self) -> Option<&MetricRecord> {
        let key = self.selection.current();
        if key.is_empty() {
            return None;
        }
        self.records.iter().find(|r| r.key() == key)
    }

    /// Clears the detail pane and gives the keyboard back to the list.
    pub fn close_detail(&mut self) {
        self.pending_detail = None;
        self.detail.clear();
        self.selection.exit_detail();
        self.relayout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(&Query::nodes(), Duration::from_secs(3))
    }

    #[test]
    fn test_ready_needs_both_gates_data_first() {
        let mut s = state();
        s.gates.data = true;
        s.check_gates();
        assert_eq!(s.phase, AppPhase::Initializing);
        s.resize(100, 30);
        assert_eq!(s.phase, AppPhase::Ready);
    }

    #[test]
    fn test_ready_needs_both_gates_size_first() {
        let mut s = state();
        s.resize(100, 30);
        assert_eq!(s.phase, AppPhase::Initializing);
        s.gates.data = true;
        s.check_gates();
        assert_eq!(s.phase, AppPhase::Ready);
    }

    #[test]
    fn test_apply_records_updates_store_list_and_graph() {
        let mut s = state();
        s.resize(100, 30);
        s.apply_records(vec![
            MetricRecord::node("a", 100, 200, 50, 100),
            MetricRecord::node("b", 300, 300, 90, 100),
        ]);
        assert_eq!(s.list.len(), 2);
        assert_eq!(s.selection.current(), "a");
        assert_eq!(s.graph.name(), "a");
        let (cpu, _) = s.store.get("a");
        assert_eq!(cpu.to_vec(), vec![SeriesPoint::new(200.0, 100.0)]);
        assert_eq!(s.current_record().map(|r| r.cpu_usage), Some(100));
    }

    #[test]
    fn test_transition_is_idempotent() {
        let mut s = state();
        s.transition(AppPhase::Terminated);
        s.transition(AppPhase::Terminated);
        assert_eq!(s.phase, AppPhase::Terminated);
    }
}
