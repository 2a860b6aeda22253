//! End-to-end flow without a terminal: poller -> channel -> app controller.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use kubetop::config::{Config, ErrorPolicy};
use kubetop::model::{MetricRecord, ResourceKind};
use kubetop::series::RollingSeriesStore;
use kubetop::source::{MetricsSource, MockSource, Query};
use kubetop::tui::state::AppPhase;
use kubetop::tui::{App, Event};

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Feeds the next `n` events from the channel into the app.
fn pump(app: &mut App, rx: &Receiver<Event>, n: usize) {
    for _ in 0..n {
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("event within timeout");
        app.handle_event(event);
    }
}

#[test]
fn polled_ticks_build_history_for_the_selected_entity() {
    let source = MockSource::new()
        .with_records(vec![
            MetricRecord::node("a", 100, 200, 50, 100),
            MetricRecord::node("b", 300, 300, 90, 100),
        ])
        .with_records(vec![
            MetricRecord::node("a", 150, 200, 60, 100),
            MetricRecord::node("b", 310, 300, 95, 100),
        ]);
    let source: Arc<dyn MetricsSource> = Arc::new(source);

    let (tx, rx) = mpsc::channel();
    let mut config = Config::new(Query::nodes());
    config.interval = Duration::from_millis(20);
    let mut app = App::new(config, Arc::clone(&source), tx);
    app.handle_event(Event::Resize(120, 40));

    let mut poller = app.spawn_poller().expect("spawn poller");
    pump(&mut app, &rx, 3);
    poller.stop();

    assert_eq!(app.phase(), &AppPhase::Ready);
    let state = app.state();
    assert_eq!(state.selection.current(), "a");
    let (cpu, mem) = state.store.get("a");
    assert_eq!(cpu.len(), 3);
    let usage: Vec<f64> = cpu.iter().map(|p| p.usage).collect();
    // The script repeats its last entry once exhausted.
    assert_eq!(usage, vec![100.0, 150.0, 150.0]);
    assert_eq!(mem.latest().map(|p| p.usage), Some(60.0));
    assert_eq!(state.graph.name(), "a");
    assert_eq!(state.graph.point_counts(), (3, 3));
}

#[test]
fn demo_cluster_supports_navigation_and_manifest() {
    let source: Arc<dyn MetricsSource> = Arc::new(MockSource::demo(ResourceKind::Pod));
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(
        Config::new(Query::pods(None)).with_error_policy(ErrorPolicy::Continue),
        Arc::clone(&source),
        tx,
    );
    app.handle_event(Event::Resize(160, 48));
    app.handle_event(Event::Refresh(source.fetch_metrics(&Query::pods(None))));
    assert_eq!(app.phase(), &AppPhase::Ready);

    let first = app.state().selection.current().to_string();
    app.handle_event(key(KeyCode::End));
    assert_ne!(first, app.state().selection.current());
    let last = app
        .state()
        .current_record()
        .map(|r| r.name.clone())
        .expect("selected record");

    app.handle_event(key(KeyCode::Enter));
    pump(&mut app, &rx, 1);
    let detail = app.state().detail.lines().join("\n");
    assert!(detail.contains(&format!("name: {}", last)));

    app.handle_event(key(KeyCode::Esc));
    assert!(!app.state().detail.has_content());
    app.handle_event(key(KeyCode::Char('q')));
    assert!(app.is_terminated());
}

#[test]
fn store_eviction_keeps_most_recent_window() {
    let mut store = RollingSeriesStore::default();
    for i in 1..=150u32 {
        let v = f64::from(i);
        store.upsert(
            "a",
            kubetop::series::SeriesPoint::new(0.0, v),
            kubetop::series::SeriesPoint::new(0.0, v),
        );
    }
    let (cpu, _) = store.get("a");
    assert_eq!(cpu.len(), 100);
    assert_eq!(cpu.get(0).map(|p| p.usage), Some(51.0));
    assert_eq!(cpu.get(99).map(|p| p.usage), Some(150.0));
}
