//! Main TUI application: the event-driven state machine.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crossterm::event::KeyEvent;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ErrorPolicy};
use crate::error::{Error, FetchError};
use crate::model::{EntityRef, MetricRecord};
use crate::poller::Poller;
use crate::source::MetricsSource;

use super::event::{Event, EventHandler};
use super::input::{InputContext, KeyAction, PaneTarget, closes_help_first, handle_key};
use super::render::render;
use super::state::{AppPhase, AppState};
use super::terminal::TerminalGuard;

/// Main TUI application.
pub struct App {
    config: Config,
    source: Arc<dyn MetricsSource>,
    /// Sender side of the event channel, cloned into worker threads.
    events: Sender<Event>,
    state: AppState,
    /// Error that ended the session under the fatal policy.
    fatal: Option<FetchError>,
}

impl App {
    pub fn new(config: Config, source: Arc<dyn MetricsSource>, events: Sender<Event>) -> Self {
        let state = AppState::new(&config.query, config.interval);
        Self {
            config,
            source,
            events,
            state,
            fatal: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn phase(&self) -> &AppPhase {
        &self.state.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.state.phase == AppPhase::Terminated
    }

    /// Error that terminated the session, if any.
    pub fn fatal_error(&self) -> Option<&FetchError> {
        self.fatal.as_ref()
    }

    /// Starts the poller on this app's event channel.
    pub fn spawn_poller(&self) -> std::io::Result<Poller> {
        let source = Arc::clone(&self.source);
        let query = self.config.query.clone();
        Poller::spawn(
            self.config.interval,
            move || source.fetch_metrics(&query),
            self.events.clone(),
        )
    }

    /// Runs the TUI until quit. The terminal is restored before returning,
    /// also when a fatal refresh error ends the session.
    pub fn run(mut self, events: Receiver<Event>) -> Result<(), Error> {
        let mut guard = TerminalGuard::new()?;
        let _input = EventHandler::spawn(self.events.clone())?;
        let mut poller = self.spawn_poller()?;

        let size = guard.terminal_mut().size()?;
        self.handle_event(Event::Resize(size.width, size.height));

        let palette = self.config.palette;
        while !self.is_terminated() {
            guard
                .terminal_mut()
                .draw(|frame| render(frame, &self.state, &palette))?;

            match events.recv() {
                Ok(event) => self.handle_event(event),
                Err(_) => {
                    warn!("event channel closed");
                    self.state.transition(AppPhase::Terminated);
                }
            }
        }

        poller.stop();
        drop(guard);

        match self.fatal.take() {
            Some(e) => Err(Error::Fetch(e)),
            None => Ok(()),
        }
    }

    /// Processes one event. All UI state changes happen here.
    pub fn handle_event(&mut self, event: Event) {
        if self.is_terminated() {
            return;
        }
        match event {
            Event::Key(key) => self.on_key(key),
            Event::Resize(w, h) => {
                debug!("resize {}x{}", w, h);
                self.state.resize(w, h);
            }
            Event::Refresh(result) => self.on_refresh(result),
            Event::Detail { entity, result } => self.on_detail(entity, result),
        }
    }

    fn on_refresh(&mut self, result: Result<Vec<MetricRecord>, FetchError>) {
        self.state.gates.data = true;
        match result {
            Ok(mut records) => {
                self.config.sort_by.apply(&mut records);
                if self.state.last_error.is_some() {
                    info!("refresh recovered with {} records", records.len());
                }
                self.state.apply_records(records);
            }
            Err(e) => match self.config.error_policy {
                ErrorPolicy::Continue => {
                    warn!("refresh failed, keeping last snapshot: {}", e);
                    self.state.last_error = Some(e.to_string());
                }
                ErrorPolicy::Fatal => {
                    error!("refresh failed: {}", e);
                    self.state.transition(AppPhase::Error(e.to_string()));
                    self.fatal = Some(e);
                    self.state.transition(AppPhase::Terminated);
                    return;
                }
            },
        }
        self.state.check_gates();
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctx = InputContext {
            focus: self.state.focus(),
            detail_open: self.state.detail.has_content(),
            help_open: self.state.show_help,
        };
        if closes_help_first(ctx, &key) {
            self.state.show_help = false;
        }
        let ctx = InputContext {
            help_open: self.state.show_help,
            ..ctx
        };

        let action = handle_key(ctx, &key);
        if self.state.phase != AppPhase::Ready && action != KeyAction::Quit {
            return;
        }
        match action {
            KeyAction::None => {}
            KeyAction::Quit => self.state.transition(AppPhase::Terminated),
            KeyAction::ToggleHelp => self.state.show_help = !self.state.show_help,
            KeyAction::CloseHelp => self.state.show_help = false,
            KeyAction::OpenDetail => self.request_detail(),
            KeyAction::ClearDetail => self.state.close_detail(),
            KeyAction::Route(PaneTarget::List) => {
                if self.state.list.handle_key(&key) {
                    let row = self.state.list.current_row_key();
                    if self.state.selection.cursor_moved(row) {
                        self.state.sync_graph();
                    }
                }
            }
            KeyAction::Route(PaneTarget::Detail) => {
                self.state.detail.handle_key(&key);
            }
        }
    }

    /// Starts a manifest lookup for the current entity on a worker thread.
    fn request_detail(&mut self) {
        let Some(entity) = self.state.current_record().map(MetricRecord::entity_ref) else {
            return;
        };
        debug!("fetching manifest for {} {}", entity.kind, entity.name);
        self.state.pending_detail = Some(entity.clone());

        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        let worker = entity.clone();
        let spawned = thread::Builder::new()
            .name("kubetop-detail".to_string())
            .spawn(move || {
                let result = source.fetch_detail(&worker);
                let _ = tx.send(Event::Detail {
                    entity: worker,
                    result,
                });
            });
        if let Err(e) = spawned {
            self.on_detail(
                entity,
                Err(FetchError::Worker(e.to_string())),
            );
        }
    }

    fn on_detail(&mut self, entity: EntityRef, result: Result<String, FetchError>) {
        if self.state.pending_detail.as_ref() != Some(&entity) {
            debug!("dropping stale manifest for {}", entity.name);
            return;
        }
        self.state.pending_detail = None;

        match result {
            Ok(manifest) => {
                self.state.detail.show(entity, &manifest);
                self.state.relayout();
                self.state
                    .selection
                    .enter_detail(self.state.detail.has_content());
            }
            Err(e) => {
                warn!("manifest lookup for {} failed: {}", entity.name, e);
                self.state.detail.show_error(entity, &e.to_string());
                self.state.relayout();
                self.state.selection.exit_detail();
            }
        }
    }
}
