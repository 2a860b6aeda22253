//! Event handling for TUI.
//!
//! Every input to the app controller travels through one channel: terminal
//! input from a reader thread, refresh results from the poller, manifests from
//! detail workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::error::FetchError;
use crate::model::{EntityRef, MetricRecord};

/// How long the input thread blocks before re-checking its stop flag.
const INPUT_POLL: Duration = Duration::from_millis(200);

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize (width, height).
    Resize(u16, u16),
    /// One poll tick finished.
    Refresh(Result<Vec<MetricRecord>, FetchError>),
    /// A manifest lookup finished.
    Detail {
        entity: EntityRef,
        result: Result<String, FetchError>,
    },
}

/// Reads terminal events on a separate thread and forwards them to the app.
pub struct EventHandler {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventHandler {
    /// Spawns the input thread.
    pub fn spawn(tx: Sender<Event>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("kubetop-input".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    if !event::poll(INPUT_POLL).unwrap_or(false) {
                        continue;
                    }
                    let event = match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                            Event::Key(key)
                        }
                        Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                        Ok(_) => continue,
                        Err(e) => {
                            debug!("terminal read failed: {}", e);
                            break;
                        }
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
