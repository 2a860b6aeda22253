//! Background refresh loop.
//!
//! The poller owns one thread that calls the fetch function immediately, then
//! once per interval, and hands every result to the UI as
//! [`Event::Refresh`]. Fetches run back to back on the same thread, so at most
//! one is in flight and results arrive in completion order.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::MetricRecord;
use crate::tui::event::Event;

/// Upper bound on how long [`Poller::stop`] waits for the thread to exit.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Handle to the polling thread.
pub struct Poller {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Starts polling. The first fetch happens right away.
    pub fn spawn<F>(interval: Duration, mut fetch: F, events: Sender<Event>) -> std::io::Result<Self>
    where
        F: FnMut() -> Result<Vec<MetricRecord>, FetchError> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("kubetop-poller".to_string())
            .spawn(move || {
                info!("poller started, interval {:?}", interval);
                let mut tick: u64 = 0;
                loop {
                    tick += 1;
                    let started = Instant::now();
                    let result = fetch();
                    match &result {
                        Ok(records) => debug!(
                            "tick {}: {} records in {:?}",
                            tick,
                            records.len(),
                            started.elapsed()
                        ),
                        Err(e) => warn!("tick {}: fetch failed: {}", tick, e),
                    }
                    if events.send(Event::Refresh(result)).is_err() {
                        debug!("event channel closed");
                        break;
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("poller stopped after {} ticks", tick);
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signals the thread to stop and waits a bounded time for it to exit.
    ///
    /// Safe to call more than once. A fetch that is still blocked when the
    /// grace period runs out is left to finish on its own; its result is
    /// dropped because the receiver is gone by then.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        let Some(handle) = self.handle.take() else {
            return;
        };

        let deadline = Instant::now() + STOP_GRACE;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            warn!("poller still busy after {:?}, detaching", STOP_GRACE);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn expect_refresh(rx: &mpsc::Receiver<Event>) -> Result<Vec<MetricRecord>, FetchError> {
        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Event::Refresh(result)) => result,
            other => panic!("expected refresh event, got {:?}", other),
        }
    }

    #[test]
    fn test_first_fetch_is_immediate() {
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        let mut poller = Poller::spawn(
            Duration::from_secs(60),
            || Ok(vec![MetricRecord::node("n1", 1, 2, 3, 4)]),
            tx,
        )
        .unwrap();

        let records = expect_refresh(&rx).unwrap();
        assert_eq!(records.len(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
        poller.stop();
    }

    #[test]
    fn test_keeps_polling_after_error() {
        let (tx, rx) = mpsc::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn(
            Duration::from_millis(10),
            move || {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(FetchError::Mock("down".to_string()))
                } else {
                    Ok(Vec::new())
                }
            },
            tx,
        )
        .unwrap();

        assert!(expect_refresh(&rx).is_err());
        assert!(expect_refresh(&rx).is_ok());
        poller.stop();
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_is_idempotent_and_bounded() {
        let (tx, rx) = mpsc::channel();
        let mut poller = Poller::spawn(Duration::from_secs(3600), || Ok(Vec::new()), tx).unwrap();
        let _ = expect_refresh(&rx);

        let started = Instant::now();
        poller.stop();
        poller.stop();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!poller.is_running());
    }

    #[test]
    fn test_exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let mut poller = Poller::spawn(Duration::from_millis(5), || Ok(Vec::new()), tx).unwrap();
        drop(rx);
        let deadline = Instant::now() + Duration::from_secs(2);
        while poller.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!poller.is_running());
        poller.stop();
    }
}
