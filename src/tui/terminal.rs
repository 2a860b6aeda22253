//! RAII terminal lifecycle guard.
//!
//! [`TerminalGuard`] enters raw mode and the alternate screen on construction
//! and restores the terminal on [`Drop`], including early error returns. A
//! panic hook restores the terminal before the panic message is printed.

use std::io::{self, Stdout};
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

/// Set while raw mode is on; checked by the panic hook.
static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Owns the terminal for the lifetime of the UI.
pub struct TerminalGuard {
    terminal: Tui,
    /// Hook that was active before ours; reinstalled on drop.
    prev_hook: Option<Arc<PanicHook>>,
}

impl TerminalGuard {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        RAW_MODE_ACTIVE.store(true, Ordering::SeqCst);
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            restore_terminal_best_effort();
            return Err(e);
        }

        let prev_hook = install_restore_hook();

        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(t) => t,
            Err(e) => {
                restore_terminal_best_effort();
                reinstate_hook(prev_hook);
                return Err(e);
            }
        };
        Ok(Self {
            terminal,
            prev_hook: Some(prev_hook),
        })
    }

    pub fn terminal_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal_best_effort();
        if let Some(prev) = self.prev_hook.take() {
            reinstate_hook(prev);
        }
    }
}

/// Chains a terminal-restoring hook in front of the current one and returns
/// the previous hook.
fn install_restore_hook() -> Arc<PanicHook> {
    let prev: Arc<PanicHook> = Arc::new(panic::take_hook());
    let chained = Arc::clone(&prev);
    panic::set_hook(Box::new(move |info| {
        restore_terminal_best_effort();
        chained(info);
    }));
    prev
}

/// Removes our hook and puts `prev` back.
fn reinstate_hook(prev: Arc<PanicHook>) {
    // Our hook owns the other reference to `prev`.
    drop(panic::take_hook());
    match Arc::try_unwrap(prev) {
        Ok(hook) => panic::set_hook(hook),
        Err(shared) => panic::set_hook(Box::new(move |info| shared(info))),
    }
}

/// Leaves raw mode and the alternate screen. Safe to call repeatedly.
fn restore_terminal_best_effort() {
    if RAW_MODE_ACTIVE.swap(false, Ordering::SeqCst) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_restore_is_idempotent_without_terminal() {
        restore_terminal_best_effort();
        restore_terminal_best_effort();
        assert!(!RAW_MODE_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn test_previous_panic_hook_survives_guard_lifetime() {
        static SEEN: AtomicUsize = AtomicUsize::new(0);
        panic::set_hook(Box::new(|_| {
            SEEN.fetch_add(1, Ordering::SeqCst);
        }));

        let prev = install_restore_hook();
        reinstate_hook(prev);

        let before = SEEN.load(Ordering::SeqCst);
        let result: std::thread::Result<()> = panic::catch_unwind(|| panic!("after restore"));
        assert!(result.is_err());
        assert!(SEEN.load(Ordering::SeqCst) > before);

        // Back to the default hook.
        drop(panic::take_hook());
    }
}
