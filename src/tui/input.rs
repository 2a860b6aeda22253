//! Input handling and keybindings.
//!
//! `handle_key` decides what a key means; the app controller carries it out.
//! Navigation keys are routed to exactly one pane, chosen by focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::selection::Focus;

/// Pane that receives a navigation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneTarget {
    List,
    Detail,
}

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// No action, continue.
    None,
    /// Quit the application.
    Quit,
    ToggleHelp,
    /// Close the help popup and drop the key.
    CloseHelp,
    /// Fetch and show the manifest of the current entity.
    OpenDetail,
    /// Clear the detail pane and return focus to the list.
    ClearDetail,
    /// Deliver the key to one pane.
    Route(PaneTarget),
}

/// What the key handler needs to know about the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub focus: Focus,
    pub detail_open: bool,
    pub help_open: bool,
}

/// Maps a key to an action.
///
/// While help is open, `?` and `Esc` only close it; any other key should
/// close it and then be handled normally (see [`closes_help_first`]).
pub fn handle_key(ctx: InputContext, key: &KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    if ctx.help_open && matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
        return KeyAction::CloseHelp;
    }

    match key.code {
        KeyCode::Char('?') => KeyAction::ToggleHelp,
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            if ctx.detail_open {
                KeyAction::ClearDetail
            } else {
                KeyAction::Quit
            }
        }
        KeyCode::Esc => {
            if ctx.detail_open {
                KeyAction::ClearDetail
            } else {
                KeyAction::None
            }
        }
        KeyCode::Enter if ctx.focus == Focus::Items => KeyAction::OpenDetail,
        _ => KeyAction::Route(route(ctx.focus)),
    }
}

/// True when the help popup should close before `key` is processed.
pub fn closes_help_first(ctx: InputContext, key: &KeyEvent) -> bool {
    ctx.help_open && handle_key(ctx, key) != KeyAction::CloseHelp
}

/// Pane that owns navigation keys under `focus`.
pub fn route(focus: Focus) -> PaneTarget {
    match focus {
        Focus::Items => PaneTarget::List,
        Focus::Detail => PaneTarget::Detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctx(focus: Focus, detail_open: bool, help_open: bool) -> InputContext {
        InputContext {
            focus,
            detail_open,
            help_open,
        }
    }

    #[test]
    fn test_navigation_goes_to_exactly_one_pane() {
        let nav = [
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::PageUp,
            KeyCode::PageDown,
            KeyCode::Home,
            KeyCode::End,
            KeyCode::Char('j'),
            KeyCode::Char('k'),
        ];
        for code in nav {
            assert_eq!(
                handle_key(ctx(Focus::Items, false, false), &key(code)),
                KeyAction::Route(PaneTarget::List)
            );
            assert_eq!(
                handle_key(ctx(Focus::Detail, true, false), &key(code)),
                KeyAction::Route(PaneTarget::Detail)
            );
        }
    }

    #[test]
    fn test_q_clears_detail_before_quitting() {
        assert_eq!(
            handle_key(ctx(Focus::Detail, true, false), &key(KeyCode::Char('q'))),
            KeyAction::ClearDetail
        );
        assert_eq!(
            handle_key(ctx(Focus::Items, false, false), &key(KeyCode::Char('q'))),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_esc_clears_only_when_open() {
        assert_eq!(
            handle_key(ctx(Focus::Items, true, false), &key(KeyCode::Esc)),
            KeyAction::ClearDetail
        );
        assert_eq!(
            handle_key(ctx(Focus::Items, false, false), &key(KeyCode::Esc)),
            KeyAction::None
        );
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for c in [
            ctx(Focus::Items, false, false),
            ctx(Focus::Detail, true, false),
            ctx(Focus::Items, false, true),
        ] {
            assert_eq!(handle_key(c, &ctrl_c), KeyAction::Quit);
        }
    }

    #[test]
    fn test_enter_opens_detail_from_list_only() {
        assert_eq!(
            handle_key(ctx(Focus::Items, false, false), &key(KeyCode::Enter)),
            KeyAction::OpenDetail
        );
        assert_eq!(
            handle_key(ctx(Focus::Detail, true, false), &key(KeyCode::Enter)),
            KeyAction::Route(PaneTarget::Detail)
        );
    }

    #[test]
    fn test_help_keys() {
        let open = ctx(Focus::Items, false, true);
        assert_eq!(handle_key(open, &key(KeyCode::Char('?'))), KeyAction::CloseHelp);
        assert_eq!(handle_key(open, &key(KeyCode::Esc)), KeyAction::CloseHelp);
        assert!(closes_help_first(open, &key(KeyCode::Down)));
        assert!(!closes_help_first(open, &key(KeyCode::Esc)));
        assert_eq!(
            handle_key(ctx(Focus::Items, false, false), &key(KeyCode::Char('?'))),
            KeyAction::ToggleHelp
        );
    }
}
