//! Shared cursor/scroll navigation for panes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A navigation request decoded from a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

impl CursorMove {
    /// Maps navigation keys; returns `None` for everything else.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let mv = match key.code {
            KeyCode::Up | KeyCode::Char('k') => CursorMove::Up,
            KeyCode::Down | KeyCode::Char('j') => CursorMove::Down,
            KeyCode::Char('u') if ctrl => CursorMove::PageUp,
            KeyCode::Char('d') if ctrl => CursorMove::PageDown,
            KeyCode::PageUp | KeyCode::BackTab => CursorMove::PageUp,
            KeyCode::PageDown | KeyCode::Tab => CursorMove::PageDown,
            KeyCode::Home | KeyCode::Char('g') => CursorMove::Home,
            KeyCode::End | KeyCode::Char('G') => CursorMove::End,
            _ => return None,
        };
        Some(mv)
    }
}

/// Navigation over a position bounded by `[0, max_position()]`.
///
/// Every move clamps: going past either end stops at that end.
pub trait Navigable {
    fn position(&self) -> usize;
    fn position_mut(&mut self) -> &mut usize;
    /// Largest reachable position (0 when there is nothing to move over).
    fn max_position(&self) -> usize;
    /// Step used by page moves.
    fn page_size(&self) -> usize;

    fn select_up(&mut self) {
        *self.position_mut() = self.position().saturating_sub(1);
    }

    fn select_down(&mut self) {
        *self.position_mut() = self.position().saturating_add(1).min(self.max_position());
    }

    fn page_up(&mut self) {
        *self.position_mut() = self.position().saturating_sub(self.page_size().max(1));
    }

    fn page_down(&mut self) {
        *self.position_mut() = self
            .position()
            .saturating_add(self.page_size().max(1))
            .min(self.max_position());
    }

    fn home(&mut self) {
        *self.position_mut() = 0;
    }

    fn end(&mut self) {
        *self.position_mut() = self.max_position();
    }

    /// Applies `mv`; returns true when the position changed.
    fn apply(&mut self, mv: CursorMove) -> bool {
        let before = self.position();
        match mv {
            CursorMove::Up => self.select_up(),
            CursorMove::Down => self.select_down(),
            CursorMove::PageUp => self.page_up(),
            CursorMove::PageDown => self.page_down(),
            CursorMove::Home => self.home(),
            CursorMove::End => self.end(),
        }
        // Keep a stale position (e.g. after data shrank) inside bounds too.
        let max = self.max_position();
        if self.position() > max {
            *self.position_mut() = max;
        }
        self.position() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cursor {
        pos: usize,
        len: usize,
        page: usize,
    }

    impl Navigable for Cursor {
        fn position(&self) -> usize {
            self.pos
        }
        fn position_mut(&mut self) -> &mut usize {
            &mut self.pos
        }
        fn max_position(&self) -> usize {
            self.len.saturating_sub(1)
        }
        fn page_size(&self) -> usize {
            self.page
        }
    }

    const ALL: [CursorMove; 6] = [
        CursorMove::Up,
        CursorMove::Down,
        CursorMove::PageUp,
        CursorMove::PageDown,
        CursorMove::Home,
        CursorMove::End,
    ];

    #[test]
    fn test_every_move_stays_in_bounds() {
        for len in 0..6 {
            for page in 0..4 {
                let mut c = Cursor { pos: 0, len, page };
                // Deterministic pseudo-random walk over all moves.
                let mut seed = 7usize;
                for _ in 0..200 {
                    seed = seed.wrapping_mul(31).wrapping_add(17) % 1009;
                    c.apply(ALL[seed % ALL.len()]);
                    assert!(c.pos <= len.saturating_sub(1), "len={} pos={}", len, c.pos);
                }
            }
        }
    }

    #[test]
    fn test_single_row_moves_are_noops() {
        let mut c = Cursor {
            pos: 0,
            len: 1,
            page: 10,
        };
        for mv in ALL {
            assert!(!c.apply(mv));
            assert_eq!(c.pos, 0);
        }
    }

    #[test]
    fn test_clamps_instead_of_wrapping() {
        let mut c = Cursor {
            pos: 4,
            len: 5,
            page: 2,
        };
        assert!(!c.apply(CursorMove::Down));
        assert_eq!(c.pos, 4);
        c.apply(CursorMove::Home);
        assert!(!c.apply(CursorMove::Up));
        assert_eq!(c.pos, 0);
        c.apply(CursorMove::PageDown);
        assert_eq!(c.pos, 2);
        c.apply(CursorMove::PageDown);
        c.apply(CursorMove::PageDown);
        assert_eq!(c.pos, 4);
    }

    #[test]
    fn test_key_mapping() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(CursorMove::from_key(&key(KeyCode::Char('j'))), Some(CursorMove::Down));
        assert_eq!(CursorMove::from_key(&key(KeyCode::Tab)), Some(CursorMove::PageDown));
        assert_eq!(CursorMove::from_key(&key(KeyCode::Char('G'))), Some(CursorMove::End));
        assert_eq!(CursorMove::from_key(&key(KeyCode::Char('x'))), None);
        assert_eq!(
            CursorMove::from_key(&KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(CursorMove::PageDown)
        );
    }
}
