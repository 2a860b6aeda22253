//! Pane geometry, recomputed on every resize.

use ratatui::layout::{Constraint, Layout, Rect};

/// Rectangles for every pane of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneLayout {
    pub header: Rect,
    pub graphs: Rect,
    pub list: Rect,
    /// Present only while the detail pane has content.
    pub detail: Option<Rect>,
    pub footer: Rect,
}

impl PaneLayout {
    /// Header and footer take one row each, graphs a third of the rest, and
    /// the body below is split 2:1 between list and detail when the detail
    /// pane is open.
    pub fn compute(area: Rect, detail_open: bool) -> Self {
        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Ratio(1, 3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        let (list, detail) = if detail_open {
            let cols = Layout::horizontal([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
                .split(rows[2]);
            (cols[0], Some(cols[1]))
        } else {
            (rows[2], None)
        };

        Self {
            header: rows[0],
            graphs: rows[1],
            list,
            detail,
            footer: rows[3],
        }
    }
}

/// Terminal size plus the layout derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
    pub layout: PaneLayout,
}

impl Viewport {
    pub fn new(width: u16, height: u16, detail_open: bool) -> Self {
        Self {
            width,
            height,
            layout: PaneLayout::compute(Rect::new(0, 0, width, height), detail_open),
        }
    }

    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Text area of the detail pane as it would be laid out when open.
    pub fn detail_text_size(&self) -> (usize, usize) {
        match PaneLayout::compute(self.area(), true).detail {
            Some(r) => (
                r.width.saturating_sub(2) as usize,
                r.height.saturating_sub(2) as usize,
            ),
            None => (0, 0),
        }
    }

    /// Data rows visible in the list (inside the border, below the header row).
    pub fn list_rows(&self) -> usize {
        self.layout.list.height.saturating_sub(3) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fills_area() {
        let l = PaneLayout::compute(Rect::new(0, 0, 120, 40), false);
        assert_eq!(l.header.height, 1);
        assert_eq!(l.footer.height, 1);
        assert_eq!(l.footer.y, 39);
        assert_eq!(
            l.header.height + l.graphs.height + l.list.height + l.footer.height,
            40
        );
        assert_eq!(l.list.width, 120);
        assert!(l.detail.is_none());
    }

    #[test]
    fn test_detail_takes_a_third_of_the_body() {
        let l = PaneLayout::compute(Rect::new(0, 0, 120, 40), true);
        let detail = l.detail.unwrap();
        assert_eq!(l.list.width + detail.width, 120);
        assert_eq!(detail.width, 40);
        assert_eq!(detail.y, l.list.y);
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let vp = Viewport::new(3, 2, true);
        assert_eq!(vp.list_rows(), 0);
        let _ = vp.detail_text_size();
    }
}
