//! Manifest pane: wrapped, scrollable text for one entity.

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::model::EntityRef;

use super::navigable::{CursorMove, Navigable};
use super::style::{Palette, Styles};

const TAB_WIDTH: usize = 2;

/// Wraps every line of `text` to `width` display columns and pads it to
/// exactly `width`. A zero width disables wrapping and padding.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.replace('\t', &" ".repeat(TAB_WIDTH));
        if width == 0 {
            out.push(line);
            continue;
        }
        let mut current = String::new();
        let mut used = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && used > 0 {
                out.push(pad(current, used, width));
                current = String::new();
                used = 0;
            }
            current.push(c);
            used += w;
        }
        out.push(pad(current, used, width));
    }
    out
}

fn pad(mut s: String, used: usize, width: usize) -> String {
    if used < width {
        s.extend(std::iter::repeat_n(' ', width - used));
    }
    s
}

/// Detail pane state.
#[derive(Debug, Default)]
pub struct DetailPane {
    /// Unwrapped content, kept to re-wrap on resize.
    raw: String,
    lines: Vec<String>,
    entity: Option<EntityRef>,
    /// Content is a lookup failure rather than a manifest.
    is_error: bool,
    scroll: usize,
    width: usize,
    height: usize,
}

impl DetailPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content and scrolls back to the top.
    pub fn set_content(&mut self, text: &str) {
        self.raw = text.to_string();
        self.lines = wrap_text(text, self.width);
        self.scroll = 0;
        self.is_error = false;
        if text.is_empty() {
            self.entity = None;
        }
    }

    /// Shows the manifest of `entity`.
    pub fn show(&mut self, entity: EntityRef, manifest: &str) {
        self.set_content(manifest);
        self.entity = Some(entity);
    }

    /// Shows a lookup failure as plain text.
    pub fn show_error(&mut self, entity: EntityRef, message: &str) {
        self.set_content(&format!("error: {}", message));
        self.entity = Some(entity);
        self.is_error = true;
    }

    pub fn clear(&mut self) {
        self.set_content("");
    }

    pub fn has_content(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Lines inside the text area at the current scroll position.
    pub fn visible_lines(&self) -> &[String] {
        let start = self.scroll.min(self.lines.len());
        let end = start.saturating_add(self.height).min(self.lines.len());
        &self.lines[start..end]
    }

    /// Sets the text area size (inside the border) and re-wraps.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.height = height;
        if width != self.width {
            self.width = width;
            self.lines = wrap_text(&self.raw, width);
        }
        self.scroll = self.scroll.min(self.max_position());
    }

    /// Scroll keys; returns true when the view moved.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match CursorMove::from_key(key) {
            Some(mv) => self.apply(mv),
            None => false,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette, focused: bool) {
        let title = match &self.entity {
            Some(e) => match &e.namespace {
                Some(ns) => format!(" {}/{} ({}) ", e.kind, e.name, ns),
                None => format!(" {}/{} ", e.kind, e.name),
            },
            None => " DETAIL ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if focused {
                palette.focused_border()
            } else {
                palette.border()
            });

        let style = if self.is_error {
            Styles::error()
        } else {
            palette.labels()
        };
        let visible: Vec<Line> = self
            .visible_lines()
            .iter()
            .map(|l| Line::styled(l.as_str(), style))
            .collect();
        frame.render_widget(Paragraph::new(visible).block(block), area);
    }
}

impl Navigable for DetailPane {
    fn position(&self) -> usize {
        self.scroll
    }

    fn position_mut(&mut self) -> &mut usize {
        &mut self.scroll
    }

    fn max_position(&self) -> usize {
        self.lines.len().saturating_sub(self.height.max(1))
    }

    fn page_size(&self) -> usize {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceKind;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn pod(name: &str) -> EntityRef {
        EntityRef {
            kind: ResourceKind::Pod,
            name: name.to_string(),
            namespace: Some("default".to_string()),
        }
    }

    #[test]
    fn test_wrap_pads_to_width() {
        assert_eq!(
            wrap_text("kind: Pod\nname: a", 12),
            vec!["kind: Pod   ".to_string(), "name: a     ".to_string()]
        );
    }

    #[test]
    fn test_wrap_splits_long_lines() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij  "]);
    }

    #[test]
    fn test_wrap_counts_wide_chars() {
        let lines = wrap_text("日本語", 4);
        assert_eq!(lines, vec!["日本", "語  "]);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut pane = DetailPane::new();
        pane.set_size(20, 5);
        pane.show(pod("a"), "kind: Pod");
        pane.set_content("");
        let once = (pane.lines().to_vec(), pane.scroll(), pane.entity().cloned());
        pane.set_content("");
        let twice = (pane.lines().to_vec(), pane.scroll(), pane.entity().cloned());
        assert_eq!(once, twice);
        assert!(!pane.has_content());
    }

    #[test]
    fn test_scroll_clamps_and_resets() {
        let mut pane = DetailPane::new();
        pane.set_size(10, 3);
        let text: Vec<String> = (0..10).map(|i| format!("line {}", i)).collect();
        pane.show(pod("a"), &text.join("\n"));
        pane.handle_key(&key(KeyCode::End));
        assert_eq!(pane.scroll(), 7);
        assert!(!pane.handle_key(&key(KeyCode::Down)));
        pane.set_content("short");
        assert_eq!(pane.scroll(), 0);
    }

    #[test]
    fn test_visible_window_matches_text_area() {
        let mut pane = DetailPane::new();
        pane.set_size(10, 3);
        let text: Vec<String> = (0..10).map(|i| format!("line {}", i)).collect();
        pane.set_content(&text.join("\n"));
        assert_eq!(pane.visible_lines(), &pane.lines()[0..3]);
        pane.handle_key(&key(KeyCode::End));
        let visible: Vec<&str> = pane.visible_lines().iter().map(|l| l.trim_end()).collect();
        assert_eq!(visible, ["line 7", "line 8", "line 9"]);
        pane.clear();
        assert!(pane.visible_lines().is_empty());
    }

    #[test]
    fn test_error_is_shown_as_text() {
        let mut pane = DetailPane::new();
        pane.set_size(40, 5);
        pane.show_error(pod("a"), "forbidden");
        assert!(pane.is_error());
        assert!(pane.lines()[0].starts_with("error: forbidden"));
        pane.clear();
        assert!(!pane.is_error());
    }

    #[test]
    fn test_resize_rewraps() {
        let mut pane = DetailPane::new();
        pane.set_size(4, 10);
        pane.set_content("abcdefgh");
        assert_eq!(pane.lines().len(), 2);
        pane.set_size(8, 10);
        assert_eq!(pane.lines(), ["abcdefgh".to_string()]);
    }
}
