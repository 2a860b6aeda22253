//! Entity list pane: formatted rows, cursor, paging, horizontal scroll.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::{EntityDetails, MetricRecord, ResourceKind};

use super::navigable::{CursorMove, Navigable};
use super::style::{Palette, Styles};

const POD_HEADERS: [&str; 11] = [
    "NAMESPACE",
    "NAME",
    "READY",
    "STATUS",
    "NODE",
    "CPU USAGE",
    "CPU LIMIT",
    "MEM USAGE",
    "MEM LIMIT",
    "RESTARTS",
    "AGE",
];

const NODE_HEADERS: [&str; 7] = [
    "NAME",
    "CPU USAGE",
    "CPU AVAILABLE",
    "CPU%",
    "MEM USAGE",
    "MEM AVAILABLE",
    "MEM%",
];

const COLUMN_GAP: usize = 3;
const HSCROLL_STEP: usize = 8;

fn millicores(v: u64) -> String {
    format!("{}m", v)
}

fn mebibytes(v: u64) -> String {
    format!("{}Mi", v)
}

fn limit_or_dash(v: u64, fmt: fn(u64) -> String) -> String {
    if v == 0 { "-".to_string() } else { fmt(v) }
}

fn percent_or_dash(p: Option<f64>) -> String {
    match p {
        Some(p) => format!("{:.0}%", p),
        None => "-".to_string(),
    }
}

fn cells(record: &MetricRecord) -> Vec<String> {
    match &record.details {
        EntityDetails::Pod(pod) => vec![
            pod.namespace.clone(),
            record.name.clone(),
            format!("{}/{}", pod.ready, pod.total),
            pod.status.clone(),
            pod.node.clone(),
            millicores(record.cpu_usage),
            limit_or_dash(record.cpu_limit, millicores),
            mebibytes(record.mem_usage),
            limit_or_dash(record.mem_limit, mebibytes),
            pod.restarts.to_string(),
            pod.age.clone(),
        ],
        EntityDetails::Node => vec![
            record.name.clone(),
            millicores(record.cpu_usage),
            limit_or_dash(record.cpu_limit, millicores),
            percent_or_dash(record.cpu_percent()),
            mebibytes(record.mem_usage),
            limit_or_dash(record.mem_limit, mebibytes),
            percent_or_dash(record.mem_percent()),
        ],
    }
}

/// Formats the header and one row per record with aligned columns.
///
/// Deterministic for a given record slice and kind.
pub fn format_rows(records: &[MetricRecord], kind: ResourceKind) -> (String, Vec<String>) {
    let headers: &[&str] = match kind {
        ResourceKind::Pod => &POD_HEADERS,
        ResourceKind::Node => &NODE_HEADERS,
    };
    let table: Vec<Vec<String>> = records.iter().map(cells).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &table {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header = join_cells(headers.iter().copied(), &widths);
    let rows = table
        .iter()
        .map(|row| join_cells(row.iter().map(String::as_str), &widths))
        .collect();
    (header, rows)
}

fn join_cells<'a>(cols: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, (cell, width)) in cols.zip(widths).enumerate() {
        line.push_str(cell);
        if i + 1 < widths.len() {
            let pad = width - cell.chars().count() + COLUMN_GAP;
            line.extend(std::iter::repeat_n(' ', pad));
        }
    }
    line
}

/// Tabular view of the latest snapshot.
#[derive(Debug)]
pub struct ListPane {
    kind: ResourceKind,
    header: String,
    rows: Vec<String>,
    /// Entity key per row, parallel to `rows`.
    keys: Vec<String>,
    cursor: usize,
    /// Horizontal scroll in columns.
    offset: usize,
    /// Visible data rows.
    height: usize,
    empty_message: String,
}

impl ListPane {
    pub fn new(kind: ResourceKind, empty_message: String) -> Self {
        let (header, _) = format_rows(&[], kind);
        Self {
            kind,
            header,
            rows: Vec::new(),
            keys: Vec::new(),
            cursor: 0,
            offset: 0,
            height: 1,
            empty_message,
        }
    }

    /// Replaces the displayed rows. The cursor is kept in bounds; callers
    /// position it on the resolved selection with [`ListPane::select_key`].
    pub fn set_data(&mut self, records: &[MetricRecord], kind: ResourceKind) {
        let (header, rows) = format_rows(records, kind);
        self.kind = kind;
        self.header = header;
        self.rows = rows;
        self.keys = records.iter().map(MetricRecord::key).collect();
        self.cursor = self.cursor.min(self.max_position());
    }

    /// Moves the cursor onto the row for `key`, if present.
    pub fn select_key(&mut self, key: &str) {
        if let Some(idx) = self.keys.iter().position(|k| k == key) {
            self.cursor = idx;
        }
    }

    /// Handles navigation and horizontal scroll keys. Returns true when the
    /// cursor moved to another row.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.offset = self.offset.saturating_sub(HSCROLL_STEP);
                false
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let widest = self.header.chars().count();
                self.offset = (self.offset + HSCROLL_STEP).min(widest.saturating_sub(1));
                false
            }
            _ => match CursorMove::from_key(key) {
                Some(mv) => self.apply(mv),
                None => false,
            },
        }
    }

    /// Key of the entity under the cursor.
    pub fn current_row_key(&self) -> Option<&str> {
        self.keys.get(self.cursor).map(String::as_str)
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// `(current page, total pages)`, both 1-based.
    pub fn page(&self) -> (usize, usize) {
        let total = self.rows.len().div_ceil(self.height).max(1);
        (self.cursor / self.height + 1, total)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette, focused: bool, scope: &str) {
        let (page, pages) = self.page();
        let title = if pages > 1 {
            format!(" {} ({}) [{}/{}] ", self.kind.title(), scope, page, pages)
        } else {
            format!(" {} ({}) ", self.kind.title(), scope)
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if focused {
                palette.focused_border()
            } else {
                palette.border()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.rows.is_empty() {
            let msg = Paragraph::new(Line::from(Span::styled(
                self.empty_message.clone(),
                Styles::dim(),
            )));
            frame.render_widget(msg, inner);
            return;
        }

        let clip = |s: &str| -> String {
            s.chars()
                .skip(self.offset)
                .take(inner.width as usize)
                .collect()
        };
        let start = (self.cursor / self.height) * self.height;
        let mut lines = Vec::with_capacity(self.height + 1);
        lines.push(Line::from(Span::styled(
            clip(&self.header),
            palette.table_header(),
        )));
        for (idx, row) in self.rows.iter().enumerate().skip(start).take(self.height) {
            let style = if idx == self.cursor {
                palette.selected()
            } else {
                palette.labels()
            };
            lines.push(Line::from(Span::styled(clip(row), style)));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Navigable for ListPane {
    fn position(&self) -> usize {
        self.cursor
    }

    fn position_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }

    fn max_position(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    fn page_size(&self) -> usize {
        self.height
    }
}
