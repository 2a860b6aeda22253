//! Help popup listing the key bindings.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::selection::Focus;
use super::style::Styles;

const LIST_KEYS: &[(&str, &str)] = &[
    ("↑/k ↓/j", "Move selection"),
    ("PgUp/PgDn", "Previous / next page (also Shift-Tab / Tab)"),
    ("Home/g End/G", "First / last row"),
    ("←/h →/l", "Scroll columns"),
    ("Enter", "Show manifest of the selected entity"),
];

const DETAIL_KEYS: &[(&str, &str)] = &[
    ("↑/k ↓/j", "Scroll manifest"),
    ("PgUp/PgDn", "Scroll one page"),
    ("Home/g End/G", "Top / bottom"),
    ("Esc/q", "Close manifest"),
];

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("?", "Toggle this help"),
    ("q", "Quit (closes the manifest first when open)"),
    ("Ctrl-C", "Quit"),
];

/// Help text for the pane that currently owns focus.
pub fn help_lines(focus: Focus) -> Vec<Line<'static>> {
    let (title, keys) = match focus {
        Focus::Items => ("List", LIST_KEYS),
        Focus::Detail => ("Manifest", DETAIL_KEYS),
    };
    let mut lines = vec![section(title)];
    lines.extend(keys.iter().map(|(k, d)| binding(k, d)));
    lines.push(Line::default());
    lines.push(section("General"));
    lines.extend(GLOBAL_KEYS.iter().map(|(k, d)| binding(k, d)));
    lines
}

fn section(name: &str) -> Line<'static> {
    Line::from(Span::styled(format!("── {} ──", name), Styles::section_header()))
}

fn binding(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>14}  ", key), Styles::help_key()),
        Span::raw(desc.to_string()),
    ])
}

/// Renders the help popup centered on screen.
pub fn render_help(frame: &mut Frame, area: Rect, focus: Focus) {
    let content = help_lines(focus);

    let popup_width = ((u32::from(area.width) * 60 / 100) as u16)
        .clamp(40, 72)
        .min(area.width);
    let popup_height = (content.len() as u16 + 3).min(area.height);
    let popup_x = area.x + area.width.saturating_sub(popup_width) / 2;
    let popup_y = area.y + area.height.saturating_sub(popup_height) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Help ")
        .title_bottom(Line::from(vec![
            Span::styled(" Press ", Styles::help()),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Styles::help()),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" to close ", Styles::help()),
        ]))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(
        Paragraph::new(content)
            .block(block)
            .style(Style::default().fg(Color::White)),
        popup_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_help_follows_focus() {
        let list = text(&help_lines(Focus::Items));
        let detail = text(&help_lines(Focus::Detail));
        assert!(list.contains("Show manifest"));
        assert!(!detail.contains("Show manifest"));
        assert!(detail.contains("Close manifest"));
        assert!(list.contains("Ctrl-C") && detail.contains("Ctrl-C"));
    }
}
