//! Main rendering logic for TUI.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::help::render_help;
use super::selection::Focus;
use super::state::{AppPhase, AppState, PaneLayout};
use super::style::{Palette, Styles};

/// Main render function.
pub fn render(frame: &mut Frame, state: &AppState, palette: &Palette) {
    let area = frame.area();
    let layout = PaneLayout::compute(area, state.detail.has_content());

    render_header(frame, layout.header, state);

    if state.phase == AppPhase::Initializing {
        render_loading(frame, area, state);
        return;
    }

    let focus = state.focus();
    state.graph.render(frame, layout.graphs, palette);
    state
        .list
        .render(frame, layout.list, palette, focus == Focus::Items, &state.scope);
    if let Some(detail_area) = layout.detail {
        state
            .detail
            .render(frame, detail_area, palette, focus == Focus::Detail);
    }
    render_footer(frame, layout.footer, state);

    if state.show_help {
        render_help(frame, area, focus);
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let status = if state.last_error.is_some() {
        Span::styled(" ERROR ", Styles::header().fg(ratatui::style::Color::LightRed))
    } else if state.phase == AppPhase::Ready {
        Span::styled(" LIVE ", Styles::live())
    } else {
        Span::styled(" ... ", Styles::header())
    };
    let refreshed = state
        .last_refresh
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let line = Line::from(vec![
        Span::styled(" kubetop ", Styles::header()),
        Span::styled(format!("| {} ", state.kind.title()), Styles::header()),
        Span::styled(format!("| {} ", state.scope), Styles::header()),
        Span::styled(
            format!("| every {}s ", state.interval.as_secs()),
            Styles::header(),
        ),
        Span::styled("|", Styles::header()),
        status,
        Span::styled(format!("| {} ", refreshed), Styles::header()),
    ]);
    frame.render_widget(Paragraph::new(line).style(Styles::header()), area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(err) = &state.last_error {
        let line = Line::from(vec![
            Span::styled(format!(" error: {}", err), Styles::error()),
            Span::styled(
                format!("  (retrying every {}s)", state.interval.as_secs()),
                Styles::dim(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let hints: &[(&str, &str)] = match state.focus() {
        Focus::Items => &[
            ("↑/↓", " select  "),
            ("PgUp/PgDn", " page  "),
            ("←/→", " scroll  "),
            ("Enter", " manifest  "),
            ("?", " help  "),
            ("q", " quit"),
        ],
        Focus::Detail => &[
            ("↑/↓", " scroll  "),
            ("PgUp/PgDn", " page  "),
            ("Esc/q", " close  "),
            ("?", " help"),
        ],
    };
    let mut spans = vec![Span::raw(" ")];
    for (key, desc) in hints {
        spans.push(Span::styled(*key, Styles::help_key()));
        spans.push(Span::styled(*desc, Styles::help()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_loading(frame: &mut Frame, area: Rect, state: &AppState) {
    let msg = if state.gates.data {
        "Waiting for terminal size..."
    } else {
        "Loading metrics..."
    };
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
    frame.render_widget(
        Paragraph::new(Span::styled(msg, Styles::dim())).alignment(Alignment::Center),
        line_area,
    );
}
