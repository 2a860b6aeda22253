//! Dual CPU / memory line graphs for the current entity.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use crate::series::RollingSeries;

use super::style::{Palette, Styles};

/// Vertical axis range shared by the limit and usage lines of one plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl Bounds {
    /// Min/max over both dimensions of `series`. Empty series and flat lines
    /// get a non-zero span so the axis never collapses.
    pub fn of(series: &RollingSeries) -> Self {
        let mut values = series.iter().flat_map(|p| [p.limit, p.usage]);
        let Some(first) = values.next() else {
            return Self::default();
        };
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if max - min < 1.0 {
            Self { min, max: min + 1.0 }
        } else {
            Self { min, max }
        }
    }
}

/// Splits `width` between the two plots. The odd column goes to the left
/// plot so the pair always fills the row.
pub fn split_width(width: u16) -> (u16, u16) {
    let half = width / 2;
    (half + width % 2, half)
}

#[derive(Debug, Default)]
struct Plot {
    usage: Vec<(f64, f64)>,
    limit: Vec<(f64, f64)>,
    bounds: Bounds,
    has_limit: bool,
}

impl Plot {
    fn from_series(series: &RollingSeries) -> Self {
        Self {
            usage: series
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.usage))
                .collect(),
            limit: series
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.limit))
                .collect(),
            bounds: Bounds::of(series),
            has_limit: series.iter().any(|p| p.limit > 0.0),
        }
    }

    fn x_max(&self) -> f64 {
        (self.usage.len().saturating_sub(1)).max(1) as f64
    }
}

/// Which metric a plot shows.
#[derive(Debug, Clone, Copy)]
enum Metric {
    Cpu,
    Mem,
}

impl Metric {
    fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Mem => "MEM",
        }
    }

    fn unit(self, v: f64) -> String {
        match self {
            Metric::Cpu => format!("{:.0}m", v),
            Metric::Mem => format!("{:.0}Mi", v),
        }
    }
}

/// Graphs for the currently selected entity.
#[derive(Debug, Default)]
pub struct GraphPane {
    name: String,
    cpu: Plot,
    mem: Plot,
    widths: (u16, u16),
    height: u16,
}

impl GraphPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both plots with the series of `name`.
    pub fn update(&mut self, name: &str, cpu: &RollingSeries, mem: &RollingSeries) {
        self.name = name.to_string();
        self.cpu = Plot::from_series(cpu);
        self.mem = Plot::from_series(mem);
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.widths = split_width(width);
        self.height = height;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cpu_bounds(&self) -> Bounds {
        self.cpu.bounds
    }

    pub fn mem_bounds(&self) -> Bounds {
        self.mem.bounds
    }

    /// Number of points in the CPU and memory plots.
    pub fn point_counts(&self) -> (usize, usize) {
        (self.cpu.usage.len(), self.mem.usage.len())
    }

    /// Caption for one plot, e.g. `CPU - web-1`.
    fn caption(&self, metric: Metric, plot: &Plot) -> String {
        let mut caption = format!(" {} - {} ", metric.label(), self.name);
        if !plot.has_limit && !plot.usage.is_empty() {
            caption.push_str("(no limit) ");
        }
        caption
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let (left, right) = if self.widths.0 + self.widths.1 == area.width {
            self.widths
        } else {
            split_width(area.width)
        };
        let chunks =
            Layout::horizontal([Constraint::Length(left), Constraint::Length(right)]).split(area);

        self.render_plot(
            frame,
            chunks[0],
            palette,
            Metric::Cpu,
            &self.cpu,
            (palette.cpu_limit, palette.cpu_usage),
        );
        self.render_plot(
            frame,
            chunks[1],
            palette,
            Metric::Mem,
            &self.mem,
            (palette.mem_limit, palette.mem_usage),
        );
    }

    fn render_plot(
        &self,
        frame: &mut Frame,
        area: Rect,
        palette: &Palette,
        metric: Metric,
        plot: &Plot,
        colors: (ratatui::style::Color, ratatui::style::Color),
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(palette.border())
            .title(Span::styled(
                self.caption(metric, plot),
                palette.labels().add_modifier(Modifier::BOLD),
            ));

        if self.name.is_empty() || plot.usage.is_empty() {
            let msg = Paragraph::new(Span::styled("no data", Styles::dim())).block(block);
            frame.render_widget(msg, area);
            return;
        }

        let mut datasets = Vec::with_capacity(2);
        if plot.has_limit {
            datasets.push(
                Dataset::default()
                    .name("limit")
                    .marker(symbols::Marker::Braille)
                    .style(Style::default().fg(colors.0))
                    .graph_type(GraphType::Line)
                    .data(&plot.limit),
            );
        }
        datasets.push(
            Dataset::default()
                .name("usage")
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(colors.1))
                .graph_type(GraphType::Line)
                .data(&plot.usage),
        );

        let Bounds { min, max } = plot.bounds;
        let y_labels = vec![
            Span::styled(metric.unit(min), palette.labels()),
            Span::styled(metric.unit((min + max) / 2.0), palette.labels()),
            Span::styled(metric.unit(max), palette.labels()),
        ];

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .style(palette.axis())
                    .bounds([0.0, plot.x_max()]),
            )
            .y_axis(
                Axis::default()
                    .style(palette.axis())
                    .bounds([min, max])
                    .labels(y_labels),
            );
        frame.render_widget(chart, area);
    }
}
