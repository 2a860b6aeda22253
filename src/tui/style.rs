//! Color palette and styles.
//!
//! The palette is resolved once from the theme file and passed to every
//! render function; nothing here is global.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;
use crate::error::ConfigError;

/// Resolved colors for the configurable theme slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub selected: Color,
    pub cpu_limit: Color,
    pub cpu_usage: Color,
    pub mem_limit: Color,
    pub mem_usage: Color,
    pub axis: Color,
    pub labels: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            selected: Color::LightMagenta,
            cpu_limit: Color::Red,
            cpu_usage: Color::Cyan,
            mem_limit: Color::Red,
            mem_usage: Color::Cyan,
            axis: Color::DarkGray,
            labels: Color::Gray,
        }
    }
}

impl Palette {
    /// Resolves every theme slot, rejecting unknown color names.
    pub fn from_theme(theme: &Theme) -> Result<Self, ConfigError> {
        Ok(Self {
            selected: parse_color("selected", &theme.selected)?,
            cpu_limit: parse_color("cpu_limit", &theme.cpu_limit)?,
            cpu_usage: parse_color("cpu_usage", &theme.cpu_usage)?,
            mem_limit: parse_color("mem_limit", &theme.mem_limit)?,
            mem_usage: parse_color("mem_usage", &theme.mem_usage)?,
            axis: parse_color("axis", &theme.axis)?,
            labels: parse_color("labels", &theme.labels)?,
        })
    }

    /// Selected list row.
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.selected)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    /// Border of the pane that owns keyboard focus.
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.selected)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.axis)
    }

    pub fn axis(&self) -> Style {
        Style::default().fg(self.axis)
    }

    pub fn labels(&self) -> Style {
        Style::default().fg(self.labels)
    }

    /// Table header row.
    pub fn table_header(&self) -> Style {
        Style::default()
            .fg(self.labels)
            .add_modifier(Modifier::BOLD)
    }
}

fn parse_color(slot: &'static str, value: &str) -> Result<Color, ConfigError> {
    Color::from_str(value.trim()).map_err(|_| ConfigError::Color {
        slot,
        value: value.to_string(),
    })
}

/// Fixed styles that are not part of the theme.
pub struct Styles;

impl Styles {
    /// Header bar style.
    pub fn header() -> Style {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    }

    pub fn live() -> Style {
        Style::default()
            .fg(Color::Green)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    }

    /// Dimmed text style.
    pub fn dim() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    /// Help text style.
    pub fn help() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    /// Help key style (highlighted keys in help line).
    pub fn help_key() -> Style {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    }

    /// Section header style for the help popup.
    pub fn section_header() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }
}
