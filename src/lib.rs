//! kubetop - live resource-usage dashboard for Kubernetes pods and nodes.
//!
//! Provides:
//! - `model`: normalized metric records and resource kinds
//! - `series`: fixed-capacity rolling history per entity
//! - `source`: metrics/manifest retrieval (API server and mock)
//! - `poller`: background refresh loop feeding the UI event channel
//! - `config`: runtime configuration and color theme
//! - `util`: Kubernetes quantity and age helpers
//! - `tui`: interactive terminal UI (ratatui/crossterm)

pub mod config;
pub mod error;
pub mod model;
pub mod poller;
pub mod series;
pub mod source;
pub mod tui;
pub mod util;

pub use error::{ConfigError, Error, FetchError};
