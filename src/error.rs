//! Error types.

use std::io;

use thiserror::Error;

/// Failure while retrieving metrics or a manifest.
///
/// `Clone` so it can ride inside refresh events on the UI channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Client configuration could not be loaded or the client built.
    #[error("cannot connect to cluster: {0}")]
    Connect(String),
    /// The API server rejected or failed a request.
    #[error("failed to get {what}: {message}")]
    Api { what: String, message: String },
    /// A fetched object could not be rendered as YAML.
    #[error("failed to render manifest: {0}")]
    Render(String),
    /// A background worker could not be started.
    #[error("failed to start worker: {0}")]
    Worker(String),
    /// A resource quantity string was malformed.
    #[error("invalid quantity '{0}'")]
    Quantity(String),
    /// Failure reported by a mock source.
    #[error("{0}")]
    Mock(String),
}

/// Invalid startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("unknown color '{value}' for theme.{slot}")]
    Color { slot: &'static str, value: String },
    #[error("refresh interval must be at least one second")]
    Interval,
}

/// Top-level error returned by the binary entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
