//! Terminal user interface.
//!
//! Single-threaded event loop over one channel that multiplexes keyboard,
//! resize, refresh and manifest events.

pub mod app;
pub mod detail;
pub mod event;
pub mod graph;
pub mod help;
pub mod input;
pub mod list;
pub mod navigable;
pub mod render;
pub mod selection;
pub mod state;
pub mod style;
pub mod terminal;

pub use app::App;
pub use event::Event;
