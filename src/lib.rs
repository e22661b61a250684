//! Menu engine for serial-attached VT-100 terminals, shared by the binary and its tests.

pub mod action;
pub mod config;
pub mod host;
pub mod interrupt;
pub mod launcher;
pub mod line_editor;
pub mod markup;
pub mod menu;
pub mod menu_file;
pub mod resolver;
pub mod serial;
mod telemetry;
pub mod template;
pub mod terminal;
pub mod viewport;
pub mod wrap;

pub use action::Action;
pub use telemetry::{init_tracing, tracing_log_path};
pub use template::Entry;
pub use terminal::{Terminal, TransportError};
