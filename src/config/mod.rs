//! Settings file discovery and parsing.
//!
//! The engine never reads files or the environment itself; the binary loads
//! [`Settings`] here and hands the derived [`crate::app::FeedConfig`] and
//! [`crate::sources::TmdbConfig`] to the engine and gateway.

pub mod paths;
pub mod settings;

pub use paths::{config_dir, logs_dir, resolve_settings_config_path};
pub use settings::{Settings, load_settings, parse_settings};
