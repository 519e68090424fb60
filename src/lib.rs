//! Library entry for cinefeed: a reactive query/pagination engine over a
//! TMDB-style movie catalog.
//!
//! [`app::MovieFeed`] is the entry point. It consumes search text and "load
//! more" signals and publishes ordered `movies` and `is_loading` streams, fed
//! by any [`sources::MovieGateway`].

pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod logic;
pub mod sources;
pub mod state;
