//! Value types shared across the engine.
//!
//! Kept separate from the runtime so collaborators (gateways, UI layers) can
//! depend on the data model without pulling in the coordinator.

pub mod types;

pub use types::{Genre, Movie, Page, Query, Snapshot};
