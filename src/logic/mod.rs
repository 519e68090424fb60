//! Pure pagination logic split into modular submodules.
//!
//! Nothing here touches the network or spawns tasks; the runtime in
//! [`crate::app`] drives these types from a single coordinator task.

pub mod accumulate;
pub mod debounce;
pub mod paginator;

// Re-export public APIs to keep import paths short (crate::logic::...)
pub use accumulate::{accumulate, has_more_pages};
pub use debounce::Debouncer;
pub use paginator::{FailurePolicy, PageRequest, Paginator, Resolution, RunPhase};
