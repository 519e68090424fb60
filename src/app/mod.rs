//! Feed runtime: the coordinator task, its fetch workers and the public handle.
//!
//! The runtime is split into channels, handlers (state transitions applied on the
//! coordinator) and workers (spawned tasks), mirroring how inputs, transitions and
//! background I/O are kept apart.

/// Coordinator, fetch workers, publisher and the [`MovieFeed`] handle.
mod runtime;

pub use runtime::{
    DEFAULT_DEBOUNCE, DEFAULT_PUBLISH_CAPACITY, FeedConfig, MovieFeed, MovieList, Subscription,
};
