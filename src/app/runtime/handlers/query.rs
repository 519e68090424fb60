use crate::app::runtime::engine::FeedState;
use crate::logic::{PageRequest, Paginator};
use crate::state::Query;

/// What: Replace the active run with a fresh one for `query`.
///
/// Inputs:
/// - `feed`: Engine state
/// - `query`: Distinct debounced query
///
/// Output:
/// - The page-1 request of the new run, to be fetched by the caller
///
/// Details:
/// - The previous run is cancelled; its in-flight fetch keeps running and its outcome
///   is discarded on arrival.
/// - Publishes the loading flag of the new run; the movie list itself is published
///   when page 1 resolves.
pub fn handle_query_change(feed: &mut FeedState, query: Query) -> Option<PageRequest> {
    if let Some(old) = feed.run.as_mut() {
        tracing::debug!(
            generation = old.generation(),
            query = %old.query(),
            phase = ?old.phase(),
            "[Switcher] cancelling run"
        );
        old.cancel();
    }
    let generation = feed.next_generation;
    feed.next_generation += 1;
    tracing::info!(generation, query = %query, "[Switcher] starting run");
    let mut run = Paginator::new(generation, query, feed.policy);
    let request = run.start();
    feed.run = Some(run);
    feed.publish_loading();
    request
}

/// What: Handle one "load more" signal.
///
/// Output:
/// - The next page request of the active run, or `None` when the signal is dropped
///   (no run yet, page in flight, run exhausted)
pub fn handle_load_more(feed: &mut FeedState) -> Option<PageRequest> {
    let Some(run) = feed.run.as_mut() else {
        tracing::debug!("[Switcher] load more before any run; dropped");
        return None;
    };
    let request = run.load_more();
    if request.is_none() {
        tracing::debug!(
            generation = run.generation(),
            phase = ?run.phase(),
            "[Switcher] load more dropped"
        );
        return None;
    }
    feed.publish_loading();
    request
}
