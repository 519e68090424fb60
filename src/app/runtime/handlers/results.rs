use crate::app::runtime::channels::{Completion, FetchOutcome};
use crate::app::runtime::engine::FeedState;
use crate::logic::Resolution;

/// What: Apply a fetch outcome to the active run and publish the result.
///
/// Inputs:
/// - `feed`: Engine state
/// - `outcome`: Tagged outcome delivered by a fetch task
///
/// Details:
/// - Outcomes whose tag does not match the active run's outstanding request are
///   discarded without publishing anything.
/// - A panicked fetch collapses the run to one empty snapshot; the engine keeps going.
pub fn handle_fetch_outcome(feed: &mut FeedState, outcome: FetchOutcome) {
    let FetchOutcome {
        generation,
        page,
        completion,
    } = outcome;
    let Some(run) = feed.run.as_mut() else {
        tracing::debug!(generation, page, "[Results] outcome without active run; discarded");
        return;
    };
    match completion {
        Completion::Finished(result) => {
            if run.apply(generation, page, result) == Resolution::Stale {
                tracing::debug!(
                    generation,
                    page,
                    active = run.generation(),
                    "[Results] stale page discarded"
                );
                return;
            }
        }
        Completion::Panicked(message) => {
            if !run.expects(generation, page) {
                tracing::debug!(generation, page, "[Results] stale panicked fetch ignored");
                return;
            }
            tracing::warn!(
                generation,
                page,
                query = %run.query(),
                panic = %message,
                "[Results] fetch panicked; publishing an empty list"
            );
            run.collapse();
        }
    }
    feed.publish_resolution();
}
