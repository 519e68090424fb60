use crate::app::runtime::publisher::ResultPublisher;
use crate::logic::{FailurePolicy, Paginator};

/// What: Engine state owned by the coordinator task.
///
/// Details:
/// - At most one run is active; it is replaced whenever a distinct query is released.
/// - Generations start at 1 and strictly increase, so a fetch outcome can always be
///   matched against the run that requested it.
#[derive(Debug)]
pub struct FeedState {
    pub run: Option<Paginator>,
    pub next_generation: u64,
    pub policy: FailurePolicy,
    pub publisher: ResultPublisher,
}

impl FeedState {
    /// What: Create an engine state with no active run.
    pub const fn new(policy: FailurePolicy, publisher: ResultPublisher) -> Self {
        Self {
            run: None,
            next_generation: 1,
            policy,
            publisher,
        }
    }

    /// What: Publish the active run's movies, then its loading flag.
    ///
    /// Details:
    /// - The `movies` emission always precedes the `is_loading` change of the same step.
    pub fn publish_resolution(&mut self) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let snapshot = run.snapshot();
        self.publisher.publish_movies(&snapshot);
        self.publisher.publish_loading(&snapshot);
    }

    /// What: Publish only the loading flag of the active run.
    pub fn publish_loading(&mut self) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let snapshot = run.snapshot();
        self.publisher.publish_loading(&snapshot);
    }
}
