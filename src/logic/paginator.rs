//! Per-query pagination state machine.
//!
//! A [`Paginator`] owns one run: the movies accumulated for a single query,
//! the page counters, and the loading flag. It performs no I/O. It hands out
//! [`PageRequest`]s and is told about their outcomes; the coordinator decides
//! when to fetch and when to publish.

use std::sync::Arc;

use crate::error::FetchError;
use crate::logic::accumulate::{accumulate, has_more_pages};
use crate::state::{Movie, Page, Query, Snapshot};

/// Lifecycle phase of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Created, no page requested yet.
    Idle,
    /// Page `n` is in flight; further "load more" signals are dropped.
    AwaitingPage(u32),
    /// `n` pages applied and more are available.
    Loaded(u32),
    /// No further pages will be requested.
    Exhausted,
    /// Superseded by a newer query.
    Cancelled,
}

/// What to do when a page request fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Publish an unchanged list and stop the run.
    #[default]
    Exhaust,
    /// Publish an unchanged list and let the next "load more" retry the same page.
    RetryOnNextRequest,
}

impl FailurePolicy {
    /// What: Parse a policy from a `settings.conf` value.
    ///
    /// Inputs:
    /// - `value`: Raw configuration value (case-insensitive; `-`/`_` interchangeable)
    ///
    /// Output:
    /// - `Some(policy)` for a known value, `None` otherwise
    #[must_use]
    pub fn from_config_key(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exhaust" | "stop" => Some(Self::Exhaust),
            "retry_on_next_request" | "retry" => Some(Self::RetryOnNextRequest),
            _ => None,
        }
    }

    /// Canonical configuration key for this policy.
    #[must_use]
    pub const fn as_config_key(self) -> &'static str {
        match self {
            Self::Exhaust => "exhaust",
            Self::RetryOnNextRequest => "retry_on_next_request",
        }
    }
}

/// A page fetch the coordinator must perform on behalf of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Generation of the requesting run.
    pub generation: u64,
    /// Query to fetch.
    pub query: Query,
    /// 1-based page number.
    pub page: u32,
}

/// Result of handing a fetch outcome to a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The outcome was applied; the run is now in `phase`.
    Applied {
        /// Number of movies appended by this outcome.
        added: usize,
        /// Phase after the transition.
        phase: RunPhase,
    },
    /// The outcome does not match the outstanding request and was discarded.
    Stale,
}

/// State of one query's pagination run.
#[derive(Debug)]
pub struct Paginator {
    generation: u64,
    query: Query,
    phase: RunPhase,
    fetched_pages: u32,
    declared_total_pages: Option<u32>,
    movies: Arc<Vec<Movie>>,
    is_loading: bool,
    policy: FailurePolicy,
}

impl Paginator {
    /// What: Create an idle run for `query`.
    ///
    /// Inputs:
    /// - `generation`: Run identity; outcomes tagged with another generation are stale
    /// - `query`: Query the run paginates
    /// - `policy`: Failure handling for this run
    #[must_use]
    pub fn new(generation: u64, query: Query, policy: FailurePolicy) -> Self {
        Self {
            generation,
            query,
            phase: RunPhase::Idle,
            fetched_pages: 0,
            declared_total_pages: None,
            movies: Arc::new(Vec::new()),
            is_loading: false,
            policy,
        }
    }

    /// Run identity.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Query the run paginates.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Pages successfully applied so far.
    #[must_use]
    pub const fn fetched_pages(&self) -> u32 {
        self.fetched_pages
    }

    /// Total declared by the server, `None` until the first page lands.
    #[must_use]
    pub const fn declared_total_pages(&self) -> Option<u32> {
        self.declared_total_pages
    }

    /// Whether a page request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Movies accumulated so far.
    #[must_use]
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// What: Request the first page.
    ///
    /// Output:
    /// - `Some(PageRequest)` for page 1 when the run is `Idle`; `None` otherwise
    pub fn start(&mut self) -> Option<PageRequest> {
        if self.phase != RunPhase::Idle {
            return None;
        }
        Some(self.request(1))
    }

    /// What: Handle a "load more" signal.
    ///
    /// Output:
    /// - `Some(PageRequest)` for page n+1 when the run is `Loaded(n)`
    /// - `None` while a page is in flight, after exhaustion, or after cancellation
    ///
    /// Details:
    /// - At most one request is ever outstanding; bursts collapse to the first signal.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        match self.phase {
            RunPhase::Loaded(n) => Some(self.request(n + 1)),
            RunPhase::Idle
            | RunPhase::AwaitingPage(_)
            | RunPhase::Exhausted
            | RunPhase::Cancelled => None,
        }
    }

    fn request(&mut self, page: u32) -> PageRequest {
        self.phase = RunPhase::AwaitingPage(page);
        self.is_loading = true;
        PageRequest {
            generation: self.generation,
            query: self.query.clone(),
            page,
        }
    }

    /// What: Check whether an outcome belongs to the outstanding request.
    #[must_use]
    pub fn expects(&self, generation: u64, page: u32) -> bool {
        generation == self.generation && self.phase == RunPhase::AwaitingPage(page)
    }

    /// What: Apply the outcome of a page request.
    ///
    /// Inputs:
    /// - `generation`, `page`: Tag of the request the outcome belongs to
    /// - `result`: Fetched page or fetch error
    ///
    /// Output:
    /// - `Resolution::Applied` with the new phase, or `Resolution::Stale` when the tag
    ///   does not match the outstanding request (superseded run or duplicate delivery)
    ///
    /// Details:
    /// - Success appends the page, records `fetched_pages = page` and the declared total.
    /// - Failure appends nothing and follows the run's [`FailurePolicy`].
    pub fn apply(
        &mut self,
        generation: u64,
        page: u32,
        result: Result<Page, FetchError>,
    ) -> Resolution {
        if !self.expects(generation, page) {
            return Resolution::Stale;
        }
        self.is_loading = false;
        match result {
            Ok(fetched) => {
                let added = fetched.movies.len();
                self.declared_total_pages = Some(fetched.total_pages);
                let movies = Arc::make_mut(&mut self.movies);
                *movies = accumulate(std::mem::take(movies), fetched);
                self.fetched_pages = page;
                self.phase = if has_more_pages(self.fetched_pages, self.declared_total_pages) {
                    RunPhase::Loaded(page)
                } else {
                    RunPhase::Exhausted
                };
                tracing::debug!(
                    generation,
                    page,
                    added,
                    total = self.movies.len(),
                    phase = ?self.phase,
                    "[Paginator] page applied"
                );
                Resolution::Applied {
                    added,
                    phase: self.phase,
                }
            }
            Err(err) => {
                self.phase = match self.policy {
                    FailurePolicy::Exhaust => RunPhase::Exhausted,
                    FailurePolicy::RetryOnNextRequest => RunPhase::Loaded(self.fetched_pages),
                };
                tracing::warn!(
                    generation,
                    page,
                    query = %self.query,
                    error = %err,
                    policy = self.policy.as_config_key(),
                    "[Paginator] page fetch failed; degrading to an empty page"
                );
                Resolution::Applied {
                    added: 0,
                    phase: self.phase,
                }
            }
        }
    }

    /// What: Collapse the run after its request died without an outcome.
    ///
    /// Details:
    /// - Clears the accumulated movies and exhausts the run so the coordinator can
    ///   publish a single empty snapshot.
    pub fn collapse(&mut self) {
        self.movies = Arc::new(Vec::new());
        self.is_loading = false;
        self.phase = RunPhase::Exhausted;
    }

    /// What: Mark the run as superseded.
    ///
    /// Details:
    /// - Any outcome arriving afterwards resolves to `Resolution::Stale`.
    pub fn cancel(&mut self) {
        self.phase = RunPhase::Cancelled;
        self.is_loading = false;
    }

    /// What: Capture the publishable state of the run.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            query: self.query.clone(),
            fetched_pages: self.fetched_pages,
            movies: Arc::clone(&self.movies),
            is_loading: self.is_loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn page(ids: std::ops::Range<u64>, total_pages: u32) -> Page {
        Page::new(
            ids.map(|id| Movie {
                id,
                title: format!("Movie {id}"),
                poster_path: Some(format!("/{id}.jpg")),
                backdrop_path: None,
                genre_ids: vec![28],
                release_date: NaiveDate::from_ymd_opt(2018, 5, 6).expect("valid date"),
            })
            .collect(),
            total_pages,
        )
    }

    fn running(policy: FailurePolicy) -> Paginator {
        let mut p = Paginator::new(1, Query::default(), policy);
        let req = p.start().expect("first page requested");
        assert_eq!(req.page, 1);
        p
    }

    #[test]
    /// What: Starting a run requests page 1 once and raises the loading flag.
    fn start_requests_first_page_once() {
        let mut p = Paginator::new(7, Query::new("abc"), FailurePolicy::Exhaust);
        assert_eq!(p.phase(), RunPhase::Idle);
        let req = p.start().expect("page 1");
        assert_eq!(
            req,
            PageRequest {
                generation: 7,
                query: Query::new("abc"),
                page: 1
            }
        );
        assert_eq!(p.phase(), RunPhase::AwaitingPage(1));
        assert!(p.is_loading());
        assert!(p.start().is_none());
    }

    #[test]
    /// What: Load-more signals while a page is in flight are dropped.
    fn load_more_is_dropped_while_awaiting() {
        let mut p = running(FailurePolicy::Exhaust);
        assert!(p.load_more().is_none());
        assert!(p.load_more().is_none());
        assert_eq!(p.phase(), RunPhase::AwaitingPage(1));
    }

    #[test]
    /// What: Pages accumulate in order until the declared total is reached.
    ///
    /// Inputs:
    /// - Three pages of 20, 20 and 5 movies with `total_pages = 3`.
    ///
    /// Output:
    /// - Phases `Loaded(1)`, `Loaded(2)`, `Exhausted`; 45 movies; load-more then ignored.
    fn pages_accumulate_until_exhausted() {
        let mut p = running(FailurePolicy::Exhaust);
        assert_eq!(
            p.apply(1, 1, Ok(page(0..20, 3))),
            Resolution::Applied {
                added: 20,
                phase: RunPhase::Loaded(1)
            }
        );
        assert!(!p.is_loading());
        let req = p.load_more().expect("page 2");
        assert_eq!(req.page, 2);
        assert!(p.is_loading());
        p.apply(1, 2, Ok(page(20..40, 3)));
        p.load_more().expect("page 3");
        assert_eq!(
            p.apply(1, 3, Ok(page(40..45, 3))),
            Resolution::Applied {
                added: 5,
                phase: RunPhase::Exhausted
            }
        );
        assert_eq!(p.fetched_pages(), 3);
        assert_eq!(p.declared_total_pages(), Some(3));
        assert_eq!(p.movies().len(), 45);
        let ids: Vec<u64> = p.movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, (0..45).collect::<Vec<_>>());
        assert!(p.load_more().is_none());
    }

    #[test]
    /// What: A single-page listing is exhausted right after page 1.
    fn single_page_listing_exhausts() {
        let mut p = running(FailurePolicy::Exhaust);
        p.apply(1, 1, Ok(page(0..20, 1)));
        assert_eq!(p.phase(), RunPhase::Exhausted);
        assert!(p.load_more().is_none());
    }

    #[test]
    /// What: Outcomes with the wrong generation or page are stale.
    ///
    /// Details:
    /// - Duplicate delivery of an applied page is stale as well.
    fn mismatched_outcomes_are_stale() {
        let mut p = running(FailurePolicy::Exhaust);
        assert_eq!(p.apply(2, 1, Ok(page(0..3, 5))), Resolution::Stale);
        assert_eq!(p.apply(1, 2, Ok(page(0..3, 5))), Resolution::Stale);
        assert!(p.is_loading());
        p.apply(1, 1, Ok(page(0..3, 5)));
        assert_eq!(p.apply(1, 1, Ok(page(0..3, 5))), Resolution::Stale);
        assert_eq!(p.movies().len(), 3);
    }

    #[test]
    /// What: The default policy exhausts the run on failure.
    ///
    /// Output:
    /// - No movies added, loading cleared, further load-more ignored.
    fn failure_exhausts_by_default() {
        let mut p = running(FailurePolicy::default());
        let res = p.apply(1, 1, Err(FetchError::Transport("offline".into())));
        assert_eq!(
            res,
            Resolution::Applied {
                added: 0,
                phase: RunPhase::Exhausted
            }
        );
        assert!(!p.is_loading());
        assert!(p.movies().is_empty());
        assert_eq!(p.fetched_pages(), 0);
        assert!(p.load_more().is_none());
    }

    #[test]
    /// What: The retry policy lets the next load-more re-request the failed page.
    fn failure_with_retry_policy_rerequests_same_page() {
        let mut p = running(FailurePolicy::RetryOnNextRequest);
        p.apply(1, 1, Ok(page(0..20, 4)));
        p.load_more().expect("page 2");
        p.apply(1, 2, Err(FetchError::Decode("truncated".into())));
        assert_eq!(p.phase(), RunPhase::Loaded(1));
        assert_eq!(p.fetched_pages(), 1);
        let retry = p.load_more().expect("retry page 2");
        assert_eq!(retry.page, 2);
    }

    #[test]
    /// What: A cancelled run rejects late outcomes and load-more signals.
    fn cancelled_run_discards_late_results() {
        let mut p = running(FailurePolicy::Exhaust);
        p.cancel();
        assert_eq!(p.phase(), RunPhase::Cancelled);
        assert_eq!(p.apply(1, 1, Ok(page(0..20, 2))), Resolution::Stale);
        assert!(p.movies().is_empty());
        assert!(p.load_more().is_none());
    }

    #[test]
    /// What: Snapshots share the movie list and mirror the counters.
    ///
    /// Details:
    /// - Appending after a snapshot does not mutate the snapshot already handed out.
    fn snapshots_are_copy_on_write() {
        let mut p = running(FailurePolicy::Exhaust);
        p.apply(1, 1, Ok(page(0..2, 2)));
        let first = p.snapshot();
        p.load_more().expect("page 2");
        p.apply(1, 2, Ok(page(2..4, 2)));
        let second = p.snapshot();
        assert_eq!(first.movies.len(), 2);
        assert_eq!(second.movies.len(), 4);
        assert_eq!(second.fetched_pages, 2);
        assert!(!second.is_loading);
    }

    #[test]
    /// What: Collapsing clears movies and exhausts the run.
    fn collapse_publishes_empty_state() {
        let mut p = running(FailurePolicy::Exhaust);
        p.apply(1, 1, Ok(page(0..5, 3)));
        p.load_more().expect("page 2");
        p.collapse();
        let snap = p.snapshot();
        assert!(snap.movies.is_empty());
        assert!(!snap.is_loading);
        assert_eq!(p.phase(), RunPhase::Exhausted);
    }

    #[test]
    /// What: Failure policy configuration keys round-trip.
    fn failure_policy_config_keys() {
        assert_eq!(
            FailurePolicy::from_config_key("Retry-On-Next-Request"),
            Some(FailurePolicy::RetryOnNextRequest)
        );
        assert_eq!(
            FailurePolicy::from_config_key(" exhaust "),
            Some(FailurePolicy::Exhaust)
        );
        assert_eq!(FailurePolicy::from_config_key("backoff"), None);
        for policy in [FailurePolicy::Exhaust, FailurePolicy::RetryOnNextRequest] {
            assert_eq!(
                FailurePolicy::from_config_key(policy.as_config_key()),
                Some(policy)
            );
        }
    }
}
