use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FetchError;
use crate::logic::FailurePolicy;
use crate::sources::{ImageData, ImageSource, MovieGateway};
use crate::state::{Movie, Snapshot};

mod channels;
mod engine;
mod handlers;
mod publisher;
mod workers;

use channels::Channels;
pub use publisher::{MovieList, Subscription};
use publisher::{ResultPublisher, Subscribers};
use workers::coordinator::spawn_coordinator;

/// Default quiet period before a typed search is released.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
/// Default number of buffered emissions per subscriber.
pub const DEFAULT_PUBLISH_CAPACITY: usize = 64;

/// Engine tuning consumed by [`MovieFeed::spawn`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    /// Quiet period applied to search text.
    pub debounce: Duration,
    /// Handling of failed page fetches.
    pub failure_policy: FailurePolicy,
    /// Emissions buffered per subscriber before it starts skipping.
    pub publish_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            failure_policy: FailurePolicy::default(),
            publish_capacity: DEFAULT_PUBLISH_CAPACITY,
        }
    }
}

/// Handle to a running feed engine.
///
/// What: Turns search text and "load more" signals into ordered `movies` and
/// `is_loading` emissions.
///
/// Details:
/// - The default upcoming listing loads once the first debounce interval
///   elapses, unless search text arrives first.
/// - Dropping the handle (or calling [`MovieFeed::shutdown`]) stops the engine;
///   subscriptions then end with `None`.
pub struct MovieFeed<G> {
    gateway: Arc<G>,
    search_tx: mpsc::UnboundedSender<String>,
    more_tx: mpsc::UnboundedSender<()>,
    subscribers: Subscribers,
    task: JoinHandle<()>,
}

impl<G: MovieGateway> MovieFeed<G> {
    /// What: Start the engine on the current tokio runtime.
    ///
    /// Inputs:
    /// - `gateway`: Page source shared with the caller
    /// - `config`: Debounce, failure policy and stream capacity
    ///
    /// Output:
    /// - Handle used to drive the engine and subscribe to its results
    #[must_use]
    pub fn spawn(gateway: Arc<G>, config: &FeedConfig) -> Self {
        let channels = Channels::new();
        let search_tx = channels.search_tx.clone();
        let more_tx = channels.more_tx.clone();
        let (publisher, subscribers) = ResultPublisher::new(config.publish_capacity);
        tracing::info!(
            debounce_ms = u64::try_from(config.debounce.as_millis()).unwrap_or(u64::MAX),
            policy = config.failure_policy.as_config_key(),
            "[Feed] engine started"
        );
        let task = spawn_coordinator(Arc::clone(&gateway), config, channels, publisher);
        Self {
            gateway,
            search_tx,
            more_tx,
            subscribers,
            task,
        }
    }

    /// What: Feed one raw search text value (typically every keystroke).
    ///
    /// Details:
    /// - Empty text selects the default upcoming listing.
    pub fn set_search_text(&self, text: impl Into<String>) {
        if self.search_tx.send(text.into()).is_err() {
            tracing::debug!("[Feed] search text after shutdown; ignored");
        }
    }

    /// What: Ask for the next page of the active query.
    ///
    /// Details:
    /// - Dropped while a page is in flight, once the listing is exhausted, and
    ///   before the first query has been released.
    pub fn request_page(&self) {
        if self.more_tx.send(()).is_err() {
            tracing::debug!("[Feed] page request after shutdown; ignored");
        }
    }

    /// Subscribe to `movies`, starting from the current list once one was published.
    #[must_use]
    pub fn movies(&self) -> Subscription<MovieList> {
        self.subscribers.movies()
    }

    /// Subscribe to `is_loading`, starting from the current flag once one was published.
    #[must_use]
    pub fn loading(&self) -> Subscription<bool> {
        self.subscribers.loading()
    }

    /// Latest published state of the active run.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.subscribers.snapshot()
    }

    /// Gateway the engine fetches from.
    #[must_use]
    pub const fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// What: Stop the engine and wait for the coordinator to finish.
    ///
    /// Details:
    /// - Fetches still in flight complete in the background; their outcomes are dropped.
    pub async fn shutdown(self) {
        let Self {
            search_tx,
            more_tx,
            task,
            ..
        } = self;
        drop(search_tx);
        drop(more_tx);
        if let Err(err) = task.await {
            tracing::warn!(error = %err, "[Feed] coordinator ended abnormally");
        }
    }
}

impl<G: MovieGateway + ImageSource> MovieFeed<G> {
    /// What: Fetch the thumbnail of `movie` at `width` pixels.
    ///
    /// Output:
    /// - Image bytes, or `FetchError::MissingResource` when the movie has no image path
    ///
    /// # Errors
    /// - Transport, status, missing-resource and decode errors from the image source
    pub async fn image(&self, width: u32, movie: &Movie) -> Result<ImageData, FetchError> {
        self.gateway.fetch_image(width, movie).await
    }
}
