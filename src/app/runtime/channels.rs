use tokio::sync::mpsc;

use crate::error::FetchError;
use crate::state::Page;

/// How a spawned page fetch ended.
#[derive(Debug)]
pub enum Completion {
    /// The gateway returned, successfully or not.
    Finished(Result<Page, FetchError>),
    /// The fetch future panicked; the payload message is kept for logging.
    Panicked(String),
}

/// Outcome of one page fetch, tagged with the request it answers.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Generation of the run that issued the request.
    pub generation: u64,
    /// Requested page.
    pub page: u32,
    /// How the fetch ended.
    pub completion: Completion,
}

/// What: Channel definitions for engine communication.
///
/// Details:
/// - Inbound search text and "load more" signals flow from the [`super::MovieFeed`]
///   handle to the coordinator; fetch outcomes flow from fetch tasks back to it.
pub struct Channels {
    pub search_tx: mpsc::UnboundedSender<String>,
    pub search_rx: mpsc::UnboundedReceiver<String>,
    pub more_tx: mpsc::UnboundedSender<()>,
    pub more_rx: mpsc::UnboundedReceiver<()>,
    pub outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    pub outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl Channels {
    /// What: Create all engine channels.
    pub fn new() -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let (more_tx, more_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            search_tx,
            search_rx,
            more_tx,
            more_rx,
            outcome_tx,
            outcome_rx,
        }
    }
}
