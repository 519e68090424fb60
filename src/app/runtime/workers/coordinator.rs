use std::sync::Arc;

use tokio::{
    select,
    time::{Duration, Instant, sleep_until},
};

use crate::app::runtime::FeedConfig;
use crate::app::runtime::channels::Channels;
use crate::app::runtime::engine::FeedState;
use crate::app::runtime::handlers::{handle_fetch_outcome, handle_load_more, handle_query_change};
use crate::app::runtime::publisher::ResultPublisher;
use crate::app::runtime::workers::fetch::spawn_fetch;
use crate::logic::Debouncer;
use crate::sources::MovieGateway;

/// Far-away instant used while no debounce deadline is pending.
const IDLE_WAIT: Duration = Duration::from_secs(86_400);

/// What: Spawn the coordinator owning all run state.
///
/// Inputs:
/// - `gateway`: Shared page gateway
/// - `config`: Debounce interval and failure policy
/// - `channels`: Receivers for search text, load-more signals and fetch outcomes
/// - `publisher`: Outward result streams
///
/// Output:
/// - Join handle of the coordinator task
///
/// Details:
/// - Seeds the debouncer with the empty query so the default listing loads once
///   the first quiet period elapses.
/// - Every transition is applied on this one task, giving a single ordered timeline.
/// - Exits once the search text channel closes (all feed handles dropped).
pub fn spawn_coordinator<G: MovieGateway>(
    gateway: Arc<G>,
    config: &FeedConfig,
    channels: Channels,
    publisher: ResultPublisher,
) -> tokio::task::JoinHandle<()> {
    let Channels {
        search_tx: _,
        mut search_rx,
        more_tx: _,
        mut more_rx,
        outcome_tx,
        mut outcome_rx,
    } = channels;
    let mut feed = FeedState::new(config.failure_policy, publisher);
    let mut debouncer = Debouncer::new(config.debounce);
    debouncer.push(String::new(), Instant::now());
    tokio::spawn(async move {
        loop {
            let deadline = debouncer.deadline();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + IDLE_WAIT);
            select! {
                biased;
                Some(outcome) = outcome_rx.recv() => {
                    handle_fetch_outcome(&mut feed, outcome);
                }
                text = search_rx.recv() => {
                    let Some(text) = text else {
                        break;
                    };
                    debouncer.push(text, Instant::now());
                }
                Some(()) = more_rx.recv() => {
                    if let Some(request) = handle_load_more(&mut feed) {
                        spawn_fetch(Arc::clone(&gateway), request, outcome_tx.clone());
                    }
                }
                () = sleep_until(wake_at), if deadline.is_some() => {
                    let Some(query) = debouncer.poll(Instant::now()) else {
                        continue;
                    };
                    if let Some(request) = handle_query_change(&mut feed, query) {
                        spawn_fetch(Arc::clone(&gateway), request, outcome_tx.clone());
                    }
                }
            }
        }
        tracing::debug!("[Coordinator] inputs closed; stopping");
    })
}
