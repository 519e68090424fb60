use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::app::runtime::channels::{Completion, FetchOutcome};
use crate::logic::PageRequest;
use crate::sources::MovieGateway;

/// What: Spawn a task performing one page fetch.
///
/// Inputs:
/// - `gateway`: Shared gateway
/// - `request`: Tagged page request issued by the active run
/// - `outcome_tx`: Channel back to the coordinator
///
/// Details:
/// - A panic inside the gateway future is caught and reported as
///   [`Completion::Panicked`] instead of silently killing the task.
/// - The task is never aborted; a superseded run's outcome is dropped by the coordinator.
pub fn spawn_fetch<G: MovieGateway>(
    gateway: Arc<G>,
    request: PageRequest,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
) {
    tokio::spawn(async move {
        let PageRequest {
            generation,
            query,
            page,
        } = request;
        tracing::debug!(generation, page, query = %query, "[Fetch] requesting page");
        let fetch = gateway.fetch_page(&query, page);
        let completion = match AssertUnwindSafe(fetch).catch_unwind().await {
            Ok(result) => Completion::Finished(result),
            Err(payload) => Completion::Panicked(panic_message(payload.as_ref())),
        };
        // Coordinator gone means the engine shut down.
        let _ = outcome_tx.send(FetchOutcome {
            generation,
            page,
            completion,
        });
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
