//! Outward projections of the active run.
//!
//! `movies` and `is_loading` are published on two independent broadcast
//! channels. Each stream also keeps its latest emission in a watch channel so
//! new subscribers start from the current value and lagging ones can resync.
//! The latest full [`Snapshot`] is kept for consumers that poll.

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};

use crate::state::{Movie, Snapshot};

/// Movie list as published to observers.
pub type MovieList = Arc<Vec<Movie>>;

/// One emission tagged with its publish sequence number.
#[derive(Clone, Debug)]
struct Stamped<T> {
    seq: u64,
    value: T,
}

/// Broadcast fan-out plus the latest emission of one stream.
#[derive(Debug)]
struct Stream<T> {
    tx: broadcast::Sender<Stamped<T>>,
    latest: watch::Sender<Option<Stamped<T>>>,
}

impl<T: Clone> Stream<T> {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (latest, _) = watch::channel(None);
        Self { tx, latest }
    }

    fn send(&self, seq: u64, value: T) {
        let item = Stamped { seq, value };
        // Latest first: a subscriber that reads it and then receives the same
        // item from the broadcast drops the repeat by sequence number.
        self.latest.send_replace(Some(item.clone()));
        // No subscribers is not an error.
        let _ = self.tx.send(item);
    }

    fn handle(&self) -> StreamHandle<T> {
        StreamHandle {
            tx: self.tx.clone(),
            latest: self.latest.subscribe(),
        }
    }
}

#[derive(Clone, Debug)]
struct StreamHandle<T> {
    tx: broadcast::Sender<Stamped<T>>,
    latest: watch::Receiver<Option<Stamped<T>>>,
}

impl<T: Clone> StreamHandle<T> {
    fn subscribe(&self, name: &'static str, repeats: fn(&T, &T) -> bool) -> Subscription<T> {
        // Subscribe before reading the latest value so nothing published in
        // between is missed.
        let rx = self.tx.subscribe();
        let pending = self.latest.borrow().clone();
        Subscription {
            rx,
            latest: self.latest.clone(),
            pending,
            last: None,
            repeats,
            stream: name,
        }
    }
}

/// Sender side of the result streams, owned by the coordinator.
#[derive(Debug)]
pub struct ResultPublisher {
    movies: Stream<MovieList>,
    loading: Stream<bool>,
    snapshot_tx: watch::Sender<Snapshot>,
    last_loading: bool,
    seq: u64,
}

/// Handles kept by [`super::MovieFeed`] to hand out subscriptions.
#[derive(Clone, Debug)]
pub struct Subscribers {
    movies: StreamHandle<MovieList>,
    loading: StreamHandle<bool>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl ResultPublisher {
    /// What: Create the publisher and the matching subscriber handles.
    ///
    /// Inputs:
    /// - `capacity`: Buffered emissions per subscriber before it lags (at least 1)
    pub fn new(capacity: usize) -> (Self, Subscribers) {
        let capacity = capacity.max(1);
        let movies = Stream::new(capacity);
        let loading = Stream::new(capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let subscribers = Subscribers {
            movies: movies.handle(),
            loading: loading.handle(),
            snapshot_rx,
        };
        (
            Self {
                movies,
                loading,
                snapshot_tx,
                last_loading: false,
                seq: 0,
            },
            subscribers,
        )
    }

    /// What: Emit the movies of `snapshot` and record it as the latest state.
    pub fn publish_movies(&mut self, snapshot: &Snapshot) {
        self.snapshot_tx.send_replace(snapshot.clone());
        self.seq += 1;
        self.movies.send(self.seq, Arc::clone(&snapshot.movies));
    }

    /// What: Emit the loading flag of `snapshot` if it changed and record the state.
    pub fn publish_loading(&mut self, snapshot: &Snapshot) {
        self.snapshot_tx.send_replace(snapshot.clone());
        if snapshot.is_loading != self.last_loading {
            self.last_loading = snapshot.is_loading;
            self.seq += 1;
            self.loading.send(self.seq, snapshot.is_loading);
        }
    }
}

impl Subscribers {
    /// Subscribe to `movies`, starting from the current list if one was published.
    pub fn movies(&self) -> Subscription<MovieList> {
        // Equal lists are separate emissions (a failed page republishes the list).
        self.movies.subscribe("movies", |_, _| false)
    }

    /// Subscribe to `is_loading`, starting from the current flag if one was published.
    pub fn loading(&self) -> Subscription<bool> {
        self.loading.subscribe("loading", |a, b| a == b)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }
}

/// Receiving end of one result stream.
///
/// A new subscription first yields the stream's current value, if any, then
/// every later emission. A subscriber that falls more than the configured
/// capacity behind drops the backlog and resumes from the current value.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: broadcast::Receiver<Stamped<T>>,
    latest: watch::Receiver<Option<Stamped<T>>>,
    pending: Option<Stamped<T>>,
    last: Option<Stamped<T>>,
    repeats: fn(&T, &T) -> bool,
    stream: &'static str,
}

impl<T: Clone> Subscription<T> {
    /// What: Wait for the next emission.
    ///
    /// Output:
    /// - `Some(value)`, or `None` once the engine has shut down
    pub async fn next(&mut self) -> Option<T> {
        if let Some(value) = self.take_pending() {
            return Some(value);
        }
        loop {
            match self.rx.recv().await {
                Ok(item) => {
                    if let Some(value) = self.accept(item) {
                        return Some(value);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(stream = self.stream, skipped, "[Publisher] subscriber lagged");
                    if let Some(value) = self.resync() {
                        return Some(value);
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// What: Take an already delivered emission without waiting.
    ///
    /// Output:
    /// - `Some(value)` when one is buffered, `None` otherwise
    pub fn try_next(&mut self) -> Option<T> {
        if let Some(value) = self.take_pending() {
            return Some(value);
        }
        loop {
            match self.rx.try_recv() {
                Ok(item) => {
                    if let Some(value) = self.accept(item) {
                        return Some(value);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(stream = self.stream, skipped, "[Publisher] subscriber lagged");
                    if let Some(value) = self.resync() {
                        return Some(value);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn take_pending(&mut self) -> Option<T> {
        let item = self.pending.take()?;
        self.accept(item)
    }

    /// What: Drop the backlog and jump to the stream's latest emission.
    fn resync(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        let latest = self.latest.borrow().clone()?;
        self.accept(latest)
    }

    /// What: Record `item` as delivered unless it was already seen or repeats the last value.
    fn accept(&mut self, item: Stamped<T>) -> Option<T> {
        if let Some(last) = &self.last {
            if item.seq <= last.seq {
                return None;
            }
            if (self.repeats)(&last.value, &item.value) {
                self.last = Some(item);
                return None;
            }
        }
        self.last = Some(item.clone());
        Some(item.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Query;

    fn snapshot(len: usize, is_loading: bool) -> Snapshot {
        let movie = Movie {
            id: 1,
            title: "Isle of Dogs".into(),
            poster_path: None,
            backdrop_path: None,
            genre_ids: vec![16],
            release_date: chrono::NaiveDate::from_ymd_opt(2018, 3, 23).expect("valid date"),
        };
        Snapshot {
            generation: 1,
            query: Query::default(),
            fetched_pages: 1,
            movies: Arc::new(vec![movie; len]),
            is_loading,
        }
    }

    #[test]
    /// What: Loading changes are deduplicated while every movies emission goes out.
    ///
    /// Inputs:
    /// - Loading true, true, false; movies published twice with equal content.
    ///
    /// Output:
    /// - Loading stream sees `true, false`; movies stream sees both emissions.
    fn dedups_loading_only() {
        let (mut publisher, subs) = ResultPublisher::new(8);
        let mut loading = subs.loading();
        let mut movies = subs.movies();
        publisher.publish_loading(&snapshot(0, true));
        publisher.publish_loading(&snapshot(0, true));
        publisher.publish_movies(&snapshot(3, false));
        publisher.publish_movies(&snapshot(3, false));
        publisher.publish_loading(&snapshot(3, false));
        assert_eq!(loading.try_next(), Some(true));
        assert_eq!(loading.try_next(), Some(false));
        assert_eq!(loading.try_next(), None);
        assert_eq!(movies.try_next().map(|m| m.len()), Some(3));
        assert_eq!(movies.try_next().map(|m| m.len()), Some(3));
        assert_eq!(subs.snapshot().movies.len(), 3);
        assert!(!subs.snapshot().is_loading);
    }

    #[test]
    /// What: A lagging subscriber drops its backlog and resumes at the newest list.
    fn lagging_subscriber_resyncs_to_latest() {
        let (mut publisher, subs) = ResultPublisher::new(2);
        let mut movies = subs.movies();
        for len in 1..=4 {
            publisher.publish_movies(&snapshot(len, false));
        }
        assert_eq!(movies.try_next().map(|m| m.len()), Some(4));
        assert_eq!(movies.try_next(), None);
        publisher.publish_movies(&snapshot(5, false));
        assert_eq!(movies.try_next().map(|m| m.len()), Some(5));
    }

    #[test]
    /// What: A lagging loading subscriber never sees the same flag twice in a row.
    ///
    /// Inputs:
    /// - `true` read, then `false, true, false, true` published into a capacity of 2.
    ///
    /// Output:
    /// - Nothing further: the current flag is still `true`.
    fn lagging_loading_stays_distinct() {
        let (mut publisher, subs) = ResultPublisher::new(2);
        let mut loading = subs.loading();
        publisher.publish_loading(&snapshot(0, true));
        assert_eq!(loading.try_next(), Some(true));
        for flag in [false, true, false, true] {
            publisher.publish_loading(&snapshot(0, flag));
        }
        assert_eq!(loading.try_next(), None);
        publisher.publish_loading(&snapshot(0, false));
        assert_eq!(loading.try_next(), Some(false));
    }

    #[test]
    /// What: A late subscriber starts from the current value of each stream.
    ///
    /// Inputs:
    /// - Loading raised, 3 movies published, loading lowered; then subscribe.
    ///
    /// Output:
    /// - Movies yields the 3-item list once; loading yields `false` once.
    fn late_subscriber_gets_current_values() {
        let (mut publisher, subs) = ResultPublisher::new(8);
        assert_eq!(subs.movies().try_next(), None);
        publisher.publish_loading(&snapshot(0, true));
        publisher.publish_movies(&snapshot(3, false));
        publisher.publish_loading(&snapshot(3, false));
        let mut movies = subs.movies();
        let mut loading = subs.loading();
        assert_eq!(movies.try_next().map(|m| m.len()), Some(3));
        assert_eq!(movies.try_next(), None);
        assert_eq!(loading.try_next(), Some(false));
        assert_eq!(loading.try_next(), None);
    }

    #[tokio::test]
    /// What: Subscriptions end once the publisher and all handles are gone.
    async fn closes_with_engine() {
        let (publisher, subs) = ResultPublisher::new(4);
        let mut loading = subs.loading();
        drop(subs);
        drop(publisher);
        assert_eq!(loading.next().await, None);
    }
}
