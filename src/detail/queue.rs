//! Bounded FIFO of timeline fetches in front of the [`DetailCache`].
//!
//! [`DetailQueue::request`] is called when a row is expanded. A fresh cache
//! hit is returned immediately; a key that is already queued or in flight is
//! a no-op; anything else joins the queue. At most `limit` fetches run at
//! once, and every completion drains the queue again so it keeps going until
//! it is empty. Completions are announced on a broadcast channel.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::TicketSource;
use crate::error::Result;
use crate::types::ActivityRecord;

use super::cache::DetailCache;

/// Default number of timeline fetches allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 3;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of [`DetailQueue::request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Fresh records, render now
    Cached(Arc<[ActivityRecord]>),
    /// Already queued or in flight; the pending fetch will answer
    AlreadyPending,
    /// Queued; the fetch may already have started
    Enqueued,
    /// The owning view has been torn down
    Closed,
}

/// What a row should show for its tracking identifier right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailStatus {
    Ready(Arc<[ActivityRecord]>),
    Queued,
    Loading,
    /// Never fetched, expired, or the last fetch failed
    Unavailable,
}

/// Broadcast when a fetch finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailEvent {
    Loaded { key: String, count: usize },
    Failed { key: String, message: String },
}

impl DetailEvent {
    pub fn key(&self) -> &str {
        match self {
            DetailEvent::Loaded { key, .. } | DetailEvent::Failed { key, .. } => key,
        }
    }
}

#[derive(Debug)]
struct QueueState {
    cache: DetailCache,
    pending: VecDeque<String>,
    queued: HashSet<String>,
    in_flight: HashSet<String>,
    closed: bool,
}

struct Inner<S> {
    source: Arc<S>,
    limit: usize,
    state: Mutex<QueueState>,
    events: broadcast::Sender<DetailEvent>,
}

/// Cheap-to-clone handle; clones share the same queue and cache.
pub struct DetailQueue<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for DetailQueue<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: TicketSource + 'static> DetailQueue<S> {
    /// Build a queue over an explicitly constructed cache. A zero limit is
    /// treated as one.
    pub fn new(source: Arc<S>, cache: DetailCache, limit: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                source,
                limit: limit.max(1),
                state: Mutex::new(QueueState {
                    cache,
                    pending: VecDeque::new(),
                    queued: HashSet::new(),
                    in_flight: HashSet::new(),
                    closed: false,
                }),
                events,
            }),
        }
    }

    /// Ask for the timeline of `key`. Must be called inside a tokio runtime.
    pub fn request(&self, key: &str) -> RequestOutcome {
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                return RequestOutcome::Closed;
            }
            if let Some(records) = state.cache.get(key, Instant::now()) {
                return RequestOutcome::Cached(records);
            }
            if state.queued.contains(key) || state.in_flight.contains(key) {
                return RequestOutcome::AlreadyPending;
            }
            state.pending.push_back(key.to_string());
            state.queued.insert(key.to_string());
        }
        self.drain();
        RequestOutcome::Enqueued
    }

    pub fn status(&self, key: &str) -> DetailStatus {
        let state = self.inner.state.lock();
        if let Some(records) = state.cache.get(key, Instant::now()) {
            DetailStatus::Ready(records)
        } else if state.in_flight.contains(key) {
            DetailStatus::Loading
        } else if state.queued.contains(key) {
            DetailStatus::Queued
        } else {
            DetailStatus::Unavailable
        }
    }

    /// Expiry of the cached timeline for `key`, fresh or stale; `None` if
    /// nothing was ever cached for it.
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        self.inner.state.lock().cache.expires_at(key)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DetailEvent> {
        self.inner.events.subscribe()
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }

    pub fn queued_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.inner.state.lock().in_flight.contains(key)
    }

    /// Drop expired cache entries; see [`DetailCache::purge_expired`].
    pub fn purge_expired(&self) -> usize {
        self.inner.state.lock().cache.purge_expired(Instant::now())
    }

    pub fn cached_len(&self) -> usize {
        self.inner.state.lock().cache.len()
    }

    /// Tear down: drop queued keys and cached entries, and ignore results of
    /// fetches still in flight. Later requests return [`RequestOutcome::Closed`].
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        state.pending.clear();
        state.queued.clear();
        state.cache.clear();
    }

    /// Start queued fetches while there are free slots.
    fn drain(&self) {
        let started: Vec<String> = {
            let mut state = self.inner.state.lock();
            let mut started = Vec::new();
            while !state.closed && state.in_flight.len() < self.inner.limit {
                let Some(key) = state.pending.pop_front() else {
                    break;
                };
                state.queued.remove(&key);
                state.in_flight.insert(key.clone());
                started.push(key);
            }
            started
        };

        for key in started {
            let queue = self.clone();
            tokio::spawn(async move {
                debug!(gr_no = %key, "fetching timeline");
                let result = queue.inner.source.fetch_activity(&key).await;
                queue.complete(key, result);
            });
        }
    }

    fn complete(&self, key: String, result: Result<Vec<ActivityRecord>>) {
        let event = {
            let mut state = self.inner.state.lock();
            state.in_flight.remove(&key);
            if state.closed {
                debug!(gr_no = %key, "discarding timeline for closed view");
                return;
            }
            match result {
                Ok(records) => {
                    let count = records.len();
                    state.cache.insert(key.clone(), records, Instant::now());
                    debug!(gr_no = %key, count, "timeline cached");
                    DetailEvent::Loaded { key, count }
                }
                Err(e) => {
                    warn!(gr_no = %key, error = %e, "timeline fetch failed");
                    DetailEvent::Failed {
                        key,
                        message: e.to_string(),
                    }
                }
            }
        };

        self.drain();
        // No receivers is fine: the view may not be listening yet
        let _ = self.inner.events.send(event);
    }
}
