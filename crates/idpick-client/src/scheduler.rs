//! Request coalescing and write batching.
//!
//! The [`Scheduler`] turns many independent UI intents into few network
//! exchanges:
//!
//! - **Reads** are keyed by their full query ([`ReadKey`]). Every caller that
//!   asks for a key before the next read tick joins the same pending entry.
//!   On each tick all pending keys are drained and exactly one request is
//!   issued per key; its outcome (success or failure) is fanned out to every
//!   waiter.
//! - **New identifiers** accumulate in an insertion-ordered set and are sent
//!   as one bulk `POST` per (coarser) add-items interval.
//! - **Selection orders** are latest-value-wins: only the most recent full
//!   order is kept, and the next selection tick sends that snapshot.
//!
//! Write failures are logged and dropped.
//!
//! Writes and read dispatches share one sequencer task, so a read is only
//! sent once every write taken before it has completed. When a read tick finds
//! a selection snapshot still queued, that snapshot is flushed first. Every
//! response is stamped with the selection generation the server had
//! acknowledged when its request went out ([`Stamped`]); a caller can compare
//! that stamp with [`Scheduler::selection_generation`] to tell whether the
//! response already reflects every local edit.
//!
//! A caller that drops its read future does not cancel the request; other
//! waiters still receive the response.

use crate::{ClientConfig, Error, Result, Transport, WriteMethod};
use core::future::Future;
use core::time::Duration;
use idpick_core::Id;
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Identity of a coalescable read: the endpoint plus every query parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReadKey {
    State,
    Unselected {
        filter: String,
        offset: u64,
        limit: usize,
    },
}

impl ReadKey {
    /// Key for an unselected page. The filter is trimmed so equivalent
    /// requests coalesce.
    pub fn unselected(filter: &str, offset: u64, limit: usize) -> Self {
        Self::Unselected {
            filter: filter.trim().to_string(),
            offset,
            limit,
        }
    }

    pub const fn path(&self) -> &'static str {
        match self {
            Self::State => "/state",
            Self::Unselected { .. } => "/unselected",
        }
    }

    /// Query pairs; an empty filter is omitted.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::State => Vec::new(),
            Self::Unselected {
                filter,
                offset,
                limit,
            } => {
                let mut query = Vec::with_capacity(3);
                if !filter.is_empty() {
                    query.push(("filter", filter.clone()));
                }
                query.push(("offset", offset.to_string()));
                query.push(("limit", limit.to_string()));
                query
            }
        }
    }
}

// `interval_at` panics on a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// A read response plus the selection generation the server had acknowledged
/// when the request was sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Stamped {
    pub value: Value,
    pub acked_generation: u64,
}

type Waiter = oneshot::Sender<Result<Stamped>>;

#[derive(Default)]
struct Pending {
    reads: HashMap<ReadKey, Vec<Waiter>>,
    add_items: IndexSet<Id>,
    selection: Option<(u64, Vec<Id>)>,
    closed: bool,
}

struct Shared {
    pending: Mutex<Pending>,
    /// Generation of the latest enqueued selection snapshot.
    selection_generation: AtomicU64,
    /// Highest generation the server has acknowledged.
    acked_generation: AtomicU64,
}

enum Job {
    AddItems(Vec<Id>),
    Selection { generation: u64, order: Vec<Id> },
    Reads(Vec<(ReadKey, Vec<Waiter>)>),
}

#[derive(Clone, Copy)]
struct Intervals {
    read: Duration,
    add_items: Duration,
    selection: Duration,
}

struct Handle {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    // Cancels the driver once the last scheduler handle is dropped.
    _guard: DropGuard,
}

/// Handle to the background coalescing tasks. Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    handle: Arc<Handle>,
}

impl Scheduler {
    /// Spawns the driver and sequencer tasks on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn<T: Transport>(transport: T, config: &ClientConfig) -> Self {
        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending::default()),
            selection_generation: AtomicU64::new(0),
            acked_generation: AtomicU64::new(0),
        });
        let shutdown = CancellationToken::new();
        let transport = Arc::new(transport);
        let intervals = Intervals {
            read: config.read_interval.max(MIN_INTERVAL),
            add_items: config.add_items_interval.max(MIN_INTERVAL),
            selection: config.selection_interval.max(MIN_INTERVAL),
        };

        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let sequencer = tokio::spawn(sequencer_loop(job_rx, transport, Arc::clone(&shared)));
        let driver = tokio::spawn(drive(
            Arc::clone(&shared),
            job_tx,
            sequencer,
            intervals,
            shutdown.clone(),
        ));

        Self {
            handle: Arc::new(Handle {
                shared,
                driver: Mutex::new(Some(driver)),
                _guard: shutdown.clone().drop_guard(),
                shutdown,
            }),
        }
    }

    /// Registers a read for `key` and returns a future for its outcome.
    ///
    /// Registration happens immediately, not when the future is first polled,
    /// so calls made back to back coalesce even if awaited later.
    pub fn read(&self, key: ReadKey) -> impl Future<Output = Result<Value>> + Send + use<> {
        let stamped = self.read_stamped(key);
        async move { stamped.await.map(|stamped| stamped.value) }
    }

    /// Like [`Scheduler::read`], keeping the acknowledgement stamp.
    pub fn read_stamped(
        &self,
        key: ReadKey,
    ) -> impl Future<Output = Result<Stamped>> + Send + use<> {
        let rx = {
            let mut pending = self.handle.shared.pending.lock();
            if pending.closed {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                pending.reads.entry(key).or_default().push(tx);
                Some(rx)
            }
        };

        async move {
            match rx {
                Some(rx) => rx.await.unwrap_or(Err(Error::SchedulerClosed)),
                None => Err(Error::SchedulerClosed),
            }
        }
    }

    /// Queues `id` for the next bulk admission flush. Returns `false` if it is
    /// already queued or the scheduler is shut down.
    pub fn enqueue_add_item(&self, id: Id) -> bool {
        let mut pending = self.handle.shared.pending.lock();
        !pending.closed && pending.add_items.insert(id)
    }

    /// Replaces the pending selection snapshot with `order` and returns its
    /// generation. After shutdown nothing is queued and the current
    /// generation is returned unchanged.
    pub fn enqueue_selection(&self, order: &[Id]) -> u64 {
        let shared = &self.handle.shared;
        let mut pending = shared.pending.lock();
        if pending.closed {
            return shared.selection_generation.load(Ordering::SeqCst);
        }
        let generation = shared.selection_generation.fetch_add(1, Ordering::SeqCst) + 1;
        pending.selection = Some((generation, order.to_vec()));
        generation
    }

    /// Generation of the latest enqueued selection snapshot; 0 before any.
    pub fn selection_generation(&self) -> u64 {
        self.handle.shared.selection_generation.load(Ordering::SeqCst)
    }

    /// `true` while the latest enqueued selection has not been acknowledged
    /// by the server (still queued, in flight, or its flush failed).
    pub fn selection_pending(&self) -> bool {
        let shared = &self.handle.shared;
        shared.selection_generation.load(Ordering::SeqCst)
            > shared.acked_generation.load(Ordering::SeqCst)
    }

    /// Number of distinct read keys waiting for the next tick.
    pub fn pending_reads(&self) -> usize {
        self.handle.shared.pending.lock().reads.len()
    }

    /// Stops the scheduler.
    ///
    /// Reads that were never issued fail with [`Error::SchedulerClosed`].
    /// Pending writes are flushed once, best effort, before this returns.
    pub async fn shutdown(&self) {
        self.handle.shutdown.cancel();
        let driver = self.handle.driver.lock().take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                tracing::error!("Scheduler driver failed: {e}");
            }
        }
    }
}

fn ticker(start: Instant, period: Duration) -> Interval {
    let mut interval = interval_at(start + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn drive(
    shared: Arc<Shared>,
    jobs: mpsc::UnboundedSender<Job>,
    sequencer: JoinHandle<()>,
    intervals: Intervals,
    shutdown: CancellationToken,
) {
    let start = Instant::now();
    let mut reads = ticker(start, intervals.read);
    let mut add_items = ticker(start, intervals.add_items);
    let mut selection = ticker(start, intervals.selection);

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = reads.tick() => {
                let batch: Vec<(ReadKey, Vec<Waiter>)> =
                    shared.pending.lock().reads.drain().collect();
                if !batch.is_empty() {
                    // Reads must observe the selection the caller already made.
                    if let Some(job) = take_selection(&shared) {
                        let _ = jobs.send(job);
                    }
                    tracing::trace!(keys = batch.len(), "Dispatching coalesced reads");
                    let _ = jobs.send(Job::Reads(batch));
                }
            }
            _ = add_items.tick() => {
                if let Some(job) = take_add_items(&shared) {
                    let _ = jobs.send(job);
                }
            }
            _ = selection.tick() => {
                if let Some(job) = take_selection(&shared) {
                    let _ = jobs.send(job);
                }
            }
        }
    }

    tracing::debug!("Scheduler shutting down");
    let waiters: Vec<Waiter> = {
        let mut pending = shared.pending.lock();
        pending.closed = true;
        pending.reads.drain().flat_map(|(_, waiters)| waiters).collect()
    };
    for waiter in waiters {
        let _ = waiter.send(Err(Error::SchedulerClosed));
    }

    for job in [take_add_items(&shared), take_selection(&shared)]
        .into_iter()
        .flatten()
    {
        let _ = jobs.send(job);
    }
    drop(jobs);

    if let Err(e) = sequencer.await {
        tracing::error!("Scheduler sequencer failed: {e}");
    }
}

fn take_add_items(shared: &Shared) -> Option<Job> {
    let mut pending = shared.pending.lock();
    if pending.add_items.is_empty() {
        return None;
    }
    let ids = core::mem::take(&mut pending.add_items);
    Some(Job::AddItems(ids.into_iter().collect()))
}

fn take_selection(shared: &Shared) -> Option<Job> {
    shared
        .pending
        .lock()
        .selection
        .take()
        .map(|(generation, order)| Job::Selection { generation, order })
}

/// Runs jobs in the order they were taken. Writes are awaited one at a time;
/// reads are spawned once every earlier write has completed.
async fn sequencer_loop<T: Transport>(
    mut rx: mpsc::UnboundedReceiver<Job>,
    transport: Arc<T>,
    shared: Arc<Shared>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::AddItems(ids) => {
                let count = ids.len();
                let body = json!({ "ids": ids });
                match transport.send(WriteMethod::Post, "/items/bulk", body).await {
                    Ok(_) => tracing::debug!(count, "Flushed new identifiers"),
                    Err(e) => tracing::warn!(count, "Dropped new-identifier flush: {e}"),
                }
            }
            Job::Selection { generation, order } => {
                let len = order.len();
                let body = json!({ "order": order });
                match transport.send(WriteMethod::Put, "/selected", body).await {
                    Ok(_) => {
                        shared
                            .acked_generation
                            .fetch_max(generation, Ordering::SeqCst);
                        tracing::debug!(generation, len, "Flushed selection order");
                    }
                    Err(e) => tracing::warn!(generation, len, "Dropped selection flush: {e}"),
                }
            }
            Job::Reads(batch) => {
                let acked_generation = shared.acked_generation.load(Ordering::SeqCst);
                for (key, waiters) in batch {
                    spawn_read(Arc::clone(&transport), key, waiters, acked_generation);
                }
            }
        }
    }
}

fn spawn_read<T: Transport>(
    transport: Arc<T>,
    key: ReadKey,
    waiters: Vec<Waiter>,
    acked_generation: u64,
) {
    tokio::spawn(async move {
        let query = key.query();
        let result = transport
            .get(key.path(), &query)
            .await
            .map(|value| Stamped {
                value,
                acked_generation,
            });
        if let Err(e) = &result {
            tracing::debug!(?key, waiters = waiters.len(), "Read failed: {e}");
        }
        for waiter in waiters {
            // The caller may have dropped its future; that is fine.
            let _ = waiter.send(result.clone());
        }
    });
}

#[cfg(test)]
mod tests;
