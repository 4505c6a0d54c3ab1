//! In-memory [`Transport`] backed by a real [`Catalog`], for tests.

use crate::{Error, Result, Transport, WriteMethod};
use core::time::Duration;
use idpick_core::wire::{SelectionResponse, UnselectedQuery};
use idpick_core::{Catalog, DEFAULT_PAGE_SIZE, Id};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Clone)]
pub(crate) struct FakeServer {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Mutex<Catalog>,
    gets: AtomicUsize,
    writes: Mutex<Vec<(WriteMethod, String, Value)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Reads snapshot the catalog immediately and respond after this delay.
    read_delay: Mutex<Duration>,
    /// Writes wait this long before they are applied.
    write_delay: Mutex<Duration>,
}

impl FakeServer {
    pub(crate) fn new(max_id: Id) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog: Mutex::new(Catalog::new(max_id)),
                gets: AtomicUsize::new(0),
                writes: Mutex::new(Vec::new()),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
                read_delay: Mutex::new(Duration::ZERO),
                write_delay: Mutex::new(Duration::ZERO),
            }),
        }
    }

    pub(crate) fn catalog(&self) -> parking_lot::MutexGuard<'_, Catalog> {
        self.inner.catalog.lock()
    }

    pub(crate) fn get_count(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> Vec<(WriteMethod, String, Value)> {
        self.inner.writes.lock().clone()
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn delay_reads(&self, delay: Duration) {
        *self.inner.read_delay.lock() = delay;
    }

    pub(crate) fn delay_writes(&self, delay: Duration) {
        *self.inner.write_delay.lock() = delay;
    }

    fn answer_get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Status { status: 503 });
        }
        let catalog = self.inner.catalog.lock();
        match path {
            "/state" => Ok(serde_json::to_value(catalog.snapshot())?),
            "/unselected" => {
                let window = UnselectedQuery {
                    filter: param(query, "filter"),
                    offset: param(query, "offset"),
                    limit: param(query, "limit"),
                }
                .window(DEFAULT_PAGE_SIZE, 10_000);
                let page = catalog.page(&window.filter, window.offset, window.limit);
                Ok(serde_json::to_value(page)?)
            }
            _ => Err(Error::Status { status: 404 }),
        }
    }

    fn apply_send(&self, method: WriteMethod, path: &str, body: &Value) -> Result<Value> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Transport {
                context: "connection refused".to_string(),
            });
        }
        let mut catalog = self.inner.catalog.lock();
        match (method, path) {
            (WriteMethod::Post, "/items/bulk") => {
                Ok(serde_json::to_value(catalog.admit_bulk(&array(body, "ids")))?)
            }
            (WriteMethod::Put, "/selected") => {
                let selected_order = catalog.replace_selection(&array(body, "order"));
                Ok(serde_json::to_value(SelectionResponse { selected_order })?)
            }
            _ => Err(Error::Status { status: 404 }),
        }
    }
}

fn param(query: &[(&'static str, String)], name: &str) -> Option<String> {
    query
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.clone())
}

fn array(body: &Value, field: &str) -> Vec<Value> {
    body.get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

impl Transport for FakeServer {
    async fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        self.inner.gets.fetch_add(1, Ordering::SeqCst);
        let result = self.answer_get(path, query);
        let delay = *self.inner.read_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn send(&self, method: WriteMethod, path: &str, body: Value) -> Result<Value> {
        self.inner
            .writes
            .lock()
            .push((method, path.to_string(), body.clone()));
        let delay = *self.inner.write_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.apply_send(method, path, &body)
    }
}
