use crate::{ClientConfig, Error, HttpTransport, ReadKey, Result, Scheduler, Transport};
use core::future::Future;
use idpick_core::wire::{StateResponse, UnselectedPage};
use idpick_core::{Id, MAX_ID_LIMIT};
use serde::de::DeserializeOwned;

/// Typed facade over the [`Scheduler`].
///
/// Reads return futures that resolve at the next read tick; writes are queued
/// and return immediately.
#[derive(Clone)]
pub struct PickerClient {
    scheduler: Scheduler,
    page_size: usize,
}

impl PickerClient {
    /// Connects to `config.base_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.base_url.clone())?;
        Ok(Self::with_transport(transport, config))
    }

    /// Builds a client over any [`Transport`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_transport<T: Transport>(transport: T, config: &ClientConfig) -> Self {
        Self {
            scheduler: Scheduler::spawn(transport, config),
            page_size: config.page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Full server state.
    pub fn state(&self) -> impl Future<Output = Result<StateResponse>> + Send + use<> {
        decoded(self.scheduler.read(ReadKey::State))
    }

    /// Full server state together with the selection generation the server
    /// had acknowledged when the request was sent.
    pub fn state_stamped(
        &self,
    ) -> impl Future<Output = Result<(StateResponse, u64)>> + Send + use<> {
        let read = self.scheduler.read_stamped(ReadKey::State);
        async move {
            let stamped = read.await?;
            let state: StateResponse = serde_json::from_value(stamped.value)?;
            Ok::<_, Error>((state, stamped.acked_generation))
        }
    }

    /// One page of unselected identifiers as the server sees them.
    pub fn unselected_page(
        &self,
        filter: &str,
        offset: u64,
        limit: usize,
    ) -> impl Future<Output = Result<UnselectedPage>> + Send + use<> {
        decoded(
            self.scheduler
                .read(ReadKey::unselected(filter, offset, limit)),
        )
    }

    /// Queues a new identifier for bulk admission. Returns `false` for
    /// identifiers the server could never admit (0 or above the limit), for
    /// duplicates of a queued identifier, and after shutdown.
    pub fn enqueue_add_item(&self, id: Id) -> bool {
        (1..=MAX_ID_LIMIT).contains(&id) && self.scheduler.enqueue_add_item(id)
    }

    /// Queues `order` as the next selection snapshot, replacing any snapshot
    /// that has not been sent yet.
    pub fn enqueue_selection_update(&self, order: &[Id]) {
        self.scheduler.enqueue_selection(order);
    }

    /// `true` while a selection change has not been acknowledged.
    pub fn selection_pending(&self) -> bool {
        self.scheduler.selection_pending()
    }

    /// Generation of the latest queued selection change.
    pub fn selection_generation(&self) -> u64 {
        self.scheduler.selection_generation()
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}

fn decoded<R, F>(read: F) -> impl Future<Output = Result<R>> + Send + 'static
where
    R: DeserializeOwned + Send + 'static,
    F: Future<Output = Result<serde_json::Value>> + Send + 'static,
{
    async move { serde_json::from_value(read.await?).map_err(Error::from) }
}
