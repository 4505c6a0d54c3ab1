//! HTTP service implementation for the identifier picker.
//!
//! This module defines [`PickerService`], which owns the process-wide
//! [`Catalog`] and exposes it through four JSON routes plus a health check:
//!
//! - `GET  /api/state`
//! - `POST /api/items/bulk`
//! - `PUT  /api/selected`
//! - `GET  /api/unselected?filter=&offset=&limit=`
//! - `GET  /healthz`
//!
//! ## Responsibilities
//!
//! - Serialize every catalog access behind one mutex so pages never observe a
//!   half-applied selection replace.
//! - Parse bodies and query strings leniently; malformed input never fails a
//!   request.
//! - Take the catalog lock only on the blocking pool. A filtered page scans
//!   the whole domain while holding it, and every other route waits behind
//!   that scan.

use crate::server::{
    config::ServerConfig,
    telemetry::{
        increment_ids_admitted, increment_requests, record_page_items, record_selection_size,
    },
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use idpick_core::{
    Catalog,
    wire::{
        BulkRequest, BulkResponse, SelectionRequest, SelectionResponse, StateResponse,
        UnselectedPage, UnselectedQuery,
    },
};
use parking_lot::Mutex;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared service state handed to every route.
///
/// Cloning is cheap; all clones point at the same [`Catalog`].
#[derive(Clone)]
pub struct PickerService {
    config: Arc<ServerConfig>,
    catalog: Arc<Mutex<Catalog>>,
}

impl PickerService {
    /// Creates the service with an empty selection over `[1, config.max_id]`.
    pub fn new(config: ServerConfig) -> Self {
        let catalog = Catalog::new(config.max_id);
        Self {
            config: Arc::new(config),
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Builds the router with permissive CORS and per-request trace spans.
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/state", get(get_state))
            .route("/api/items/bulk", post(post_bulk))
            .route("/api/selected", put(put_selected))
            .route("/api/unselected", get(get_unselected))
            .route("/healthz", get(healthz))
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self)
    }

    /// Runs `f` against the catalog on the blocking pool.
    async fn with_catalog<R, F>(&self, f: F) -> Result<R, StatusCode>
    where
        F: FnOnce(&mut Catalog) -> R + Send + 'static,
        R: Send + 'static,
    {
        let catalog = Arc::clone(&self.catalog);
        tokio::task::spawn_blocking(move || f(&mut catalog.lock()))
            .await
            .map_err(|e| {
                tracing::error!("Catalog task failed: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            })
    }

    #[cfg(test)]
    pub(crate) fn catalog(&self) -> Arc<Mutex<Catalog>> {
        Arc::clone(&self.catalog)
    }
}

#[tracing::instrument(skip_all)]
async fn get_state(
    State(service): State<PickerService>,
) -> Result<Json<StateResponse>, StatusCode> {
    increment_requests("state");
    let state = service.with_catalog(|catalog| catalog.snapshot()).await?;
    Ok(Json(state))
}

/// Bodies are read as raw bytes so a missing or malformed `ids` field
/// degrades to an empty batch instead of a rejection.
#[tracing::instrument(skip_all, fields(bytes = body.len()))]
async fn post_bulk(
    State(service): State<PickerService>,
    body: Bytes,
) -> Result<Json<BulkResponse>, StatusCode> {
    increment_requests("items_bulk");
    let request = BulkRequest::from_body(&body);
    let outcome = service
        .with_catalog(move |catalog| catalog.admit_bulk(&request.ids))
        .await?;

    increment_ids_admitted(outcome.added.len() as u64);
    tracing::debug!(
        added = outcome.added.len(),
        skipped = outcome.skipped.len(),
        "Bulk intake processed"
    );
    Ok(Json(outcome))
}

#[tracing::instrument(skip_all, fields(bytes = body.len()))]
async fn put_selected(
    State(service): State<PickerService>,
    body: Bytes,
) -> Result<Json<SelectionResponse>, StatusCode> {
    increment_requests("selected");
    let request = SelectionRequest::from_body(&body);
    let selected_order = service
        .with_catalog(move |catalog| catalog.replace_selection(&request.order))
        .await?;

    record_selection_size(selected_order.len() as u64);
    tracing::debug!(len = selected_order.len(), "Selection replaced");
    Ok(Json(SelectionResponse { selected_order }))
}

/// Query pairs are collected raw (first occurrence wins) so duplicate or
/// unknown parameters never reject the request.
#[tracing::instrument(skip_all)]
async fn get_unselected(
    State(service): State<PickerService>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<UnselectedPage>, StatusCode> {
    increment_requests("unselected");
    let query = unselected_query(pairs);
    let window = query.window(service.config.default_page_size, service.config.max_page_size);

    let page = service
        .with_catalog(move |catalog| catalog.page(&window.filter, window.offset, window.limit))
        .await?;

    record_page_items(page.items.len() as u64);
    Ok(Json(page))
}

async fn healthz() -> &'static str {
    "ok"
}

fn unselected_query(pairs: Vec<(String, String)>) -> UnselectedQuery {
    let mut query = UnselectedQuery::default();
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "filter" => &mut query.filter,
            "offset" => &mut query.offset,
            "limit" => &mut query.limit,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    query
}
