//! HTTP service implementation.
//!
//! This module owns the single shared [`Catalog`](idpick_core::Catalog) and
//! maps the JSON API onto it.
//!
//! ## Structure
//!
//! - [`handler`] - service state (`PickerService`), router and route handlers.

pub mod handler;
