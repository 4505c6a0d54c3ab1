//! # Identifier Types and Constants
//!
//! Shared numeric contract between the server and its clients.
//!
//! ## Overview
//!
//! - [`Id`] - the primitive identifier type
//! - [`MAX_ID_LIMIT`] - the largest identifier either side will accept
//! - [`DEFAULT_MAX_ID`] - default upper bound of the dense range
//! - [`DEFAULT_PAGE_SIZE`] - default `limit` for unselected pages
//!
//! > ⚠️ [`MAX_ID_LIMIT`] is `2^53 - 1` so identifiers survive a round trip
//! > through any JSON consumer that stores numbers as IEEE-754 doubles. The
//! > same ceiling is applied on the bulk admission path and the selection
//! > path.

/// A single identifier from the domain.
pub type Id = u64;

/// Largest identifier accepted anywhere in the system.
pub const MAX_ID_LIMIT: Id = (1 << 53) - 1;

/// Default upper bound of the dense range `[1, max_id]`.
pub const DEFAULT_MAX_ID: Id = 1_000_000;

/// Default number of identifiers returned per unselected page.
pub const DEFAULT_PAGE_SIZE: usize = 20;
