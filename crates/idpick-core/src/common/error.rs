//! Error types for the identifier catalog.
//!
//! The catalog has exactly one failure class: a raw input value could not be
//! turned into a usable identifier. Callers on the request path never surface
//! it to clients; invalid input is excluded from results (bulk intake reports
//! it in `skipped`, selection replace drops it silently).
//!
//! ## Error Cases
//! - `InvalidIdentifier`: the value was non-numeric, non-finite, not integral,
//!   not positive, or above [`MAX_ID_LIMIT`](crate::MAX_ID_LIMIT).

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the identifier catalog.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The raw value does not coerce to an identifier in `1..=MAX_ID_LIMIT`.
    #[error("Invalid identifier: {raw}")]
    InvalidIdentifier { raw: String },
}

impl Error {
    pub(crate) fn invalid(raw: impl ToString) -> Self {
        Self::InvalidIdentifier {
            raw: raw.to_string(),
        }
    }
}
