//! Error types for the picker client.
//!
//! Every variant is `Clone`: a single coalesced network call fans its outcome
//! out to every caller waiting on the same read key.
//!
//! ## Error Cases
//! - `Transport`: the request never produced an HTTP response.
//! - `Status`: the server answered with a non-success status code.
//! - `Decode`: the response body did not match the expected shape.
//! - `SchedulerClosed`: the scheduler shut down before the read was issued.

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the picker client.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// Connection, timeout or other transport-level failure.
    #[error("Transport error: {context}")]
    Transport { context: String },

    /// The server returned a non-success HTTP status.
    #[error("Request failed: {status}")]
    Status { status: u16 },

    /// The response body could not be decoded.
    #[error("Decode error: {context}")]
    Decode { context: String },

    /// The scheduler is shut down and no longer issues requests.
    #[error("Scheduler is shut down")]
    SchedulerClosed,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Decode {
                context: err.to_string(),
            }
        } else {
            Self::Transport {
                context: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            context: err.to_string(),
        }
    }
}
