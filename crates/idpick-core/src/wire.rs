//! JSON request and response bodies shared by the server and its clients.
//!
//! Request bodies are parsed leniently: a body that is not JSON, is not an
//! object, or carries a field of the wrong type degrades to an empty request
//! instead of a failure. Query parameters follow the same rule.

use crate::{DEFAULT_PAGE_SIZE, Id, Page};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /api/state`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateResponse {
    pub selected_order: Vec<Id>,
    pub extra_ids: Vec<Id>,
    pub max_id: Id,
}

/// `POST /api/items/bulk` request body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkRequest {
    pub ids: Vec<Value>,
}

impl BulkRequest {
    pub fn from_body(body: &[u8]) -> Self {
        Self {
            ids: array_field(body, "ids"),
        }
    }
}

/// `POST /api/items/bulk` response body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkResponse {
    pub added: Vec<Id>,
    /// Raw values for candidates that failed coercion, coerced identifiers
    /// for everything else that was not admitted.
    pub skipped: Vec<Value>,
}

/// `PUT /api/selected` request body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub order: Vec<Value>,
}

impl SelectionRequest {
    pub fn from_body(body: &[u8]) -> Self {
        Self {
            order: array_field(body, "order"),
        }
    }
}

/// `PUT /api/selected` response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionResponse {
    pub selected_order: Vec<Id>,
}

/// `GET /api/unselected` response body.
pub type UnselectedPage = Page;

/// Raw `GET /api/unselected` query parameters, kept as text so malformed
/// values can fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnselectedQuery {
    pub filter: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// A resolved unselected-page request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub filter: String,
    pub offset: u64,
    pub limit: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            filter: String::new(),
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl UnselectedQuery {
    /// Resolves the raw parameters.
    ///
    /// - `filter` is trimmed; absent means no filtering.
    /// - `offset` and `limit` take the leading integer of their text
    ///   (`"12abc"` is 12). An absent or non-numeric `limit` becomes
    ///   `default_limit`, an absent or non-numeric `offset` becomes 0.
    /// - Negative offsets clamp to 0, negative limits to 0, and `limit` is
    ///   capped at `max_limit`.
    pub fn window(&self, default_limit: usize, max_limit: usize) -> PageWindow {
        let filter = self.filter.as_deref().map(str::trim).unwrap_or_default();
        let offset = self
            .offset
            .as_deref()
            .and_then(leading_int)
            .map_or(0, |n| u64::try_from(n).unwrap_or(0));
        let limit = self
            .limit
            .as_deref()
            .and_then(leading_int)
            .map_or(default_limit, |n| usize::try_from(n).unwrap_or(0))
            .min(max_limit);

        PageWindow {
            filter: filter.to_string(),
            offset,
            limit,
        }
    }
}

/// Parses the leading `[+-]?[0-9]+` of `text`, saturating on overflow.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let magnitude = digits[..len]
        .bytes()
        .fold(0_i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    Some(if negative { -magnitude } else { magnitude })
}

fn array_field(body: &[u8], field: &str) -> Vec<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => match map.remove(field) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
