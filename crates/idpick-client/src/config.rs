use core::time::Duration;
use idpick_core::DEFAULT_PAGE_SIZE;

/// Default API root of a locally running `idpick-server`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

/// Tick at which pending reads are issued.
pub const DEFAULT_READ_INTERVAL: Duration = Duration::from_secs(1);

/// Flush interval for new-identifier submissions. Coarser than reads since
/// the submitter already sees the identifier optimistically.
pub const DEFAULT_ADD_ITEMS_INTERVAL: Duration = Duration::from_secs(10);

/// Flush interval for selection-order snapshots.
pub const DEFAULT_SELECTION_INTERVAL: Duration = Duration::from_secs(1);

/// Client-side tuning. Intervals below one millisecond are raised to one
/// millisecond.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3001/api`.
    pub base_url: String,
    pub read_interval: Duration,
    pub add_items_interval: Duration,
    pub selection_interval: Duration,
    /// Page size for both panes: left-pane fetches and right-pane growth.
    pub page_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            read_interval: DEFAULT_READ_INTERVAL,
            add_items_interval: DEFAULT_ADD_ITEMS_INTERVAL,
            selection_interval: DEFAULT_SELECTION_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
