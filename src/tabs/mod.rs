//! Tabs module - Per-tab origin tracking and host tab lookups

mod query;
mod tracker;

pub use query::{TabDirectory, TabQuery};
pub use tracker::{hostname_from_url, TabOriginTracker, TabState};

#[cfg(test)]
pub use query::MockTabQuery;

/// Host tab identifier
///
/// Stable while the tab is open; the host may reuse it after the tab closes.
/// Negative values mean a request is not tied to any tab.
pub type TabId = i64;
