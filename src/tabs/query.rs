//! Host tab queries
//!
//! The capture core never enumerates tabs itself. It asks the host which tab
//! is active in the focused window and what URL a tab currently shows.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::TabId;

/// Cross-process tab lookups answered by the host
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabQuery: Send + Sync {
    /// Active tab of the currently focused window, if any
    async fn active_tab(&self) -> Option<TabId>;

    /// Current URL of a tab, if the host can resolve it
    async fn tab_url(&self, tab_id: TabId) -> Option<String>;
}

/// Tab directory kept by a host adapter that learns about tabs from events
///
/// The replay binary feeds it from the event stream; embedders with a real
/// browser API implement [`TabQuery`] directly instead.
#[derive(Default)]
pub struct TabDirectory {
    active: RwLock<Option<TabId>>,
    urls: RwLock<HashMap<TabId, String>>,
}

impl TabDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a tab as the active tab of the focused window
    pub fn set_active(&self, tab_id: TabId) {
        *self.active.write() = Some(tab_id);
    }

    /// Records a tab's current URL
    pub fn set_url(&self, tab_id: TabId, url: impl Into<String>) {
        self.urls.write().insert(tab_id, url.into());
    }

    /// Forgets a closed tab; clears the active marker if it pointed there
    pub fn remove(&self, tab_id: TabId) {
        self.urls.write().remove(&tab_id);
        let mut active = self.active.write();
        if *active == Some(tab_id) {
            *active = None;
        }
    }
}

#[async_trait]
impl TabQuery for TabDirectory {
    async fn active_tab(&self) -> Option<TabId> {
        *self.active.read()
    }

    async fn tab_url(&self, tab_id: TabId) -> Option<String> {
        self.urls.read().get(&tab_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_tracks_active_and_urls() {
        let tabs = TabDirectory::new();
        assert_eq!(tabs.active_tab().await, None);

        tabs.set_url(3, "https://a.example/");
        tabs.set_active(3);
        assert_eq!(tabs.active_tab().await, Some(3));
        assert_eq!(tabs.tab_url(3).await.as_deref(), Some("https://a.example/"));
    }

    #[tokio::test]
    async fn test_directory_remove_clears_active() {
        let tabs = TabDirectory::new();
        tabs.set_url(3, "https://a.example/");
        tabs.set_active(3);
        tabs.set_active(4);
        tabs.remove(3);
        assert_eq!(tabs.active_tab().await, Some(4));
        assert_eq!(tabs.tab_url(3).await, None);

        tabs.remove(4);
        assert_eq!(tabs.active_tab().await, None);
    }
}
