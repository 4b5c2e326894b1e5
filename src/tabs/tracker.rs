//! Tab origin tracker - last navigated hostname per tab
//!
//! Hostnames come only from completed navigations (or tab activation, which
//! replays the tab's current URL). Client-side route changes inside a page
//! are not observed, so the recorded hostname can lag a single-page app that
//! moves across origins without a full navigation.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use url::Url;

use super::query::TabQuery;
use super::TabId;
use crate::security::Sanitizer;

/// Tracked state for one open tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabState {
    pub tab_id: TabId,
    /// Hostname of the last completed navigation, `None` for hostless pages
    pub hostname: Option<String>,
    /// Distinguishes this tab from an earlier tab that held the same id
    pub generation: u64,
}

/// Extracts the hostname from a URL
///
/// # Returns
///
/// `Err` if the URL does not parse, `Ok(None)` if it parses but has no host
/// (`about:blank`, `data:` and similar)
pub fn hostname_from_url(url: &str) -> Result<Option<String>, url::ParseError> {
    Url::parse(url).map(|parsed| parsed.host_str().map(str::to_string))
}

/// Maintains the last known navigation hostname per tab
///
/// Uses a synchronous lock: lookups happen inside the request hook, which
/// must not suspend.
///
/// A tab gets a fresh generation the first time it is seen after being absent.
/// Later navigations of the same tab keep it, so a removed-then-reused id never
/// shares a generation with its predecessor.
#[derive(Default)]
pub struct TabOriginTracker {
    tabs: RwLock<HashMap<TabId, TabState>>,
    next_generation: AtomicU64,
}

impl TabOriginTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the hostname of a completed navigation
    ///
    /// Unparseable URLs leave any previous hostname untouched.
    ///
    /// # Returns
    ///
    /// `true` if the tab's state was updated
    pub fn on_navigation_complete(&self, tab_id: TabId, url: &str) -> bool {
        let hostname = match hostname_from_url(url) {
            Ok(hostname) => hostname,
            Err(e) => {
                tracing::debug!(
                    tab_id,
                    url = %Sanitizer::sanitize_url(url),
                    "Ignoring navigation with unparseable URL: {}",
                    e
                );
                return false;
            }
        };

        tracing::debug!(tab_id, hostname = ?hostname, "Tab navigated");
        match self.tabs.write().entry(tab_id) {
            Entry::Occupied(mut entry) => entry.get_mut().hostname = hostname,
            Entry::Vacant(entry) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                entry.insert(TabState {
                    tab_id,
                    hostname,
                    generation,
                });
            }
        }
        true
    }

    /// Refreshes a tab's hostname when it becomes active
    ///
    /// Looks up the tab's current URL through the host. Tabs whose URL cannot
    /// be resolved are left as they were.
    pub async fn on_tab_activated(&self, tab_id: TabId, query: &dyn TabQuery) -> bool {
        match query.tab_url(tab_id).await {
            Some(url) => self.on_navigation_complete(tab_id, &url),
            None => false,
        }
    }

    /// Forgets a closed tab
    pub fn on_tab_removed(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.write().remove(&tab_id)
    }

    /// Returns the tracked hostname for a tab
    pub fn hostname_of(&self, tab_id: TabId) -> Option<String> {
        self.tabs
            .read()
            .get(&tab_id)
            .and_then(|state| state.hostname.clone())
    }

    /// Returns the generation of a tracked tab
    pub fn generation_of(&self, tab_id: TabId) -> Option<u64> {
        self.tabs.read().get(&tab_id).map(|state| state.generation)
    }

    /// Returns the full tracked state for a tab
    pub fn state_of(&self, tab_id: TabId) -> Option<TabState> {
        self.tabs.read().get(&tab_id).cloned()
    }

    /// Number of tracked tabs
    pub fn len(&self) -> usize {
        self.tabs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::MockTabQuery;
    use mockall::predicate::eq;

    #[test]
    fn test_hostname_from_url() {
        assert_eq!(
            hostname_from_url("https://api.example/v1/me?x=1").unwrap(),
            Some("api.example".to_string())
        );
        assert_eq!(
            hostname_from_url("https://API.Example.COM:8443/").unwrap(),
            Some("api.example.com".to_string())
        );
        assert_eq!(hostname_from_url("about:blank").unwrap(), None);
        assert!(hostname_from_url("not a url").is_err());
    }

    #[test]
    fn test_navigation_sets_hostname() {
        let tracker = TabOriginTracker::new();
        assert!(tracker.on_navigation_complete(7, "https://api.example/home"));
        assert_eq!(tracker.hostname_of(7), Some("api.example".to_string()));
    }

    #[test]
    fn test_navigation_updates_hostname() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        tracker.on_navigation_complete(7, "https://b.example/");
        assert_eq!(tracker.hostname_of(7), Some("b.example".to_string()));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_malformed_url_keeps_previous() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        assert!(!tracker.on_navigation_complete(7, "::::"));
        assert_eq!(tracker.hostname_of(7), Some("a.example".to_string()));
    }

    #[test]
    fn test_malformed_url_on_unknown_tab() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(9, "garbage");
        assert_eq!(tracker.generation_of(9), None);
        assert_eq!(tracker.hostname_of(9), None);
    }

    #[test]
    fn test_hostless_page_clears_hostname() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        tracker.on_navigation_complete(7, "about:blank");

        assert!(tracker.generation_of(7).is_some());
        assert_eq!(tracker.hostname_of(7), None);
        let generation = tracker.generation_of(7).unwrap();
        assert_eq!(
            tracker.state_of(7),
            Some(TabState {
                tab_id: 7,
                hostname: None,
                generation,
            })
        );
    }

    #[test]
    fn test_generation_survives_navigation() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        let first = tracker.generation_of(7);
        tracker.on_navigation_complete(7, "https://b.example/");

        assert!(first.is_some());
        assert_eq!(tracker.generation_of(7), first);
    }

    #[test]
    fn test_reused_tab_id_gets_new_generation() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        let before = tracker.generation_of(7).unwrap();

        tracker.on_tab_removed(7);
        assert_eq!(tracker.generation_of(7), None);

        tracker.on_navigation_complete(7, "https://b.example/");
        let after = tracker.generation_of(7).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_tab_removed() {
        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(7, "https://a.example/");
        tracker.on_navigation_complete(8, "https://b.example/");

        let removed = tracker.on_tab_removed(7);
        assert_eq!(removed.map(|s| s.tab_id), Some(7));
        assert_eq!(tracker.hostname_of(7), None);
        assert_eq!(tracker.generation_of(7), None);
        assert_eq!(tracker.hostname_of(8), Some("b.example".to_string()));
        assert!(tracker.on_tab_removed(7).is_none());
    }

    #[tokio::test]
    async fn test_activation_resolves_url() {
        let mut query = MockTabQuery::new();
        query
            .expect_tab_url()
            .with(eq(4))
            .returning(|_| Some("https://docs.example/page".to_string()));

        let tracker = TabOriginTracker::new();
        assert!(tracker.on_tab_activated(4, &query).await);
        assert_eq!(tracker.hostname_of(4), Some("docs.example".to_string()));
    }

    #[tokio::test]
    async fn test_activation_without_url() {
        let mut query = MockTabQuery::new();
        query.expect_tab_url().returning(|_| None);

        let tracker = TabOriginTracker::new();
        tracker.on_navigation_complete(4, "https://a.example/");
        assert!(!tracker.on_tab_activated(4, &query).await);
        assert_eq!(tracker.hostname_of(4), Some("a.example".to_string()));
    }
}
