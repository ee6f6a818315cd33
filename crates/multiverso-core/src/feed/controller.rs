//! The paginated character feed.
//!
//! `FeedController` decides which source backs the list: online it pages
//! through the remote catalog and mirrors everything loaded so far into the
//! character cache; offline it filters the cached snapshot in one step.
//!
//! Remote pages are fetched on spawned tokio tasks that report back over an
//! mpsc channel. Each request carries a `FeedTicket` recording the generation
//! it was issued in; `reset` starts a new generation, so answers to requests
//! issued before a reset (or a connectivity flip) are dropped on arrival.
//!
//! A feed built with `with_connectivity` follows a `ConnectivityMonitor`
//! subscription: every load, poll and wait first picks up the latest value
//! and rebuilds the feed if it flipped.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, CharacterPage, CharacterSource};
use crate::cache::CharacterCache;
use crate::models::{Character, CharacterFilters};

/// Buffer size for the page result channel.
/// At most one request is live per generation; the rest is headroom for
/// stale answers still in flight after resets.
const CHANNEL_BUFFER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Loaded,
    Exhausted,
    Error,
}

/// Context a remote request was issued in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTicket {
    pub generation: u64,
    pub page: u32,
    pub filters: CharacterFilters,
}

/// Result of a spawned page fetch, sent back to the controller.
struct PageResult {
    ticket: FeedTicket,
    result: Result<CharacterPage, ApiError>,
}

/// What happened to a page result when it reached the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    Applied,
    /// Issued before the latest reset; ignored.
    Stale,
}

pub struct FeedController {
    remote: Arc<dyn CharacterSource>,
    cache: CharacterCache,

    filters: CharacterFilters,
    phase: FeedPhase,
    items: Vec<Character>,
    /// Next remote page to request (1-based)
    next_page: u32,
    has_more: bool,
    online: bool,
    connectivity: Option<watch::Receiver<bool>>,
    last_error: Option<String>,

    generation: u64,
    in_flight: Option<FeedTicket>,
    /// Spawned fetches whose results have not been received yet
    outstanding: usize,

    result_tx: mpsc::Sender<PageResult>,
    result_rx: mpsc::Receiver<PageResult>,
}

impl FeedController {
    pub fn new(remote: Arc<dyn CharacterSource>, cache: CharacterCache, online: bool) -> Self {
        let (result_tx, result_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            remote,
            cache,
            filters: CharacterFilters::default(),
            phase: FeedPhase::Idle,
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            online,
            connectivity: None,
            last_error: None,
            generation: 0,
            in_flight: None,
            outstanding: 0,
            result_tx,
            result_rx,
        }
    }

    /// Follow `connectivity` instead of a fixed online flag.
    pub fn with_connectivity(mut self, mut connectivity: watch::Receiver<bool>) -> Self {
        self.online = *connectivity.borrow_and_update();
        self.connectivity = Some(connectivity);
        self
    }

    // =========================================================================
    // State for the UI
    // =========================================================================

    pub fn items(&self) -> &[Character] {
        &self.items
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FeedPhase::Loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn filters(&self) -> &CharacterFilters {
        &self.filters
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Message of the transport error that put the feed in `Error`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Page the next online `load_next` will request
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Start over with `filters`: drop accumulated items, go back to the
    /// first page and issue the first load right away.
    ///
    /// Offline the load completes before this returns. Online a fetch is
    /// spawned, so this must run inside a tokio runtime.
    pub fn reset(&mut self, filters: CharacterFilters) {
        if let Some(online) = self.latest_connectivity() {
            self.online = online;
        }
        self.generation += 1;
        debug!(generation = self.generation, ?filters, online = self.online, "Feed reset");

        self.filters = filters;
        self.items.clear();
        self.next_page = 1;
        self.has_more = true;
        self.last_error = None;
        self.in_flight = None;
        self.phase = FeedPhase::Loading;

        self.issue_load();
    }

    /// Load the next chunk of the feed.
    ///
    /// Does nothing while a request is in flight or once the feed is
    /// exhausted. From `Error` this retries the page that failed.
    pub fn load_next(&mut self) {
        self.sync_connectivity();
        match self.phase {
            FeedPhase::Loading | FeedPhase::Exhausted => {
                debug!(phase = ?self.phase, "load_next ignored");
            }
            FeedPhase::Idle | FeedPhase::Loaded | FeedPhase::Error => {
                self.phase = FeedPhase::Loading;
                self.last_error = None;
                self.issue_load();
            }
        }
    }

    /// Record the current connectivity. On a flip an active feed is rebuilt
    /// from its current filters: remote pages and the cached snapshot do not
    /// share cursors. Returns true if connectivity changed.
    ///
    /// A feed following a monitor takes the monitor's value again on its
    /// next sync.
    pub fn set_online(&mut self, online: bool) -> bool {
        if self.online == online {
            return false;
        }

        self.online = online;
        if self.phase != FeedPhase::Idle {
            info!(online, "Connectivity changed, rebuilding feed");
            let filters = self.filters.clone();
            self.reset(filters);
        }
        true
    }

    /// Apply the latest value from the followed monitor, if any.
    /// Returns true if connectivity changed.
    pub fn sync_connectivity(&mut self) -> bool {
        match self.latest_connectivity() {
            Some(online) => self.set_online(online),
            None => false,
        }
    }

    fn latest_connectivity(&mut self) -> Option<bool> {
        self.connectivity
            .as_mut()
            .map(|connectivity| *connectivity.borrow_and_update())
    }

    fn issue_load(&mut self) {
        if self.online {
            self.spawn_fetch();
        } else {
            self.load_offline();
        }
    }

    fn load_offline(&mut self) {
        if let Some(name) = self.filters.name_query() {
            // Free-text search needs the remote; the cache only filters by status
            debug!(name, "Name query ignored while offline");
        }

        let status = self.filters.status;
        self.items = self
            .cache
            .filter_by_snapshot(|c| status.map_or(true, |s| c.status == s));
        self.has_more = false;
        self.phase = FeedPhase::Exhausted;
        debug!(count = self.items.len(), "Feed loaded from cache");
    }

    fn spawn_fetch(&mut self) {
        let ticket = FeedTicket {
            generation: self.generation,
            page: self.next_page,
            filters: self.filters.clone(),
        };
        self.in_flight = Some(ticket.clone());
        self.outstanding += 1;

        let remote = Arc::clone(&self.remote);
        let tx = self.result_tx.clone();

        tokio::spawn(async move {
            let result = remote.fetch_page(ticket.page, &ticket.filters).await;
            if let Err(e) = tx.send(PageResult { ticket, result }).await {
                error!(error = %e, "Failed to send page result - channel closed");
            }
        });
    }

    fn apply(&mut self, message: PageResult) -> FeedUpdate {
        if self.in_flight.as_ref() != Some(&message.ticket) {
            debug!(
                generation = message.ticket.generation,
                page = message.ticket.page,
                current_generation = self.generation,
                "Discarding stale page result"
            );
            return FeedUpdate::Stale;
        }
        self.in_flight = None;

        match message.result {
            Ok(page) => {
                debug!(
                    page = message.ticket.page,
                    count = page.items.len(),
                    has_next = page.has_next,
                    "Page applied"
                );
                self.items.extend(page.items);
                self.next_page += 1;
                self.has_more = page.has_next;
                self.phase = if self.has_more {
                    FeedPhase::Loaded
                } else {
                    FeedPhase::Exhausted
                };
                self.cache.replace_snapshot(&self.items);
            }
            Err(e) => {
                warn!(
                    page = message.ticket.page,
                    transient = e.is_transient(),
                    error = %e,
                    "Page fetch failed"
                );
                self.last_error = Some(e.to_string());
                self.phase = FeedPhase::Error;
            }
        }
        FeedUpdate::Applied
    }

    fn receive(&mut self, message: PageResult) -> FeedUpdate {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.apply(message)
    }

    /// Apply every page result that has already arrived, without waiting.
    /// Returns how many results were applied (stale ones are not counted).
    pub fn check_background_tasks(&mut self) -> usize {
        self.sync_connectivity();
        let mut applied = 0;
        while let Ok(message) = self.result_rx.try_recv() {
            if self.receive(message) == FeedUpdate::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next page result and apply it.
    ///
    /// Returns `None` immediately when no fetch is outstanding.
    pub async fn wait_for_result(&mut self) -> Option<FeedUpdate> {
        self.sync_connectivity();
        if self.outstanding == 0 {
            return None;
        }
        let message = self.result_rx.recv().await?;
        Some(self.receive(message))
    }

    /// Keep waiting until the current generation's request has been applied.
    pub async fn wait_until_settled(&mut self) {
        while self.is_loading() {
            if self.wait_for_result().await.is_none() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CharacterId, CharacterStatus, Gender, LocationRef};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    fn character(id: CharacterId, status: CharacterStatus) -> Character {
        Character {
            id,
            name: format!("Character {}", id),
            status,
            species: "Alien".to_string(),
            kind: String::new(),
            gender: Gender::Genderless,
            origin: LocationRef::default(),
            location: LocationRef::default(),
            image: String::new(),
            episodes: Vec::new(),
            url: String::new(),
            created: Utc::now(),
        }
    }

    /// Returns one single-item page per request, recording what was asked.
    #[derive(Default)]
    struct RecordingSource {
        requests: Mutex<Vec<(u32, CharacterFilters)>>,
    }

    #[async_trait]
    impl CharacterSource for RecordingSource {
        async fn fetch_page(
            &self,
            page: u32,
            filters: &CharacterFilters,
        ) -> Result<CharacterPage, ApiError> {
            self.requests.lock().unwrap().push((page, filters.clone()));
            Ok(CharacterPage {
                items: vec![character(page, CharacterStatus::Alive)],
                has_next: true,
                total_count: 100,
            })
        }

        async fn fetch_by_ids(&self, _ids: &[CharacterId]) -> Result<Vec<Character>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn controller(online: bool) -> (FeedController, Arc<RecordingSource>, CharacterCache) {
        let source = Arc::new(RecordingSource::default());
        let cache = CharacterCache::new(Arc::new(MemoryStore::new()));
        let feed = FeedController::new(source.clone(), cache.clone(), online);
        (feed, source, cache)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (feed, _, _) = controller(true);
        assert_eq!(feed.phase(), FeedPhase::Idle);
        assert!(feed.items().is_empty());
        assert!(feed.has_more());
        assert_eq!(feed.next_page(), 1);
    }

    #[tokio::test]
    async fn test_load_next_is_noop_while_loading() {
        let (mut feed, source, _) = controller(true);
        feed.load_next();
        feed.load_next();
        feed.load_next();
        assert!(feed.is_loading());

        feed.wait_until_settled().await;
        assert_eq!(feed.phase(), FeedPhase::Loaded);
        assert_eq!(source.requests.lock().unwrap().len(), 1);
        assert_eq!(feed.next_page(), 2);
    }

    #[tokio::test]
    async fn test_reset_issues_first_page_with_filters() {
        let (mut feed, source, _) = controller(true);
        feed.load_next();
        feed.wait_until_settled().await;
        feed.load_next();
        feed.wait_until_settled().await;
        assert_eq!(feed.items().len(), 2);

        let filters = CharacterFilters::with_status(CharacterStatus::Dead);
        feed.reset(filters.clone());
        assert!(feed.is_loading());
        assert!(feed.items().is_empty());
        feed.wait_until_settled().await;

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.last(), Some(&(1, filters)));
        assert_eq!(feed.items().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_ignores_name_query() {
        let (mut feed, source, cache) = controller(false);
        cache.replace_snapshot(&[
            character(1, CharacterStatus::Alive),
            character(2, CharacterStatus::Dead),
        ]);

        feed.reset(CharacterFilters {
            status: None,
            name: Some("no such name".to_string()),
        });

        assert_eq!(feed.phase(), FeedPhase::Exhausted);
        assert_eq!(feed.items().len(), 2);
        assert!(!feed.has_more());
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_load_next_is_noop() {
        let (mut feed, _, cache) = controller(false);
        cache.replace_snapshot(&[character(1, CharacterStatus::Alive)]);
        feed.load_next();
        assert_eq!(feed.phase(), FeedPhase::Exhausted);

        // Snapshot changes behind the feed's back are not picked up
        cache.replace_snapshot(&[]);
        feed.load_next();
        assert_eq!(feed.items().len(), 1);
    }

    #[tokio::test]
    async fn test_set_online_same_value_does_nothing() {
        let (mut feed, _, _) = controller(true);
        assert!(!feed.set_online(true));
        assert_eq!(feed.phase(), FeedPhase::Idle);
    }

    #[tokio::test]
    async fn test_idle_feed_is_not_rebuilt_on_flip() {
        let (mut feed, source, _) = controller(true);
        assert!(feed.set_online(false));
        assert_eq!(feed.phase(), FeedPhase::Idle);
        assert!(!feed.is_online());
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_result_without_outstanding_returns_none() {
        let (mut feed, _, _) = controller(true);
        assert_eq!(feed.wait_for_result().await, None);
    }

    #[tokio::test]
    async fn test_check_background_tasks_drains_without_blocking() {
        let (mut feed, _, _) = controller(true);
        assert_eq!(feed.check_background_tasks(), 0);

        feed.load_next();
        // Let the spawned fetch run
        while feed.is_loading() {
            tokio::task::yield_now().await;
            feed.check_background_tasks();
        }
        assert_eq!(feed.phase(), FeedPhase::Loaded);
        assert_eq!(feed.items().len(), 1);
    }

    #[tokio::test]
    async fn test_followed_monitor_flip_rebuilds_on_next_load() {
        let source = Arc::new(RecordingSource::default());
        let cache = CharacterCache::new(Arc::new(MemoryStore::new()));
        let (tx, rx) = watch::channel(true);
        let mut feed = FeedController::new(source.clone(), cache.clone(), false)
            .with_connectivity(rx);
        assert!(feed.is_online());

        feed.load_next();
        feed.wait_until_settled().await;
        assert_eq!(cache.read_snapshot().len(), 1);

        tx.send(false).unwrap();
        feed.load_next();

        assert!(!feed.is_online());
        assert_eq!(feed.phase(), FeedPhase::Exhausted);
        assert_eq!(feed.items().len(), 1);
        assert_eq!(source.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_followed_monitor_picked_up_by_reset() {
        let source = Arc::new(RecordingSource::default());
        let cache = CharacterCache::new(Arc::new(MemoryStore::new()));
        let (tx, rx) = watch::channel(false);
        let mut feed = FeedController::new(source.clone(), cache, true).with_connectivity(rx);
        assert!(!feed.is_online());

        tx.send(true).unwrap();
        feed.reset(CharacterFilters::default());
        assert!(feed.is_online());
        assert!(feed.is_loading());
        feed.wait_until_settled().await;

        assert_eq!(source.requests.lock().unwrap().len(), 1);
        assert_eq!(feed.phase(), FeedPhase::Loaded);
    }
}
