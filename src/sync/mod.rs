//! Local mirror of the remote sets and cards.
//!
//! [`SyncEngine`] owns the collection every screen reads from. It loads the
//! whole collection on start and on identity changes, applies local writes
//! after the store accepts them, and folds change-feed events in as targeted
//! merges. A cache snapshot backs the collection when the backend cannot be
//! reached.

mod merge;
mod subscription;

use std::sync::{
    atomic::{
        AtomicBool,
        AtomicU64,
        Ordering,
    },
    Arc,
    Mutex,
    MutexGuard,
    RwLock,
};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{
    debug,
    error,
    info,
    warn,
};

pub use merge::MergeOutcome;
use merge::VersionMap;
pub use subscription::SubscriptionHandle;

use crate::{
    cache::{
        load_snapshot,
        store_snapshot,
        LocalCache,
    },
    core::{
        Card,
        FlashdeckError,
        Session,
        SetPatch,
        Table,
        UserId,
        VocabSet,
    },
    store::{
        ChangeFeed,
        FeedEvent,
        RemoteStore,
    },
};

pub type ChangeNotifier = Arc<dyn Fn() + Send + Sync>;

/// What a reader sees: the collection plus load and error status.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub sets: Vec<VocabSet>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SyncSnapshot {
    pub fn find_set(&self, set_id: &str) -> Option<&VocabSet> {
        self.sets.iter().find(|set| set.id == set_id)
    }
}

/// How a `fetch_all` call settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The remote collection replaced the mirror.
    Fresh,
    /// The fetch failed and the cached snapshot was loaded instead.
    Cached,
    /// The fetch failed and no snapshot was available.
    Empty,
    /// A newer fetch started first; this result was dropped.
    Superseded,
}

struct SyncState {
    sets: Vec<VocabSet>,
    loading: bool,
    error: Option<String>,
    versions: VersionMap,
    user: Option<UserId>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            sets: Vec::new(),
            loading: true,
            error: None,
            versions: VersionMap::default(),
            user: None,
        }
    }
}

struct Shared {
    store: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    state: Mutex<SyncState>,
    generation: AtomicU64,
    subscription: Mutex<Option<SubscriptionHandle>>,
    notifier: RwLock<Option<ChangeNotifier>>,
}

/// Cheap to clone; all clones share one mirror.
#[derive(Clone)]
pub struct SyncEngine {
    shared: Arc<Shared>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RemoteStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                cache,
                state: Mutex::new(SyncState::default()),
                generation: AtomicU64::new(0),
                subscription: Mutex::new(None),
                notifier: RwLock::new(None),
            }),
        }
    }

    /// Called after every state change, from whichever task made it.
    pub fn on_change(&self, notifier: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.shared.notifier.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(notifier));
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let state = self.state();
        SyncSnapshot { sets: state.sets.clone(), loading: state.loading, error: state.error.clone() }
    }

    pub fn sets(&self) -> Vec<VocabSet> {
        self.state().sets.clone()
    }

    pub fn find_set(&self, set_id: &str) -> Option<VocabSet> {
        self.state().sets.iter().find(|set| set.id == set_id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
        self.notify();
    }

    pub fn user(&self) -> Option<UserId> {
        self.state().user.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription().as_ref().map_or(false, |handle| !handle.is_finished())
    }

    /// Switches to `session` (or anonymous), replaces the subscriptions and
    /// reloads the collection for the new scope.
    pub async fn start_session(&self, session: Option<Session>) {
        self.shutdown();
        self.shared.store.authenticate(session.as_ref());

        let user = session.map(|session| session.user_id);
        {
            let mut state = self.state();
            if state.user != user {
                state.sets.clear();
                state.versions.clear();
            }
            state.user = user.clone();
        }
        info!(user = ?user, "starting session");

        self.subscribe().await;
        self.fetch_all().await;
    }

    /// Drops the subscriptions; listener tasks are aborted immediately.
    pub fn shutdown(&self) {
        let handle = self.subscription().take();
        if let Some(handle) = handle {
            debug!(tables = ?handle.tables(), "tearing down change feeds");
            drop(handle);
        }
    }

    pub async fn refetch(&self) -> FetchOutcome {
        self.fetch_all().await
    }

    #[tracing::instrument(name = "sync.fetch_all", skip(self))]
    pub async fn fetch_all(&self) -> FetchOutcome {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scope = {
            let mut state = self.state();
            state.loading = true;
            state.user.clone()
        };
        self.notify();

        let result = self.shared.store.select_sets(scope.as_ref()).await;

        if self.shared.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded fetch");
            return FetchOutcome::Superseded;
        }

        let outcome = match result {
            Ok(rows) => {
                let sets: Vec<VocabSet> = rows.iter().cloned().map(VocabSet::from).collect();
                if let Err(e) = store_snapshot(self.shared.cache.as_ref(), scope.as_ref(), &sets) {
                    warn!("Failed to write cache snapshot: {}", e);
                }

                let mut state = self.state();
                state.versions.rebuild(&rows, Utc::now());
                info!(count = sets.len(), "sets loaded");
                state.sets = sets;
                state.error = None;
                state.loading = false;
                FetchOutcome::Fresh
            }
            Err(e) => {
                error!("Error fetching sets: {}", e);
                let cached = load_snapshot(self.shared.cache.as_ref(), scope.as_ref());

                let mut state = self.state();
                state.error = Some(e.to_string());
                state.loading = false;
                match cached {
                    Some(sets) => {
                        info!(count = sets.len(), "using cached sets");
                        state.sets = sets;
                        FetchOutcome::Cached
                    }
                    None => FetchOutcome::Empty,
                }
            }
        };

        self.notify();
        outcome
    }

    /// Creates an empty set in the current scope. Name validation is the
    /// caller's job.
    pub async fn create_set(&self, name: &str) -> Option<VocabSet> {
        let scope = self.user();
        match self.shared.store.insert_set(name, scope.as_ref()).await {
            Ok(row) => {
                let set = {
                    let mut state = self.state();
                    state.versions.record_live(Table::Sets, &row.id, row.updated_at);
                    merge::upsert_set(&mut state.sets, &row);
                    state.sets.iter().find(|set| set.id == row.id).cloned()
                };
                self.commit();
                Some(set.unwrap_or_else(|| VocabSet::from(row)))
            }
            Err(e) => {
                self.record_error("creating set", e);
                None
            }
        }
    }

    /// Applies `patch` locally before the store confirms it. On failure the
    /// patched field is restored unless something newer already replaced it.
    pub async fn update_set(&self, set_id: &str, patch: SetPatch) -> bool {
        let previous = {
            let mut state = self.state();
            state.sets.iter_mut().find(|set| set.id == set_id).map(|set| {
                let previous = set.name.clone();
                patch.apply(set);
                previous
            })
        };
        if previous.is_some() {
            self.notify();
        }

        match self.shared.store.update_set(set_id, &patch).await {
            Ok(row) => {
                {
                    let mut state = self.state();
                    if !state.versions.is_stale(Table::Sets, &row.id, row.updated_at) {
                        state.versions.record_live(Table::Sets, &row.id, row.updated_at);
                        if let Some(set) = state.sets.iter_mut().find(|set| set.id == row.id) {
                            set.name = row.name.clone();
                        }
                    }
                }
                self.commit();
                true
            }
            Err(e) => {
                if let Some(previous) = previous {
                    let mut state = self.state();
                    if let Some(set) = state.sets.iter_mut().find(|set| set.id == set_id) {
                        if patch.name.as_deref() == Some(set.name.as_str()) {
                            debug!(set_id, "rolling back rename");
                            set.name = previous;
                        }
                    }
                }
                self.record_error("updating set", e);
                false
            }
        }
    }

    pub async fn delete_set(&self, set_id: &str) -> bool {
        match self.shared.store.delete_set(set_id).await {
            Ok(()) => {
                {
                    let now = Utc::now();
                    let mut state = self.state();
                    let card_ids: Vec<String> = state
                        .sets
                        .iter()
                        .filter(|set| set.id == set_id)
                        .flat_map(|set| set.cards.iter().map(|card| card.id.clone()))
                        .collect();
                    for card_id in &card_ids {
                        state.versions.record_deleted(Table::Cards, card_id, now);
                    }
                    state.versions.record_deleted(Table::Sets, set_id, now);
                    merge::remove_set(&mut state.sets, set_id);
                }
                self.commit();
                true
            }
            Err(e) => {
                self.record_error("deleting set", e);
                false
            }
        }
    }

    /// Refused without a remote call when `set_id` is not loaded, since the
    /// new card could not be mirrored.
    pub async fn add_card(&self, set_id: &str, term: &str, definition: &str) -> Option<Card> {
        let loaded = self.state().sets.iter().any(|set| set.id == set_id);
        if !loaded {
            self.record_error("adding card", FlashdeckError::SetNotFound(set_id.to_string()));
            return None;
        }

        match self.shared.store.insert_card(set_id, term, definition).await {
            Ok(row) => {
                {
                    let mut state = self.state();
                    if !state.versions.is_stale(Table::Cards, &row.id, row.updated_at) {
                        state.versions.record_live(Table::Cards, &row.id, row.updated_at);
                        if merge::upsert_card(&mut state.sets, &row).is_none() {
                            debug!(set_id, "set disappeared while adding card");
                        }
                    }
                }
                self.commit();
                Some(Card::from(row))
            }
            Err(e) => {
                self.record_error("adding card", e);
                None
            }
        }
    }

    pub async fn delete_card(&self, set_id: &str, card_id: &str) -> bool {
        match self.shared.store.delete_card(card_id).await {
            Ok(()) => {
                {
                    let mut state = self.state();
                    state.versions.record_deleted(Table::Cards, card_id, Utc::now());
                    if let Some(set) = state.sets.iter_mut().find(|set| set.id == set_id) {
                        set.cards.retain(|card| card.id != card_id);
                    }
                }
                self.commit();
                true
            }
            Err(e) => {
                self.record_error("deleting card", e);
                false
            }
        }
    }

    async fn subscribe(&self) {
        let cancel_token = Arc::new(AtomicBool::new(false));
        let mut handle = SubscriptionHandle::new(cancel_token.clone());

        for table in [Table::Sets, Table::Cards] {
            match self.shared.store.subscribe(table).await {
                Ok(feed) => handle.attach(table, self.spawn_listener(feed, cancel_token.clone())),
                Err(e) => warn!("Failed to subscribe to {} changes: {}", table, e),
            }
        }

        // Replacing drops whatever a concurrent start_session installed.
        *self.subscription() = Some(handle);
    }

    fn spawn_listener(&self, mut feed: ChangeFeed, cancel_token: Arc<AtomicBool>) -> JoinHandle<()> {
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            while let Some(event) = feed.next().await {
                if cancel_token.load(Ordering::Relaxed) {
                    break;
                }
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                SyncEngine { shared }.handle_feed_event(event).await;
            }
            debug!(table = %feed.table(), "change listener stopped");
        })
    }

    async fn handle_feed_event(&self, event: FeedEvent) -> MergeOutcome {
        let change = match event {
            FeedEvent::Change(change) => change,
            FeedEvent::Resync => {
                info!("change feed asked for a resync");
                self.fetch_all().await;
                return MergeOutcome::NeedsRefetch;
            }
        };

        let outcome = {
            let mut state = self.state();
            let SyncState { sets, versions, user, .. } = &mut *state;
            merge::apply_event(sets, versions, user.as_ref(), &change)
        };

        match outcome {
            MergeOutcome::Applied => {
                debug!(table = %change.table, kind = ?change.kind, id = ?change.id(), "merged change");
                self.commit();
            }
            MergeOutcome::Ignored => {
                debug!(table = %change.table, kind = ?change.kind, id = ?change.id(), "ignored change");
            }
            MergeOutcome::NeedsRefetch => {
                debug!(table = %change.table, kind = ?change.kind, "change not mergeable, refetching");
                self.fetch_all().await;
            }
        }
        outcome
    }

    fn record_error(&self, context: &str, e: FlashdeckError) {
        error!("Error {}: {}", context, e);
        self.state().error = Some(e.to_string());
        self.notify();
    }

    /// Persists the current collection and notifies readers.
    fn commit(&self) {
        let (user, sets) = {
            let state = self.state();
            (state.user.clone(), state.sets.clone())
        };
        if let Err(e) = store_snapshot(self.shared.cache.as_ref(), user.as_ref(), &sets) {
            warn!("Failed to write cache snapshot: {}", e);
        }
        self.notify();
    }

    fn notify(&self) {
        let notifier = self.shared.notifier.read().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(notifier) = notifier {
            notifier();
        }
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.shared.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscription(&self) -> MutexGuard<'_, Option<SubscriptionHandle>> {
        self.shared.subscription.lock().unwrap_or_else(|e| e.into_inner())
    }
}
