//! In-process store used when no backend is configured, and as the fake
//! backend in tests.
//!
//! Every mutation is published on a broadcast channel the same way the hosted
//! backend publishes committed rows, so subscribers see their own writes
//! echoed back.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{
            AtomicBool,
            AtomicUsize,
            Ordering,
        },
        Mutex,
        MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

use super::{
    ChangeFeed,
    FeedEvent,
    RemoteStore,
};
use crate::core::{
    errors::Result,
    models::{
        CardRow,
        SetRow,
    },
    ChangeEvent,
    ChangeKind,
    FlashdeckError,
    Row,
    SetPatch,
    Table,
    UserId,
    VocabSet,
};

const CHANGE_BUFFER: usize = 1000;

#[derive(Default)]
struct Tables {
    /// Insertion order; selects return newest first.
    sets: Vec<SetRow>,
    cards: Vec<CardRow>,
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    change_tx: broadcast::Sender<ChangeEvent>,
    offline: AtomicBool,
    failures: AtomicUsize,
    select_delays: Mutex<VecDeque<Duration>>,
    select_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            tables: Mutex::new(Tables::default()),
            change_tx,
            offline: AtomicBool::new(false),
            failures: AtomicUsize::new(0),
            select_delays: Mutex::new(VecDeque::new()),
            select_calls: AtomicUsize::new(0),
        }
    }

    /// Store pre-filled with `sets`, owned by `scope`. Ids are kept.
    pub fn seeded(sets: &[VocabSet], scope: Option<&UserId>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables();
            for set in sets.iter().rev() {
                let now = Utc::now();
                tables.sets.push(SetRow {
                    id: set.id.clone(),
                    name: set.name.clone(),
                    user_id: scope.map(|user| user.0.clone()),
                    created_at: now,
                    updated_at: now,
                    cards: None,
                });
                for card in &set.cards {
                    tables.cards.push(CardRow {
                        id: card.id.clone(),
                        set_id: set.id.clone(),
                        term: card.term.clone(),
                        definition: card.definition.clone(),
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
        }
        store
    }

    /// Every call fails with [`FlashdeckError::Offline`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// The next `count` calls fail with a backend error.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Queues an artificial latency for the next select.
    pub fn delay_next_select(&self, delay: Duration) {
        self.select_delays.lock().unwrap_or_else(|e| e.into_inner()).push_back(delay);
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    /// Publishes an arbitrary event, as if another client had written.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.change_tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.change_tx.receiver_count()
    }

    /// Writes a card directly, bypassing the API, and publishes it.
    pub fn external_insert_card(&self, set_id: &str, term: &str, definition: &str) -> CardRow {
        let row = new_card_row(set_id, term, definition);
        self.tables().cards.push(row.clone());
        self.emit(Table::Cards, ChangeKind::Insert, Some(Row::Card(row.clone())), None);
        row
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FlashdeckError::Offline);
        }
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(FlashdeckError::Remote {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn emit(&self, table: Table, kind: ChangeKind, record: Option<Row>, old_id: Option<String>) {
        let event = ChangeEvent { table, kind, record, old_id, commit_timestamp: Utc::now() };
        // No subscribers is fine.
        let _ = self.change_tx.send(event);
    }
}

fn new_card_row(set_id: &str, term: &str, definition: &str) -> CardRow {
    let now = Utc::now();
    CardRow {
        id: Uuid::new_v4().to_string(),
        set_id: set_id.to_string(),
        term: term.to_string(),
        definition: definition.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select_sets(&self, scope: Option<&UserId>) -> Result<Vec<SetRow>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.select_delays.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;

        let tables = self.tables();
        let owner = scope.map(|user| user.0.as_str());
        let rows = tables
            .sets
            .iter()
            .rev()
            .filter(|set| set.user_id.as_deref() == owner)
            .map(|set| {
                let cards =
                    tables.cards.iter().filter(|card| card.set_id == set.id).cloned().collect();
                SetRow { cards: Some(cards), ..set.clone() }
            })
            .collect();
        Ok(rows)
    }

    async fn insert_set(&self, name: &str, scope: Option<&UserId>) -> Result<SetRow> {
        self.check_available()?;

        let now = Utc::now();
        let row = SetRow {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            user_id: scope.map(|user| user.0.clone()),
            created_at: now,
            updated_at: now,
            cards: None,
        };
        self.tables().sets.push(row.clone());
        self.emit(Table::Sets, ChangeKind::Insert, Some(Row::Set(row.clone())), None);
        Ok(row)
    }

    async fn update_set(&self, set_id: &str, patch: &SetPatch) -> Result<SetRow> {
        self.check_available()?;

        let row = {
            let mut tables = self.tables();
            let row = tables
                .sets
                .iter_mut()
                .find(|set| set.id == set_id)
                .ok_or_else(|| FlashdeckError::SetNotFound(set_id.to_string()))?;
            if let Some(name) = &patch.name {
                row.name = name.clone();
            }
            row.updated_at = Utc::now();
            row.clone()
        };
        self.emit(Table::Sets, ChangeKind::Update, Some(Row::Set(row.clone())), None);
        Ok(row)
    }

    async fn delete_set(&self, set_id: &str) -> Result<()> {
        self.check_available()?;

        let removed_cards: Vec<String> = {
            let mut tables = self.tables();
            let before = tables.sets.len();
            tables.sets.retain(|set| set.id != set_id);
            if tables.sets.len() == before {
                // Deleting nothing is not an error for the hosted backend either.
                return Ok(());
            }
            let removed = tables
                .cards
                .iter()
                .filter(|card| card.set_id == set_id)
                .map(|card| card.id.clone())
                .collect();
            tables.cards.retain(|card| card.set_id != set_id);
            removed
        };

        for card_id in removed_cards {
            self.emit(Table::Cards, ChangeKind::Delete, None, Some(card_id));
        }
        self.emit(Table::Sets, ChangeKind::Delete, None, Some(set_id.to_string()));
        Ok(())
    }

    async fn insert_card(&self, set_id: &str, term: &str, definition: &str) -> Result<CardRow> {
        self.check_available()?;

        let row = {
            let mut tables = self.tables();
            if !tables.sets.iter().any(|set| set.id == set_id) {
                return Err(FlashdeckError::Remote {
                    status: 409,
                    message: format!("insert on cards violates foreign key: set {} missing", set_id),
                });
            }
            let row = new_card_row(set_id, term, definition);
            tables.cards.push(row.clone());
            row
        };
        self.emit(Table::Cards, ChangeKind::Insert, Some(Row::Card(row.clone())), None);
        Ok(row)
    }

    async fn delete_card(&self, card_id: &str) -> Result<()> {
        self.check_available()?;

        let removed = {
            let mut tables = self.tables();
            let before = tables.cards.len();
            tables.cards.retain(|card| card.id != card_id);
            tables.cards.len() != before
        };
        if removed {
            self.emit(Table::Cards, ChangeKind::Delete, None, Some(card_id.to_string()));
        }
        Ok(())
    }

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(FlashdeckError::Offline);
        }

        let rx = self.change_tx.subscribe();
        let events = futures::stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.table == table => {
                        return Some((FeedEvent::Change(event), rx));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Change feed lagged by {} messages", n);
                        return Some((FeedEvent::Resync, rx));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed();

        Ok(ChangeFeed::new(table, events))
    }
}
