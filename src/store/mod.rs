//! Remote row store: CRUD on the `sets` and `cards` tables plus per-table
//! change feeds.

pub mod memory;
pub mod realtime;
pub mod rest;

use async_trait::async_trait;
use futures::stream::{
    BoxStream,
    StreamExt,
};
use tokio::task::JoinHandle;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::core::{
    errors::Result,
    models::{
        CardRow,
        SetRow,
    },
    ChangeEvent,
    Session,
    SetPatch,
    Table,
    UserId,
};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Called whenever the signed-in session changes. Stores that send
    /// credentials with each request pick them up here.
    fn authenticate(&self, _session: Option<&Session>) {}

    /// All sets in `scope` with their cards, newest set first.
    async fn select_sets(&self, scope: Option<&UserId>) -> Result<Vec<SetRow>>;

    async fn insert_set(&self, name: &str, scope: Option<&UserId>) -> Result<SetRow>;

    async fn update_set(&self, set_id: &str, patch: &SetPatch) -> Result<SetRow>;

    /// Deleting a set deletes its cards.
    async fn delete_set(&self, set_id: &str) -> Result<()>;

    async fn insert_card(&self, set_id: &str, term: &str, definition: &str) -> Result<CardRow>;

    async fn delete_card(&self, card_id: &str) -> Result<()>;

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Change(ChangeEvent),
    /// Events may have been missed (reconnect, lag). Reload everything.
    Resync,
}

/// Live change stream for one table. Dropping it stops the producer.
pub struct ChangeFeed {
    table: Table,
    events: BoxStream<'static, FeedEvent>,
    producer: Option<JoinHandle<()>>,
}

impl ChangeFeed {
    pub fn new(table: Table, events: BoxStream<'static, FeedEvent>) -> Self {
        Self { table, events, producer: None }
    }

    /// Ties a background producer task to the lifetime of this feed.
    pub fn with_producer(mut self, producer: JoinHandle<()>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.next().await
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("table", &self.table)
            .field("has_producer", &self.producer.is_some())
            .finish()
    }
}
