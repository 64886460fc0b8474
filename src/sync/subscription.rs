use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use tokio::task::JoinHandle;

use crate::core::Table;

/// Owns the listener tasks of one subscription scope. Dropping the handle
/// cancels them, which also drops their feeds and closes the channels.
pub struct SubscriptionHandle {
    cancel_token: Arc<AtomicBool>,
    listeners: Vec<(Table, JoinHandle<()>)>,
}

impl SubscriptionHandle {
    pub fn new(cancel_token: Arc<AtomicBool>) -> Self {
        Self { cancel_token, listeners: Vec::new() }
    }

    pub fn attach(&mut self, table: Table, listener: JoinHandle<()>) {
        self.listeners.push((table, listener));
    }

    pub fn tables(&self) -> Vec<Table> {
        self.listeners.iter().map(|(table, _)| *table).collect()
    }

    pub fn cancel(&self) {
        self.cancel_token.store(true, Ordering::Relaxed);
        for (_, listener) in &self.listeners {
            listener.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.listeners.iter().all(|(_, listener)| listener.is_finished())
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("tables", &self.tables())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
