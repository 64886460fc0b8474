use std::sync::{
    mpsc,
    Arc,
};

use tokio::runtime::Runtime;
use tracing::debug;

use super::{
    Operation,
    TaskResult,
};
use crate::{
    core::{
        errors::Result,
        SetPatch,
    },
    sync::{
        ChangeNotifier,
        SyncEngine,
    },
};

/// Runs sync operations off the GUI thread and hands their results back
/// through a channel polled once per frame.
pub struct TaskManager {
    runtime: Arc<Runtime>,
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
    engine: SyncEngine,
    waker: Option<ChangeNotifier>,
}

impl TaskManager {
    pub fn new(engine: SyncEngine) -> Result<Self> {
        let runtime = Arc::new(
            tokio::runtime::Builder::new_multi_thread()
                .thread_name("flashdeck-sync")
                .enable_all()
                .build()?,
        );

        let (sender, receiver) = mpsc::channel();

        Ok(Self { runtime, receiver, sender, engine, waker: None })
    }

    /// Called after each result is queued, so an idle GUI wakes up for it.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn poll_results(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();

        while let Ok(result) = self.receiver.try_recv() {
            results.push(result);
        }

        results
    }

    pub fn dispatch(&self, operation: Operation) {
        debug!(operation = operation.name(), "dispatching");

        let sender = self.sender.clone();
        let engine = self.engine.clone();
        let waker = self.waker.clone();

        self.runtime.spawn(async move {
            let result = run(&engine, operation).await;
            if sender.send(result).is_ok() {
                if let Some(waker) = waker {
                    waker();
                }
            }
        });
    }

    /// Drops the change feeds. Pending operations are abandoned with the
    /// runtime.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

async fn run(engine: &SyncEngine, operation: Operation) -> TaskResult {
    match operation {
        Operation::StartSession(session) => {
            engine.start_session(session).await;
            TaskResult::SessionStarted
        }
        Operation::Refresh => TaskResult::Refreshed(engine.refetch().await),
        Operation::CreateSet { name } => TaskResult::SetCreated(engine.create_set(&name).await),
        Operation::RenameSet { set_id, name } => {
            let ok = engine.update_set(&set_id, SetPatch::rename(name)).await;
            TaskResult::SetRenamed { set_id, ok }
        }
        Operation::DeleteSet { set_id } => {
            let ok = engine.delete_set(&set_id).await;
            TaskResult::SetDeleted { set_id, ok }
        }
        Operation::AddCard { set_id, card } => {
            let card = engine.add_card(&set_id, &card.term, &card.definition).await;
            TaskResult::CardAdded { set_id, card }
        }
        Operation::DeleteCard { set_id, card_id } => {
            let ok = engine.delete_card(&set_id, &card_id).await;
            TaskResult::CardDeleted { set_id, card_id, ok }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{
        Duration,
        Instant,
    };

    use super::*;
    use crate::{
        cache::MemoryCache,
        study::NewCard,
        store::MemoryStore,
    };

    fn wait_for(manager: &mut TaskManager, count: usize) -> Vec<TaskResult> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.len() < count && Instant::now() < deadline {
            results.extend(manager.poll_results());
            std::thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn operations_report_back_through_the_channel() {
        let engine = SyncEngine::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new()));
        let mut manager = TaskManager::new(engine).unwrap();

        manager.dispatch(Operation::StartSession(None));
        assert_eq!(wait_for(&mut manager, 1), vec![TaskResult::SessionStarted]);

        manager.dispatch(Operation::CreateSet { name: "Verbs".to_string() });
        let created = match wait_for(&mut manager, 1).pop() {
            Some(TaskResult::SetCreated(Some(set))) => set,
            other => panic!("unexpected result: {:?}", other),
        };

        manager.dispatch(Operation::AddCard {
            set_id: created.id.clone(),
            card: NewCard { term: "ir".to_string(), definition: "to go".to_string() },
        });
        let added = wait_for(&mut manager, 1);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].task_type(), "add_card");
        assert!(added[0].succeeded());

        assert_eq!(manager.engine().find_set(&created.id).unwrap().cards.len(), 1);
        manager.shutdown();
    }

    #[test]
    fn waker_runs_after_each_result() {
        let engine = SyncEngine::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new()));
        let woken = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = woken.clone();
        let mut manager = TaskManager::new(engine).unwrap().with_waker(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        manager.dispatch(Operation::Refresh);
        let results = wait_for(&mut manager, 1);

        assert_eq!(results, vec![TaskResult::Refreshed(crate::sync::FetchOutcome::Fresh)]);
        let deadline = Instant::now() + Duration::from_secs(5);
        while woken.load(std::sync::atomic::Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(woken.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
