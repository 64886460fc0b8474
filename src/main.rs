use std::sync::Arc;

use eframe::egui;
use flashdeck::{
    cache::FileCache,
    core::{
        tasks::TaskManager,
        Card,
        Config,
        VocabSet,
    },
    gui::FlashdeckApp,
    store::{
        MemoryStore,
        RemoteStore,
        RestStore,
    },
    sync::SyncEngine,
};
use tracing::{
    error,
    info,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn main() -> eframe::Result {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flashdeck=info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    let config = Config::load();

    let store: Arc<dyn RemoteStore> = if config.is_offline() {
        Arc::new(MemoryStore::seeded(&[demo_set()], config.user().as_ref()))
    } else {
        match RestStore::new(&config) {
            Ok(store) => {
                info!(url = ?config.backend_url, "using remote backend");
                Arc::new(store)
            }
            Err(e) => {
                error!("Backend client unavailable, falling back to the local store: {}", e);
                Arc::new(MemoryStore::seeded(&[demo_set()], config.user().as_ref()))
            }
        }
    };

    let cache = Arc::new(FileCache::new(config.cache_dir.clone()));
    let engine = SyncEngine::new(store, cache);

    let task_manager = match TaskManager::new(engine.clone()) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to start the sync runtime: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title("VocabLearn"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "VocabLearn",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let task_manager = task_manager.with_waker(move || ctx.request_repaint());
            Ok(Box::new(FlashdeckApp::new(cc, &config, task_manager)))
        }),
    );

    engine.shutdown();
    result
}

/// Starter set for the in-process store, large enough to take a test.
fn demo_set() -> VocabSet {
    let cards = [
        ("hola", "hello"),
        ("gracias", "thank you"),
        ("perro", "dog"),
        ("gato", "cat"),
        ("libro", "book"),
    ];

    VocabSet {
        id: "demo-spanish".to_string(),
        name: "Spanish Basics".to_string(),
        cards: cards
            .iter()
            .enumerate()
            .map(|(i, (term, definition))| Card {
                id: format!("demo-spanish-{i}"),
                term: term.to_string(),
                definition: definition.to_string(),
            })
            .collect(),
    }
}
