pub mod config;
pub mod errors;
pub mod models;
pub mod tasks;

pub use config::Config;
pub use errors::FlashdeckError;
pub use models::{
    Card,
    ChangeEvent,
    ChangeKind,
    Row,
    Session,
    SetPatch,
    Table,
    UserId,
    VocabSet,
};
