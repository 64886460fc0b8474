pub mod app;
pub mod cache;
pub mod core;
pub mod gui;
pub mod persistence;
pub mod store;
pub mod study;
pub mod sync;
