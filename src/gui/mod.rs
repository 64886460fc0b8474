pub mod actions;
pub mod app;
pub mod confirm_modal;
pub mod error_modal;
pub mod theme;
pub mod top_bar;
pub mod views;

pub use app::FlashdeckApp;
