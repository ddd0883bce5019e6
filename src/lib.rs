pub mod api;
pub mod catalog;
pub mod cli;
pub mod compare;
pub mod config;
pub mod debounce;
pub mod derive;
pub mod i18n;
pub mod logging;
pub mod page_url;
pub mod server;
pub mod state;
pub mod view_state;

// Re-export the types most callers start from
pub use catalog::{Capability, Catalog};
pub use config::AppConfig;
pub use state::AppState;
