//! Portfolio site backend: blog reader, news ingestion, contact flows.

mod bootstrap;
mod core;

pub use self::bootstrap::logger;
pub use self::core::{config, error};

pub mod blog;
pub mod contact;
pub mod cron;
pub mod http;
pub mod jobs;
pub mod mail;
pub mod news;
pub mod pagination;
pub mod state;
pub mod store;
