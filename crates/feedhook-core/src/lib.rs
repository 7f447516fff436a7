pub mod config;
pub mod error;
pub mod feed;
pub mod health;
pub mod notify;
pub mod scheduler;
pub mod store;

pub use config::{AppConfig, ErrorPolicy};
pub use error::{Error, Result};
