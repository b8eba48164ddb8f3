pub mod config;
pub mod cycle;
pub mod error;
pub mod integration;
pub mod inventory;
pub mod matcher;
pub mod metrics;
pub mod store;
pub mod sweeper;

pub use config::Config;
pub use error::{ReconcileError, Result};
