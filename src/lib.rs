#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod storage;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::TomlConfig;
pub use crate::core::{LeaseForm, LeaseQuery, LeaseRecord, LeaseStatus, LeaseStore, StoreConfig};
pub use utils::error::{LeaseError, Result};
