pub mod toml_config;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, FormArgs, QueryArgs};

use crate::core::alerts::AlertTiers;
use crate::core::store::StoreConfig;

/// 合併設定檔與命令列後的最終設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreConfig,
    pub tiers: AlertTiers,
}
