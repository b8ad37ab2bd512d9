use crate::core::alerts::AlertTiers;
use crate::core::store::{StoreConfig, DEFAULT_LEASE_FILE, DEFAULT_WARN_WINDOW_DAYS};
use crate::utils::error::{LeaseError, Result};
use crate::utils::validation::{validate_path, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 提醒天數的上限
pub const MAX_WINDOW_DAYS: u32 = 3650;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub alerts: AlertsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
    pub warn_window_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsSection {
    pub urgent_days: Option<u32>,
    pub warning_days: Option<u32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseError::config("config", format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| LeaseError::config("toml_parsing", format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${LEASE_DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");

        re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(self.store.path.as_deref().unwrap_or(DEFAULT_LEASE_FILE))
    }

    pub fn warn_window_days(&self) -> u32 {
        self.store.warn_window_days.unwrap_or(DEFAULT_WARN_WINDOW_DAYS)
    }

    pub fn alert_tiers(&self) -> AlertTiers {
        let defaults = AlertTiers::default();
        AlertTiers {
            urgent_days: self.alerts.urgent_days.unwrap_or(defaults.urgent_days),
            warning_days: self.alerts.warning_days.unwrap_or(defaults.warning_days),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.store_path()).with_warn_window(self.warn_window_days())
    }
}

pub fn validate_tiers(tiers: &AlertTiers) -> Result<()> {
    validate_range("alerts.urgent_days", tiers.urgent_days, 0, MAX_WINDOW_DAYS)?;
    validate_range("alerts.warning_days", tiers.warning_days, 0, MAX_WINDOW_DAYS)?;
    if tiers.urgent_days > tiers.warning_days {
        return Err(LeaseError::config(
            "alerts.urgent_days",
            format!(
                "urgent_days ({}) cannot exceed warning_days ({})",
                tiers.urgent_days, tiers.warning_days
            ),
        ));
    }
    Ok(())
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("store.path", &self.store_path().to_string_lossy())?;
        validate_range(
            "store.warn_window_days",
            self.warn_window_days(),
            0,
            MAX_WINDOW_DAYS,
        )?;
        validate_tiers(&self.alert_tiers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[store]
path = "/srv/leases/shops.csv"
warn_window_days = 45

[alerts]
urgent_days = 7
warning_days = 45
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("/srv/leases/shops.csv"));
        assert_eq!(config.warn_window_days(), 45);
        assert_eq!(config.alert_tiers().urgent_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.store_path(), PathBuf::from(DEFAULT_LEASE_FILE));
        assert_eq!(config.warn_window_days(), 30);
        assert_eq!(config.alert_tiers(), AlertTiers::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LEASE_LEDGER_TEST_DIR", "/tmp/lease-test");

        let config = TomlConfig::from_toml_str(
            r#"
[store]
path = "${LEASE_LEDGER_TEST_DIR}/leases.csv"
"#,
        )
        .unwrap();
        assert_eq!(
            config.store_path(),
            PathBuf::from("/tmp/lease-test/leases.csv")
        );

        std::env::remove_var("LEASE_LEDGER_TEST_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[alerts]
urgent_days = 40
warning_days = 30
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        assert!(TomlConfig::from_toml_str("[store]\nwarn_window_days = \"soon\"").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\npath = \"leases/file-test.csv\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store_path(), PathBuf::from("leases/file-test.csv"));
        assert!(TomlConfig::from_file("/nonexistent/lease-ledger.toml").is_err());
    }
}
