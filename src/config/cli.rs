use crate::config::toml_config::{TomlConfig, MAX_WINDOW_DAYS};
use crate::config::Settings;
use crate::core::export::ExportFormat;
use crate::domain::model::{LeaseForm, LeaseQuery, LeaseRecord, LeaseStatus, DATE_FORMAT};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, Validate};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "lease-ledger")]
#[command(about = "Manage shop rental lease contracts stored in a CSV file")]
pub struct CliConfig {
    /// Lease file to read and write (default: ./data/leases.csv)
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Days before the end date at which a lease counts as expiring soon
    #[arg(long, global = true)]
    pub warn_days: Option<u32>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Record a new lease contract
    Add(FormArgs),
    /// Replace an existing contract; omitted fields keep their current value
    Update {
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Mark a contract inactive so its unit can be rented again
    Deactivate {
        #[arg(long)]
        id: u64,
    },
    /// Show all contracts
    List {
        /// Include deactivated contracts
        #[arg(long)]
        all: bool,
    },
    /// Search contracts
    Find(QueryArgs),
    /// Show contracts that expire soon or have already expired
    Expiring {
        /// Window in days (default: the configured warning window)
        #[arg(long)]
        within: Option<u32>,
    },
    /// Write matching contracts as CSV, TSV or JSON
    Export {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FormArgs {
    #[arg(long = "tenant")]
    pub tenant_name: Option<String>,
    #[arg(long = "contact")]
    pub contact_name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long = "unit")]
    pub unit_code: Option<String>,
    /// Start date, YYYY-MM-DD
    #[arg(long = "start")]
    pub start_date: Option<String>,
    /// End date, YYYY-MM-DD (computed from --months when omitted)
    #[arg(long = "end")]
    pub end_date: Option<String>,
    #[arg(long)]
    pub months: Option<String>,
    #[arg(long = "rent")]
    pub rent_amount: Option<String>,
}

impl FormArgs {
    /// 轉為表單字串；更新時未提供的欄位沿用 `base`
    pub fn to_form(&self, id: Option<u64>, base: Option<&LeaseRecord>) -> LeaseForm {
        let pick = |given: &Option<String>, current: Option<String>| {
            given.clone().or(current).unwrap_or_default()
        };

        // 只改月數時重新計算結束日
        let recompute_end = self.months.is_some() && self.end_date.is_none();
        let keep_months = self.end_date.is_none() || self.months.is_some();

        LeaseForm {
            id: id.map(|id| id.to_string()),
            tenant_name: pick(&self.tenant_name, base.map(|b| b.tenant_name.clone())),
            contact_name: pick(&self.contact_name, base.map(|b| b.contact_name.clone())),
            phone: pick(&self.phone, base.map(|b| b.phone.clone())),
            unit_code: pick(&self.unit_code, base.map(|b| b.unit_code.clone())),
            start_date: pick(
                &self.start_date,
                base.map(|b| b.start_date.format(DATE_FORMAT).to_string()),
            ),
            end_date: if recompute_end {
                String::new()
            } else {
                pick(
                    &self.end_date,
                    base.map(|b| b.end_date.format(DATE_FORMAT).to_string()),
                )
            },
            months: if keep_months {
                pick(
                    &self.months,
                    base.and_then(|b| b.months).map(|m| m.to_string()),
                )
            } else {
                String::new()
            },
            rent_amount: pick(&self.rent_amount, base.map(|b| b.rent_amount.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// Tenant name contains (case-insensitive)
    #[arg(long)]
    pub name: Option<String>,
    /// Tenant, contact or phone contains (case-insensitive)
    #[arg(long)]
    pub text: Option<String>,
    /// Exact unit code
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub status: Option<LeaseStatus>,
    /// Ends on or after this date
    #[arg(long)]
    pub ends_from: Option<NaiveDate>,
    /// Ends on or before this date
    #[arg(long)]
    pub ends_until: Option<NaiveDate>,
    /// Include deactivated contracts
    #[arg(long)]
    pub all: bool,
}

impl QueryArgs {
    pub fn to_query(&self) -> LeaseQuery {
        LeaseQuery {
            tenant_name: self.name.clone(),
            text: self.text.clone(),
            unit_code: self.unit.clone(),
            status: self.status,
            ends_from: self.ends_from,
            ends_until: self.ends_until,
            include_inactive: self.all,
        }
    }
}

impl CliConfig {
    /// 讀取設定檔 (若有)，再套用命令列覆蓋
    pub fn resolve(&self) -> Result<Settings> {
        let file_config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        file_config.validate()?;

        let mut store = file_config.store_config();
        if let Some(path) = &self.file {
            store.path = path.clone();
        }
        if let Some(days) = self.warn_days {
            store.warn_window_days = days;
        }

        let settings = Settings {
            store,
            tiers: file_config.alert_tiers(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("file", &self.store.path.to_string_lossy())?;
        validate_range("warn_days", self.store.warn_window_days, 0, MAX_WINDOW_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn existing() -> LeaseRecord {
        LeaseRecord {
            id: 4,
            tenant_name: "Noodle Bar".to_string(),
            contact_name: "Somchai".to_string(),
            phone: "0812345678".to_string(),
            unit_code: "A-01".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            months: Some(12),
            rent_amount: Decimal::new(15000, 0),
            active: true,
        }
    }

    #[test]
    fn test_parse_add_command() {
        let config = CliConfig::try_parse_from([
            "lease-ledger",
            "--file",
            "shops.csv",
            "add",
            "--tenant",
            "Noodle Bar",
            "--unit",
            "A-01",
            "--start",
            "2025-01-01",
            "--months",
            "12",
            "--rent",
            "15000",
        ])
        .unwrap();
        assert_eq!(config.file, Some(PathBuf::from("shops.csv")));
        match config.command {
            Command::Add(form) => {
                assert_eq!(form.tenant_name.as_deref(), Some("Noodle Bar"));
                assert_eq!(form.months.as_deref(), Some("12"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_find_with_typed_filters() {
        let config = CliConfig::try_parse_from([
            "lease-ledger",
            "find",
            "--status",
            "expiring-soon",
            "--ends-until",
            "2026-12-31",
        ])
        .unwrap();
        let Command::Find(args) = config.command else {
            panic!("expected find");
        };
        let query = args.to_query();
        assert_eq!(query.status, Some(LeaseStatus::ExpiringSoon));
        assert_eq!(query.ends_until, NaiveDate::from_ymd_opt(2026, 12, 31));

        assert!(CliConfig::try_parse_from(["lease-ledger", "find", "--status", "gone"]).is_err());
    }

    #[test]
    fn test_update_form_keeps_current_values() {
        let args = FormArgs {
            rent_amount: Some("16000".to_string()),
            ..FormArgs::default()
        };
        let form = args.to_form(Some(4), Some(&existing()));
        assert_eq!(form.id.as_deref(), Some("4"));
        assert_eq!(form.tenant_name, "Noodle Bar");
        assert_eq!(form.end_date, "2026-01-01");
        assert_eq!(form.months, "12");
        assert_eq!(form.rent_amount, "16000");
    }

    #[test]
    fn test_update_form_recomputes_end_from_months() {
        let args = FormArgs {
            months: Some("24".to_string()),
            ..FormArgs::default()
        };
        let record = args
            .to_form(Some(4), Some(&existing()))
            .into_record(0)
            .unwrap();
        assert_eq!(record.end_date, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());

        let args = FormArgs {
            end_date: Some("2025-07-01".to_string()),
            ..FormArgs::default()
        };
        let form = args.to_form(Some(4), Some(&existing()));
        assert_eq!(form.months, "");
    }

    #[test]
    fn test_resolve_overrides() {
        let config = CliConfig::try_parse_from([
            "lease-ledger",
            "--warn-days",
            "10",
            "--file",
            "x.csv",
            "list",
        ])
        .unwrap();
        let settings = config.resolve().unwrap();
        assert_eq!(settings.store.path, PathBuf::from("x.csv"));
        assert_eq!(settings.store.warn_window_days, 10);

        let config =
            CliConfig::try_parse_from(["lease-ledger", "--warn-days", "9999", "list"]).unwrap();
        assert!(config.resolve().is_err());
    }
}
