use crate::utils::error::{LeaseError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_phone, Validate};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 檔案與表單使用的日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 表單允許的最長租期 (月)
pub const MAX_LEASE_MONTHS: u32 = 240;

/// 一筆租約
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub id: u64,
    pub tenant_name: String,
    pub contact_name: String,
    pub phone: String,
    pub unit_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub months: Option<u32>,
    pub rent_amount: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    ExpiringSoon,
    Expired,
}

impl LeaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Active => "active",
            LeaseStatus::ExpiringSoon => "expiring_soon",
            LeaseStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaseStatus {
    type Err = LeaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "active" => Ok(LeaseStatus::Active),
            "expiring_soon" | "expiring" => Ok(LeaseStatus::ExpiringSoon),
            "expired" => Ok(LeaseStatus::Expired),
            other => Err(LeaseError::validation(
                "status",
                format!(
                    "Unknown status '{}'. Valid statuses: active, expiring_soon, expired",
                    other
                ),
            )),
        }
    }
}

impl LeaseRecord {
    /// 距離到期的天數，已過期為負數
    pub fn days_left(&self, as_of: NaiveDate) -> i64 {
        (self.end_date - as_of).num_days()
    }

    pub fn compute_status(&self, as_of: NaiveDate, warn_window_days: u32) -> LeaseStatus {
        let days_left = self.days_left(as_of);
        if days_left < 0 {
            LeaseStatus::Expired
        } else if days_left <= i64::from(warn_window_days) {
            LeaseStatus::ExpiringSoon
        } else {
            LeaseStatus::Active
        }
    }

    /// 仍佔用該單位 (未停用且未過期)
    pub fn holds_unit(&self, as_of: NaiveDate) -> bool {
        self.active && as_of <= self.end_date
    }
}

impl Validate for LeaseRecord {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("tenant_name", &self.tenant_name)?;
        validate_non_empty_string("unit_code", &self.unit_code)?;

        if !self.phone.trim().is_empty() {
            validate_phone("phone", &self.phone)?;
        }

        if self.end_date <= self.start_date {
            return Err(LeaseError::validation(
                "end_date",
                format!(
                    "End date {} must be after start date {}",
                    self.end_date, self.start_date
                ),
            ));
        }

        if self.rent_amount.is_sign_negative() && !self.rent_amount.is_zero() {
            return Err(LeaseError::validation(
                "rent_amount",
                format!("Rent amount {} cannot be negative", self.rent_amount),
            ));
        }

        Ok(())
    }
}

/// 計算結束日：起始日加上月數，月底自動對齊
pub fn calc_end_date(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(months))
}

pub fn parse_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        LeaseError::validation(
            field_name,
            format!("'{}' is not a date in YYYY-MM-DD format ({})", value.trim(), e),
        )
    })
}

/// 表單原始輸入，所有欄位皆為字串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseForm {
    pub id: Option<String>,
    pub tenant_name: String,
    pub contact_name: String,
    pub phone: String,
    pub unit_code: String,
    pub start_date: String,
    pub end_date: String,
    pub months: String,
    pub rent_amount: String,
}

impl LeaseForm {
    /// 表單中指定的 id (更新既有租約時使用)
    pub fn parsed_id(&self) -> Result<Option<u64>> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
                LeaseError::validation("id", format!("'{}' is not a valid record id", raw))
            }),
        }
    }

    /// 解析並驗證表單，未指定 id 時使用 `fallback_id`
    pub fn into_record(self, fallback_id: u64) -> Result<LeaseRecord> {
        let id = self.parsed_id()?.unwrap_or(fallback_id);

        validate_non_empty_string("start_date", &self.start_date)?;
        let start_date = parse_date("start_date", &self.start_date)?;

        let months = match self.months.trim() {
            "" => None,
            raw => {
                let months = raw.parse::<u32>().map_err(|_| {
                    LeaseError::validation("months", format!("'{}' is not a whole number", raw))
                })?;
                if months == 0 || months > MAX_LEASE_MONTHS {
                    return Err(LeaseError::validation(
                        "months",
                        format!("Lease length must be between 1 and {} months", MAX_LEASE_MONTHS),
                    ));
                }
                Some(months)
            }
        };

        let end_date = match (self.end_date.trim(), months) {
            ("", Some(months)) => calc_end_date(start_date, months).ok_or_else(|| {
                LeaseError::validation("months", "Lease end date is out of range")
            })?,
            ("", None) => {
                return Err(LeaseError::validation(
                    "end_date",
                    "Either an end date or a lease length in months is required",
                ))
            }
            (raw, _) => parse_date("end_date", raw)?,
        };

        let rent_raw = self.rent_amount.trim();
        validate_non_empty_string("rent_amount", rent_raw)?;
        let rent_amount = Decimal::from_str(rent_raw).map_err(|_| {
            LeaseError::validation("rent_amount", format!("'{}' is not a number", rent_raw))
        })?;

        let record = LeaseRecord {
            id,
            tenant_name: self.tenant_name.trim().to_string(),
            contact_name: self.contact_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            unit_code: self.unit_code.trim().to_string(),
            start_date,
            end_date,
            months,
            rent_amount,
            active: true,
        };
        record.validate()?;
        Ok(record)
    }
}

/// 查詢條件，未設定的欄位不參與過濾
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaseQuery {
    pub tenant_name: Option<String>,
    pub text: Option<String>,
    pub unit_code: Option<String>,
    pub status: Option<LeaseStatus>,
    pub ends_from: Option<NaiveDate>,
    pub ends_until: Option<NaiveDate>,
    pub include_inactive: bool,
}

impl LeaseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant_name(mut self, name: impl Into<String>) -> Self {
        self.tenant_name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn unit_code(mut self, unit_code: impl Into<String>) -> Self {
        self.unit_code = Some(unit_code.into());
        self
    }

    pub fn status(mut self, status: LeaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn ends_between(mut self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        self.ends_from = from;
        self.ends_until = until;
        self
    }

    pub fn include_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }

    pub fn matches(&self, record: &LeaseRecord, as_of: NaiveDate, warn_window_days: u32) -> bool {
        if !self.include_inactive && !record.active {
            return false;
        }

        if let Some(name) = self.tenant_name.as_deref().map(str::trim) {
            if !name.is_empty() && !contains_ignore_case(&record.tenant_name, name) {
                return false;
            }
        }

        if let Some(text) = self.text.as_deref().map(str::trim) {
            if !text.is_empty()
                && !(contains_ignore_case(&record.tenant_name, text)
                    || contains_ignore_case(&record.contact_name, text)
                    || contains_ignore_case(&record.phone, text))
            {
                return false;
            }
        }

        if let Some(unit_code) = self.unit_code.as_deref() {
            if record.unit_code != unit_code.trim() {
                return false;
            }
        }

        if let Some(status) = self.status {
            if record.compute_status(as_of, warn_window_days) != status {
                return false;
            }
        }

        if self.ends_from.is_some_and(|from| record.end_date < from) {
            return false;
        }
        if self.ends_until.is_some_and(|until| record.end_date > until) {
            return false;
        }

        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
