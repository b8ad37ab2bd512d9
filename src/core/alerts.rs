//! 到期提醒：預設 15 天為緊急、30 天為提醒

use crate::domain::model::LeaseRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTiers {
    pub urgent_days: u32,
    pub warning_days: u32,
}

impl Default for AlertTiers {
    fn default() -> Self {
        Self {
            urgent_days: 15,
            warning_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertLevel {
    Clear,
    Warning,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirySummary {
    /// 0..=urgent_days 天內到期
    pub within_urgent: usize,
    /// 0..=warning_days 天內到期 (包含緊急)
    pub within_warning: usize,
    pub expired: usize,
    pub level: AlertLevel,
    pub tiers: AlertTiers,
}

impl ExpirySummary {
    pub fn message(&self) -> String {
        let mut message = match self.level {
            AlertLevel::Urgent => format!(
                "{} contract(s) expire within {} days",
                self.within_urgent, self.tiers.urgent_days
            ),
            AlertLevel::Warning => format!(
                "{} contract(s) expire within {} days",
                self.within_warning, self.tiers.warning_days
            ),
            AlertLevel::Clear => format!(
                "No contracts expire within {} days",
                self.tiers.warning_days
            ),
        };
        if self.expired > 0 {
            message.push_str(&format!("; {} active contract(s) already expired", self.expired));
        }
        message
    }
}

pub fn summarize<'a, I>(records: I, as_of: NaiveDate, tiers: &AlertTiers) -> ExpirySummary
where
    I: IntoIterator<Item = &'a LeaseRecord>,
{
    let mut summary = ExpirySummary {
        within_urgent: 0,
        within_warning: 0,
        expired: 0,
        level: AlertLevel::Clear,
        tiers: *tiers,
    };

    for record in records.into_iter().filter(|r| r.active) {
        let days_left = record.days_left(as_of);
        if days_left < 0 {
            summary.expired += 1;
            continue;
        }
        if days_left <= i64::from(tiers.urgent_days) {
            summary.within_urgent += 1;
        }
        if days_left <= i64::from(tiers.warning_days) {
            summary.within_warning += 1;
        }
    }

    summary.level = if summary.within_urgent > 0 {
        AlertLevel::Urgent
    } else if summary.within_warning > 0 {
        AlertLevel::Warning
    } else {
        AlertLevel::Clear
    };
    summary
}

pub fn days_left_label(days_left: i64, tiers: &AlertTiers) -> String {
    if days_left < 0 {
        format!("expired {} days ago", -days_left)
    } else if days_left <= i64::from(tiers.urgent_days) {
        format!("urgent: {} days left", days_left)
    } else if days_left <= i64::from(tiers.warning_days) {
        format!("reminder: {} days left", days_left)
    } else {
        format!("{} days left", days_left)
    }
}
