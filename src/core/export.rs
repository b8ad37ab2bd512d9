use crate::domain::model::{LeaseRecord, LeaseStatus};
use crate::utils::error::{LeaseError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// Excel 需要 BOM 才能正確辨識 UTF-8 的 CSV
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = LeaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            other => Err(LeaseError::validation(
                "format",
                format!("Unsupported format '{}'. Valid formats: csv, tsv, json", other),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: u64,
    tenant_name: &'a str,
    contact_name: &'a str,
    phone: &'a str,
    unit_code: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    months: Option<u32>,
    rent_amount: Decimal,
    active: bool,
    status: LeaseStatus,
    days_left: i64,
}

impl<'a> ExportRow<'a> {
    fn new(record: &'a LeaseRecord, as_of: NaiveDate, warn_window_days: u32) -> Self {
        Self {
            id: record.id,
            tenant_name: &record.tenant_name,
            contact_name: &record.contact_name,
            phone: &record.phone,
            unit_code: &record.unit_code,
            start_date: record.start_date,
            end_date: record.end_date,
            months: record.months,
            rent_amount: record.rent_amount,
            active: record.active,
            status: record.compute_status(as_of, warn_window_days),
            days_left: record.days_left(as_of),
        }
    }
}

fn delimited(rows: &[ExportRow<'_>], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| LeaseError::IoError(e.into_error()))
}

/// 匯出查詢結果，附加計算後的狀態與剩餘天數
pub fn export(
    records: &[&LeaseRecord],
    as_of: NaiveDate,
    warn_window_days: u32,
    format: ExportFormat,
) -> Result<Vec<u8>> {
    let rows: Vec<ExportRow<'_>> = records
        .iter()
        .map(|r| ExportRow::new(r, as_of, warn_window_days))
        .collect();

    tracing::debug!("Exporting {} record(s) as {}", rows.len(), format.extension());

    match format {
        ExportFormat::Csv => {
            let mut out = UTF8_BOM.to_vec();
            out.extend(delimited(&rows, b',')?);
            Ok(out)
        }
        ExportFormat::Tsv => delimited(&rows, b'\t'),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(&rows)?),
    }
}
