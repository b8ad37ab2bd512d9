//! CSV 租約表的讀寫
//!
//! 檔案第一列為欄位名稱，欄位順序不固定但會在存檔時保留。
//! 無法解析的資料列會回報為警告，並在存檔時原樣寫回。

use crate::domain::model::{parse_date, LeaseRecord, DATE_FORMAT};
use crate::utils::error::{LeaseError, Result};
use crate::utils::validation::Validate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    TenantName,
    ContactName,
    Phone,
    UnitCode,
    StartDate,
    EndDate,
    Months,
    RentAmount,
    Active,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Id,
        Column::TenantName,
        Column::ContactName,
        Column::Phone,
        Column::UnitCode,
        Column::StartDate,
        Column::EndDate,
        Column::Months,
        Column::RentAmount,
        Column::Active,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::TenantName => "tenant_name",
            Column::ContactName => "contact_name",
            Column::Phone => "phone",
            Column::UnitCode => "unit_code",
            Column::StartDate => "start_date",
            Column::EndDate => "end_date",
            Column::Months => "months",
            Column::RentAmount => "rent_amount",
            Column::Active => "active",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Column::ALL.into_iter().find(|c| c.name() == name)
    }

    /// 缺少這些欄位的檔案不視為租約表
    pub fn is_required(&self) -> bool {
        !matches!(self, Column::ContactName | Column::Phone | Column::Months | Column::Active)
    }

    fn render(&self, record: &LeaseRecord) -> String {
        match self {
            Column::Id => record.id.to_string(),
            Column::TenantName => record.tenant_name.clone(),
            Column::ContactName => record.contact_name.clone(),
            Column::Phone => record.phone.clone(),
            Column::UnitCode => record.unit_code.clone(),
            Column::StartDate => record.start_date.format(DATE_FORMAT).to_string(),
            Column::EndDate => record.end_date.format(DATE_FORMAT).to_string(),
            Column::Months => record.months.map(|m| m.to_string()).unwrap_or_default(),
            Column::RentAmount => record.rent_amount.to_string(),
            Column::Active => record.active.to_string(),
        }
    }
}

/// 檔案中的欄位順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    columns: Vec<Column>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }
}

impl TableLayout {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::name).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// 檔案中的行號 (標題列為第 1 行)
    pub line: u64,
    pub message: String,
}

/// 無法解析的資料列，存檔時原樣寫回
///
/// 欄位以原始位元組保存，非 UTF-8 的內容也不會遺失。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub id_hint: Option<u64>,
    values: HashMap<Column, Vec<u8>>,
    /// 超出標題列欄數的欄位
    overflow: Vec<Vec<u8>>,
}

impl RejectedRow {
    pub fn value(&self, column: Column) -> &[u8] {
        self.values.get(&column).map(Vec::as_slice).unwrap_or(b"")
    }

    fn fields<'a>(&'a self, layout: &'a TableLayout) -> impl Iterator<Item = &'a [u8]> + 'a {
        layout
            .columns()
            .iter()
            .map(|c| self.value(*c))
            .chain(self.overflow.iter().map(Vec::as_slice))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecodedTable {
    pub layout: TableLayout,
    pub records: Vec<LeaseRecord>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<RowWarning>,
}

/// 解析標題列，回傳檔案欄位位置對應與版面
fn decode_header(
    headers: &csv::StringRecord,
    source: &Path,
    warnings: &mut Vec<RowWarning>,
) -> Result<(Vec<Option<Column>>, TableLayout)> {
    let mut positions = Vec::with_capacity(headers.len());
    let mut columns = Vec::new();

    for (index, raw) in headers.iter().enumerate() {
        let raw = if index == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        match Column::from_name(raw) {
            Some(column) if columns.contains(&column) => {
                return Err(LeaseError::storage(
                    source,
                    format!("column '{}' appears more than once in the header", column.name()),
                ));
            }
            Some(column) => {
                columns.push(column);
                positions.push(Some(column));
            }
            None => {
                warnings.push(RowWarning {
                    line: 1,
                    message: format!("unknown column '{}' is ignored and dropped on save", raw),
                });
                positions.push(None);
            }
        }
    }

    let missing: Vec<&str> = Column::ALL
        .iter()
        .filter(|c| c.is_required() && !columns.contains(*c))
        .map(Column::name)
        .collect();
    if !missing.is_empty() {
        return Err(LeaseError::storage(
            source,
            format!("header is missing required columns: {}", missing.join(", ")),
        ));
    }

    for column in Column::ALL {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }

    Ok((positions, TableLayout { columns }))
}

fn text_values(
    raw: &HashMap<Column, Vec<u8>>,
) -> std::result::Result<HashMap<Column, String>, String> {
    raw.iter()
        .map(|(column, bytes)| {
            std::str::from_utf8(bytes)
                .map(|text| (*column, text.to_string()))
                .map_err(|_| format!("{} is not valid UTF-8 text", column.name()))
        })
        .collect()
}

fn parse_row(values: &HashMap<Column, String>) -> std::result::Result<LeaseRecord, String> {
    let get = |column: Column| values.get(&column).map(String::as_str).unwrap_or("");

    let id = get(Column::Id)
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("id '{}' is not a valid record id", get(Column::Id)))?;
    let start_date = parse_date("start_date", get(Column::StartDate)).map_err(|e| e.to_string())?;
    let end_date = parse_date("end_date", get(Column::EndDate)).map_err(|e| e.to_string())?;
    let months = match get(Column::Months).trim() {
        "" => None,
        raw => Some(
            raw.parse::<u32>()
                .map_err(|_| format!("months '{}' is not a whole number", raw))?,
        ),
    };
    let rent_raw = get(Column::RentAmount).trim();
    let rent_amount = Decimal::from_str(rent_raw)
        .map_err(|_| format!("rent_amount '{}' is not a number", rent_raw))?;
    let active = match get(Column::Active).trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => return Err(format!("active '{}' is not true or false", other)),
    };

    let record = LeaseRecord {
        id,
        tenant_name: get(Column::TenantName).to_string(),
        contact_name: get(Column::ContactName).to_string(),
        phone: get(Column::Phone).to_string(),
        unit_code: get(Column::UnitCode).to_string(),
        start_date,
        end_date,
        months,
        rent_amount,
        active,
    };
    record.validate().map_err(|e| e.to_string())?;
    Ok(record)
}

pub fn decode<R: io::Read>(reader: R, source: &Path) -> Result<DecodedTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if headers.is_empty() {
        tracing::debug!("{} has no header row, treating as empty", source.display());
        return Ok(DecodedTable::default());
    }

    let mut warnings = Vec::new();
    let (positions, layout) = decode_header(&headers, source, &mut warnings)?;

    let mut records: Vec<LeaseRecord> = Vec::new();
    let mut rejected = Vec::new();
    let mut seen_ids = HashSet::new();

    for (index, row) in csv_reader.byte_records().enumerate() {
        // 標題列為第 1 行
        let fallback_line = index as u64 + 2;
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);

        let mut raw: HashMap<Column, Vec<u8>> = HashMap::new();
        let mut overflow = Vec::new();
        for (position, field) in row.iter().enumerate() {
            match positions.get(position) {
                Some(Some(column)) => {
                    raw.insert(*column, field.to_vec());
                }
                Some(None) => {}
                None => overflow.push(field.to_vec()),
            }
        }

        let outcome = if overflow.is_empty() {
            text_values(&raw)
                .and_then(|values| parse_row(&values))
                .and_then(|record| {
                    if seen_ids.insert(record.id) {
                        Ok(record)
                    } else {
                        Err(format!("duplicate id {}", record.id))
                    }
                })
        } else {
            Err(format!(
                "row has {} fields but the header names only {}",
                row.len(),
                positions.len()
            ))
        };

        match outcome {
            Ok(record) => records.push(record),
            Err(message) => {
                tracing::warn!("⚠️ {} line {}: {}", source.display(), line, message);
                warnings.push(RowWarning { line, message });
                let id_hint = raw
                    .get(&Column::Id)
                    .and_then(|bytes| std::str::from_utf8(bytes).ok())
                    .and_then(|text| text.trim().parse::<u64>().ok());
                rejected.push(RejectedRow {
                    line,
                    id_hint,
                    values: raw,
                    overflow,
                });
            }
        }
    }

    Ok(DecodedTable {
        layout,
        records,
        rejected,
        warnings,
    })
}

pub fn encode<W: io::Write>(
    writer: W,
    layout: &TableLayout,
    records: &[LeaseRecord],
    rejected: &[RejectedRow],
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv_writer.write_record(layout.header())?;

    for record in records {
        csv_writer.write_record(layout.columns().iter().map(|c| c.render(record)))?;
    }
    for row in rejected {
        csv_writer.write_record(row.fields(layout))?;
    }

    csv_writer.flush()?;
    Ok(())
}
