use crate::core::alerts::{days_left_label, AlertTiers};
use crate::domain::model::{LeaseRecord, DATE_FORMAT};
use chrono::NaiveDate;
use tabled::{builder::Builder, settings::Style};

const HEADER: [&str; 9] = [
    "id", "tenant", "contact", "phone", "unit", "start", "end", "rent", "status",
];

/// 以表格呈現租約，狀態欄顯示剩餘天數
pub fn lease_table(
    records: &[&LeaseRecord],
    as_of: NaiveDate,
    tiers: &AlertTiers,
) -> String {
    let mut builder = Builder::default();
    builder.push_record(HEADER.map(String::from));

    for record in records {
        let status = if record.active {
            days_left_label(record.days_left(as_of), tiers)
        } else {
            "inactive".to_string()
        };
        builder.push_record([
            record.id.to_string(),
            record.tenant_name.clone(),
            record.contact_name.clone(),
            record.phone.clone(),
            record.unit_code.clone(),
            record.start_date.format(DATE_FORMAT).to_string(),
            record.end_date.format(DATE_FORMAT).to_string(),
            record.rent_amount.to_string(),
            status,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}
