use anyhow::Result;
use chrono::{Duration, NaiveDate};
use lease_ledger::core::FixedClock;
use lease_ledger::{LeaseError, LeaseForm, LeaseQuery, LeaseRecord, LeaseStore, StoreConfig};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

fn open(path: &Path) -> Result<LeaseStore<FixedClock>> {
    Ok(LeaseStore::open_with_clock(
        StoreConfig::new(path),
        FixedClock(today()),
    )?)
}

fn lease(id: u64, unit: &str, end_offset_days: i64) -> LeaseRecord {
    LeaseRecord {
        id,
        tenant_name: format!("Shop {}", id),
        contact_name: "Contact".to_string(),
        phone: "0812345678".to_string(),
        unit_code: unit.to_string(),
        start_date: today() - Duration::days(200),
        end_date: today() + Duration::days(end_offset_days),
        months: None,
        rent_amount: Decimal::new(1250075, 2),
        active: true,
    }
}

#[test]
fn test_empty_store_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("leases.csv");
    let mut store = open(&path)?;
    assert!(store.records().is_empty());

    let a = lease(1, "U1", 60);
    store.upsert(a.clone())?;

    let found = store.find(&LeaseQuery::new().unit_code("U1"));
    assert_eq!(found, vec![&a]);

    let err = store.upsert(lease(2, "U1", 90)).unwrap_err();
    assert!(matches!(err, LeaseError::ConflictError { existing_id: 1, .. }));

    // 重新載入後衝突依然成立
    let mut reopened = open(&path)?;
    assert_eq!(reopened.records(), &[a]);
    assert!(reopened.upsert(lease(2, "U1", 90)).is_err());
    Ok(())
}

#[test]
fn test_upcoming_expirations_window() -> Result<()> {
    let dir = TempDir::new()?;
    let mut store = open(&dir.path().join("leases.csv"))?;
    store.upsert(lease(1, "A", 10))?;
    store.upsert(lease(2, "B", 40))?;
    store.upsert(lease(3, "C", -1))?;

    let due: Vec<u64> = store.upcoming_expirations(30).iter().map(|r| r.id).collect();
    assert_eq!(due, vec![3, 1]);
    Ok(())
}

#[test]
fn test_save_load_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("leases.csv");
    {
        let mut store = open(&path)?;
        store.upsert(lease(1, "A", 10))?;
        let mut quoted = lease(2, "B", 400);
        quoted.tenant_name = "Coffee, \"Tea\" & Co".to_string();
        quoted.months = Some(18);
        store.upsert(quoted)?;
        store.deactivate(1)?;
    }
    let first = fs::read(&path)?;

    let store = open(&path)?;
    store.save()?;
    let second = fs::read(&path)?;
    assert_eq!(first, second);

    let reloaded = open(&path)?;
    assert_eq!(reloaded.records(), store.records());
    assert!(!reloaded.get(1).unwrap().active);
    Ok(())
}

#[test]
fn test_hand_edited_file_keeps_bad_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("leases.csv");
    fs::write(
        &path,
        "\
tenant_name,unit_code,id,start_date,end_date,rent_amount
Noodle Bar,A-01,1,2026-01-01,2027-01-01,15000
Typo Shop,A-02,2,2026-13-01,2027-01-01,9000
Sushi Go,A-03,7,2026-01-01,2027-01-01,-20
",
    )?;

    let mut store = open(&path)?;
    assert_eq!(store.records().len(), 1);
    let lines: Vec<u64> = store.warnings().iter().map(|w| w.line).collect();
    assert_eq!(lines, vec![3, 4]);

    // 壞資料列的 id 不會被重複配發
    let added = store.insert(LeaseForm {
        tenant_name: "Fresh Juice".to_string(),
        unit_code: "A-04".to_string(),
        start_date: "2026-10-01".to_string(),
        months: "6".to_string(),
        rent_amount: "7000".to_string(),
        ..LeaseForm::default()
    })?;
    assert_eq!(added.id, 8);

    let saved = fs::read_to_string(&path)?;
    assert!(saved.starts_with("tenant_name,unit_code,id,start_date,end_date,rent_amount,"));
    assert!(saved.contains("Typo Shop,A-02,2,2026-13-01,2027-01-01,9000"));
    assert!(saved.contains("Sushi Go,A-03,7,2026-01-01,2027-01-01,-20"));
    assert!(saved.contains("Fresh Juice,A-04,8,2026-10-01,2027-04-01,7000"));
    Ok(())
}

#[test]
fn test_upserted_record_is_findable_after_reload() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("leases.csv");
    let mut store = open(&path)?;
    let mut record = lease(1, "Z-9", 120);
    record.tenant_name = "Thai Silk House".to_string();
    store.upsert(record.clone())?;

    let reopened = open(&path)?;
    let hits = reopened.find(&LeaseQuery::new().tenant_name("silk"));
    assert_eq!(hits, vec![&record]);
    Ok(())
}

#[test]
fn test_non_lease_file_is_storage_error() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("leases.csv");
    fs::write(&path, "name,amount\nfoo,1\n")?;

    let err = open(&path).unwrap_err();
    let err = err.downcast::<LeaseError>()?;
    assert!(matches!(err, LeaseError::StorageError { .. }));
    // 原檔案不受影響
    assert_eq!(fs::read_to_string(&path)?, "name,amount\nfoo,1\n");
    Ok(())
}
