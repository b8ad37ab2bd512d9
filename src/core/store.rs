use crate::domain::model::{LeaseForm, LeaseQuery, LeaseRecord, LeaseStatus};
use crate::domain::ports::{Clock, SystemClock};
use crate::storage::table::{self, DecodedTable, RejectedRow, RowWarning, TableLayout};
use crate::storage::{write_atomic, FileLock};
use crate::utils::error::{LeaseError, Result};
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_LEASE_FILE: &str = "./data/leases.csv";
pub const DEFAULT_WARN_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub warn_window_days: u32,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            warn_window_days: DEFAULT_WARN_WINDOW_DAYS,
        }
    }

    pub fn with_warn_window(mut self, days: u32) -> Self {
        self.warn_window_days = days;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LEASE_FILE)
    }
}

/// 載入結果摘要
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub file_missing: bool,
    pub warnings: Vec<RowWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// 租約資料的記憶體副本與其背後的 CSV 檔
#[derive(Debug)]
pub struct LeaseStore<C: Clock = SystemClock> {
    config: StoreConfig,
    clock: C,
    layout: TableLayout,
    records: Vec<LeaseRecord>,
    rejected: Vec<RejectedRow>,
    warnings: Vec<RowWarning>,
}

impl LeaseStore<SystemClock> {
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_clock(config, SystemClock)
    }
}

impl<C: Clock> LeaseStore<C> {
    /// 建立空的 store，尚未讀檔
    pub fn new(config: StoreConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            layout: TableLayout::default(),
            records: Vec::new(),
            rejected: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn open_with_clock(config: StoreConfig, clock: C) -> Result<Self> {
        let mut store = Self::new(config, clock);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn records(&self) -> &[LeaseRecord] {
        &self.records
    }

    /// 最近一次載入時無法解析的資料列
    pub fn warnings(&self) -> &[RowWarning] {
        &self.warnings
    }

    pub fn rejected_rows(&self) -> &[RejectedRow] {
        &self.rejected
    }

    pub fn get(&self, id: u64) -> Option<&LeaseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// 重新讀取檔案並取代記憶體中的資料；檔案不存在視為空表
    pub fn load(&mut self) -> Result<LoadReport> {
        let path = self.config.path.clone();

        if !path.exists() {
            tracing::info!(
                "📁 {} does not exist yet, starting with an empty lease table",
                path.display()
            );
            self.replace_state(DecodedTable::default());
            return Ok(LoadReport {
                loaded: 0,
                file_missing: true,
                warnings: Vec::new(),
            });
        }

        let decoded = {
            let _guard = FileLock::acquire_shared(&path)?;
            let file = File::open(&path).map_err(|e| LeaseError::storage(&path, e.to_string()))?;
            table::decode(file, &path).map_err(|e| match e {
                LeaseError::CsvError(e) => LeaseError::storage(&path, e.to_string()),
                other => other,
            })?
        };

        if !decoded.warnings.is_empty() {
            tracing::warn!(
                "⚠️ {} row(s) in {} need attention",
                decoded.warnings.len(),
                path.display()
            );
        }
        self.warn_on_double_booked_units(&decoded.records);

        let report = LoadReport {
            loaded: decoded.records.len(),
            file_missing: false,
            warnings: decoded.warnings.clone(),
        };
        self.replace_state(decoded);
        tracing::info!("📁 Loaded {} lease record(s) from {}", report.loaded, path.display());
        Ok(report)
    }

    fn replace_state(&mut self, decoded: DecodedTable) {
        self.layout = decoded.layout;
        self.records = decoded.records;
        self.rejected = decoded.rejected;
        self.warnings = decoded.warnings;
    }

    fn warn_on_double_booked_units(&self, records: &[LeaseRecord]) {
        let today = self.today();
        for (index, record) in records.iter().enumerate() {
            if !record.holds_unit(today) {
                continue;
            }
            if let Some(other) = records[index + 1..]
                .iter()
                .find(|o| o.unit_code == record.unit_code && o.holds_unit(today))
            {
                tracing::warn!(
                    "⚠️ Unit {} is held by both #{} and #{}",
                    record.unit_code,
                    record.id,
                    other.id
                );
            }
        }
    }

    /// 將目前的資料完整寫回檔案
    pub fn save(&self) -> Result<()> {
        self.persist(&self.records)
    }

    /// 整批取代所有資料 (表格編輯後存檔)，任何一筆不合法則全部不寫入
    pub fn replace_all(&mut self, records: Vec<LeaseRecord>) -> Result<()> {
        let today = self.today();
        let mut seen = HashSet::new();
        for (index, record) in records.iter().enumerate() {
            record.validate()?;
            if !seen.insert(record.id) {
                return Err(LeaseError::validation(
                    "id",
                    format!("id {} appears more than once", record.id),
                ));
            }
            self.check_id_not_rejected(record.id)?;
            if !record.holds_unit(today) {
                continue;
            }
            if let Some(existing) = records[..index]
                .iter()
                .find(|o| o.unit_code == record.unit_code && o.holds_unit(today))
            {
                return Err(LeaseError::ConflictError {
                    unit_code: record.unit_code.clone(),
                    existing_id: existing.id,
                });
            }
        }

        self.persist(&records)?;
        tracing::info!("💾 Replaced lease table with {} record(s)", records.len());
        self.records = records;
        Ok(())
    }

    fn persist(&self, records: &[LeaseRecord]) -> Result<()> {
        let mut buffer = Vec::new();
        table::encode(&mut buffer, &self.layout, records, &self.rejected)?;
        write_atomic(&self.config.path, &buffer)
    }

    /// 下一個可用的 id，包含無法解析資料列中的 id
    pub fn next_id(&self) -> Result<u64> {
        match self
            .records
            .iter()
            .map(|r| r.id)
            .chain(self.rejected.iter().filter_map(|r| r.id_hint))
            .max()
        {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                LeaseError::storage(
                    &self.config.path,
                    format!("id {} is the largest possible id, no new id can be assigned", max),
                )
            }),
        }
    }

    fn check_id_not_rejected(&self, id: u64) -> Result<()> {
        if self.rejected.iter().any(|r| r.id_hint == Some(id)) {
            return Err(LeaseError::validation(
                "id",
                format!("id {} belongs to an unreadable row in the lease file", id),
            ));
        }
        Ok(())
    }

    fn check_unit_available(&self, record: &LeaseRecord) -> Result<()> {
        let today = self.today();
        if !record.holds_unit(today) {
            return Ok(());
        }
        match self
            .records
            .iter()
            .find(|o| o.id != record.id && o.unit_code == record.unit_code && o.holds_unit(today))
        {
            Some(existing) => Err(LeaseError::ConflictError {
                unit_code: record.unit_code.clone(),
                existing_id: existing.id,
            }),
            None => Ok(()),
        }
    }

    /// 驗證後以 id 取代或新增，成功寫檔才更新記憶體
    pub fn upsert(&mut self, record: LeaseRecord) -> Result<UpsertOutcome> {
        record.validate()?;
        self.check_unit_available(&record)?;

        let mut candidate = self.records.clone();
        let outcome = match candidate.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                UpsertOutcome::Replaced
            }
            None => {
                self.check_id_not_rejected(record.id)?;
                candidate.push(record);
                UpsertOutcome::Inserted
            }
        };

        self.persist(&candidate)?;
        self.records = candidate;
        tracing::debug!("Upsert completed: {:?}", outcome);
        Ok(outcome)
    }

    /// 新增一筆表單資料，id 自動配發
    pub fn insert(&mut self, form: LeaseForm) -> Result<LeaseRecord> {
        if form.parsed_id()?.is_some() {
            return Err(LeaseError::validation(
                "id",
                "New contracts get their id assigned automatically",
            ));
        }
        let record = form.into_record(self.next_id()?)?;
        self.upsert(record.clone())?;
        tracing::info!("✅ Added contract #{} for unit {}", record.id, record.unit_code);
        Ok(record)
    }

    /// 以表單整筆取代既有租約，保留停用狀態
    pub fn update(&mut self, form: LeaseForm) -> Result<LeaseRecord> {
        let id = form
            .parsed_id()?
            .ok_or_else(|| LeaseError::validation("id", "An id is required to update a contract"))?;
        let active = self
            .get(id)
            .map(|r| r.active)
            .ok_or(LeaseError::NotFoundError { id })?;

        let mut record = form.into_record(id)?;
        record.active = active;
        self.upsert(record.clone())?;
        tracing::info!("✅ Updated contract #{}", id);
        Ok(record)
    }

    /// 軟刪除：標記為停用，不會從檔案移除
    pub fn deactivate(&mut self, id: u64) -> Result<LeaseRecord> {
        let mut record = self
            .get(id)
            .cloned()
            .ok_or(LeaseError::NotFoundError { id })?;
        if !record.active {
            return Ok(record);
        }
        record.active = false;
        self.upsert(record.clone())?;
        tracing::info!("🗄️ Deactivated contract #{}", id);
        Ok(record)
    }

    /// 依條件查詢，保留檔案順序
    pub fn find(&self, query: &LeaseQuery) -> Vec<&LeaseRecord> {
        let today = self.today();
        self.records
            .iter()
            .filter(|r| query.matches(r, today, self.config.warn_window_days))
            .collect()
    }

    /// 即將到期或已過期的有效租約，依結束日排序
    pub fn upcoming_expirations(&self, window_days: u32) -> Vec<&LeaseRecord> {
        let today = self.today();
        let mut due: Vec<&LeaseRecord> = self
            .records
            .iter()
            .filter(|r| r.active && r.compute_status(today, window_days) != LeaseStatus::Active)
            .collect();
        due.sort_by_key(|r| (r.end_date, r.id));
        due
    }
}
