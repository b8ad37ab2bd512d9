pub mod alerts;
pub mod export;
pub mod store;

pub use crate::domain::model::{LeaseForm, LeaseQuery, LeaseRecord, LeaseStatus};
pub use crate::domain::ports::{Clock, FixedClock, SystemClock};
pub use crate::utils::error::Result;
pub use store::{LeaseStore, LoadReport, StoreConfig, UpsertOutcome};
