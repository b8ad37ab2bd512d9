use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaseError {
    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Unit '{unit_code}' is already leased by active record #{existing_id}")]
    ConflictError { unit_code: String, existing_id: u64 },

    #[error("Lease record #{id} not found")]
    NotFoundError { id: u64 },

    #[error("Storage error at {}: {message}", .path.display())]
    StorageError { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error on '{field}': {message}")]
    ConfigError { field: String, message: String },
}

/// 錯誤分類，決定 CLI 的退出碼與提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Conflict,
    Storage,
    Config,
}

impl LeaseError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LeaseError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn storage(path: &Path, message: impl Into<String>) -> Self {
        LeaseError::StorageError {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        LeaseError::ConfigError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LeaseError::ValidationError { .. } | LeaseError::NotFoundError { .. } => {
                ErrorCategory::Input
            }
            LeaseError::ConflictError { .. } => ErrorCategory::Conflict,
            LeaseError::StorageError { .. }
            | LeaseError::IoError(_)
            | LeaseError::CsvError(_)
            | LeaseError::SerializationError(_) => ErrorCategory::Storage,
            LeaseError::ConfigError { .. } => ErrorCategory::Config,
        }
    }

    /// 錯誤欄位名稱 (僅輸入類錯誤)
    pub fn field(&self) -> Option<&str> {
        match self {
            LeaseError::ValidationError { field, .. } => Some(field.as_str()),
            LeaseError::ConflictError { .. } => Some("unit_code"),
            LeaseError::ConfigError { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LeaseError::ValidationError { field, message } => {
                format!("Invalid value for {}: {}", field, message)
            }
            LeaseError::ConflictError {
                unit_code,
                existing_id,
            } => format!(
                "Unit {} is still rented under contract #{}",
                unit_code, existing_id
            ),
            LeaseError::NotFoundError { id } => format!("No contract with id {}", id),
            LeaseError::StorageError { path, message } => {
                format!("Could not access {}: {}", path.display(), message)
            }
            LeaseError::IoError(e) => format!("File system error: {}", e),
            LeaseError::CsvError(e) => format!("Lease file could not be processed: {}", e),
            LeaseError::SerializationError(e) => format!("Export failed: {}", e),
            LeaseError::ConfigError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the highlighted field and submit the form again",
            ErrorCategory::Conflict => {
                "Deactivate the existing contract or wait until it has expired"
            }
            ErrorCategory::Storage => {
                "Make sure the lease file is writable and not open in another program, then retry"
            }
            ErrorCategory::Config => "Fix the configuration file or command line flags",
        }
    }
}

pub type Result<T> = std::result::Result<T, LeaseError>;
