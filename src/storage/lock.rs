use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::utils::error::{LeaseError, Result};

/// 租約檔旁的 `.lock` 檔鎖，離開作用域時自動解鎖
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn lock_path(data_path: &Path) -> PathBuf {
        let mut name = data_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        data_path.with_file_name(name)
    }

    fn open(data_path: &Path) -> Result<(File, PathBuf)> {
        let lock_path = Self::lock_path(data_path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LeaseError::storage(parent, e.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| LeaseError::storage(&lock_path, e.to_string()))?;
        Ok((file, lock_path))
    }

    pub fn acquire_shared(data_path: &Path) -> Result<Self> {
        let (file, path) = Self::open(data_path)?;
        FileExt::lock_shared(&file).map_err(|e| LeaseError::storage(&path, e.to_string()))?;
        tracing::trace!("Acquired shared lock on {}", path.display());
        Ok(Self { file, path })
    }

    pub fn acquire_exclusive(data_path: &Path) -> Result<Self> {
        let (file, path) = Self::open(data_path)?;
        FileExt::lock_exclusive(&file).map_err(|e| LeaseError::storage(&path, e.to_string()))?;
        tracing::trace!("Acquired exclusive lock on {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
