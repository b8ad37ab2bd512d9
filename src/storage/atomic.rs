use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::storage::lock::FileLock;
use crate::utils::error::{LeaseError, Result};

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LeaseError::storage(path, "invalid lease file path"))?;
    Ok(path.with_file_name(format!(".{}.tmp-{}", name, std::process::id())))
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// 先寫入同目錄暫存檔再 rename 覆蓋，期間持有獨佔鎖
///
/// 失敗時刪除暫存檔，原檔案保持不變。
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| LeaseError::storage(parent, e.to_string()))?;

    let _guard = FileLock::acquire_exclusive(path)?;
    let tmp_path = temp_path(path)?;

    let outcome = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)?;
        fsync_dir(parent)
    })();

    if let Err(e) = outcome {
        let _ = fs::remove_file(&tmp_path);
        tracing::error!("❌ Failed to write {}: {}", path.display(), e);
        return Err(LeaseError::storage(path, e.to_string()));
    }

    tracing::debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("leases.csv");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_failed_rename_keeps_original() {
        let dir = TempDir::new().unwrap();
        // 目標是一個非空目錄，rename 必定失敗
        let path = dir.path().join("leases.csv");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), b"original").unwrap();

        let err = write_atomic(&path, b"new").unwrap_err();
        assert!(matches!(err, LeaseError::StorageError { .. }));
        assert_eq!(fs::read(path.join("keep.txt")).unwrap(), b"original");
        assert!(!temp_path(&path).unwrap().exists());
    }

    #[test]
    fn test_failed_temp_write_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leases.csv");
        write_atomic(&path, b"id,tenant_name\n1,Noodle Bar\n").unwrap();

        // 暫存檔路徑已被目錄佔用
        fs::create_dir(temp_path(&path).unwrap()).unwrap();

        let err = write_atomic(&path, b"replacement").unwrap_err();
        assert!(matches!(err, LeaseError::StorageError { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"id,tenant_name\n1,Noodle Bar\n");
    }
}
