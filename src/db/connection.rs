use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, error, info};

use crate::error::{Operation, StoreError, StoreResult};

/// Handle to the on-disk inventory database. It only remembers where the file
/// lives; every operation opens its own connection and drops it on return, so
/// no connection outlives a single call.
#[derive(Debug, Clone)]
pub struct ProductStore {
    path: PathBuf,
}

/// Ensure the database directory, file, and `Products` table exist, then hand
/// back a store bound to that file. Safe to run on every startup: existing
/// rows are never touched.
pub fn ensure_schema(path: impl AsRef<Path>) -> StoreResult<ProductStore> {
    let path = path.as_ref();
    let op = Operation::EnsureSchema;

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            error!(dir = %parent.display(), error = %err, "failed to create data directory");
            StoreError::storage(op, err)
        })?;
    }

    let conn = Connection::open(path).map_err(|err| {
        error!(path = %path.display(), error = %err, "failed to open SQLite database");
        StoreError::storage(op, err)
    })?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS Products (
            ProductID   TEXT PRIMARY KEY,
            ProductName TEXT NOT NULL,
            Category    TEXT,
            UnitPrice   TEXT,
            Quantity    INTEGER,
            Supplier    TEXT,
            Status      TEXT
        )",
        [],
    )
    .map_err(|err| {
        error!(path = %path.display(), error = %err, "failed to create Products table");
        StoreError::storage(op, err)
    })?;

    info!(path = %path.display(), "inventory schema ready");
    Ok(ProductStore {
        path: path.to_path_buf(),
    })
}

impl ProductStore {
    /// Location of the SQLite file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection for one operation. The create flag is left off
    /// so a database removed after startup is reported instead of silently
    /// replaced by an empty file without the table.
    pub(crate) fn connect(&self, op: Operation) -> StoreResult<Connection> {
        debug!(operation = %op, path = %self.path.display(), "opening connection");
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            error!(operation = %op, error = %err, "failed to open SQLite database");
            StoreError::storage(op, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn creates_missing_directories_and_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("Product.db");

        let store = ensure_schema(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        let conn = store.connect(Operation::ListAll).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'Products'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn rerunning_keeps_existing_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Product.db");

        let store = ensure_schema(&path).unwrap();
        store
            .connect(Operation::Insert)
            .unwrap()
            .execute(
                "INSERT INTO Products (ProductID, ProductName) VALUES ('P1', 'Widget')",
                [],
            )
            .unwrap();

        let store = ensure_schema(&path).unwrap();
        let count: i64 = store
            .connect(Operation::ListAll)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM Products", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn corrupt_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Product.db");
        fs::write(&path, vec![0x42; 4096]).unwrap();

        let err = ensure_schema(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StorageUnavailable {
                operation: Operation::EnsureSchema,
                ..
            }
        ));
    }

    #[test]
    fn directory_in_place_of_parent_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = ensure_schema(blocker.join("Product.db")).unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
    }

    #[test]
    fn removed_file_is_reported_not_recreated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Product.db");
        let store = ensure_schema(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let err = store.connect(Operation::ListAll).unwrap_err();
        assert!(matches!(err, StoreError::StorageUnavailable { .. }));
        assert!(!path.exists());
    }
}
