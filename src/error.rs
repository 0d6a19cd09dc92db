//! Typed failures for the persistence and query layer.
//!
//! Callers branch on the variant instead of inspecting SQLite result codes:
//! a rejected record (`DuplicateKey`, `NotFound`, `InvalidArgument`) is
//! something the user can fix, while `StorageUnavailable` means the database
//! itself could not be reached or read.

use std::fmt;
use std::io;

use thiserror::Error;

/// Names the store call that failed so messages can say what was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    EnsureSchema,
    ListAll,
    Insert,
    Update,
    Delete,
    ByCategory,
    LowStock,
    TotalInventoryValue,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::EnsureSchema => "ensure_schema",
            Operation::ListAll => "list_all",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ByCategory => "by_category",
            Operation::LowStock => "low_stock",
            Operation::TotalInventoryValue => "total_inventory_value",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level cause behind a `StorageUnavailable` error.
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors returned by every store and query operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `insert` found an existing record with the same key.
    #[error("ProductID '{id}' already exists")]
    DuplicateKey { id: String },

    /// `update` or `delete` matched zero rows. Usually means the caller is
    /// holding a stale snapshot.
    #[error("{operation}: no product found with ProductID '{id}'")]
    NotFound { operation: Operation, id: String },

    /// The database file or its directory could not be created, opened,
    /// written, or decoded.
    #[error("{operation}: storage unavailable")]
    StorageUnavailable {
        operation: Operation,
        #[source]
        source: StorageFault,
    },

    /// Malformed input crossed the store boundary.
    #[error("{operation}: {reason}")]
    InvalidArgument {
        operation: Operation,
        reason: String,
    },

    /// The inventory total does not fit in a decimal.
    #[error("{operation}: value of ProductID '{id}' overflows the inventory total")]
    ValueOverflow { operation: Operation, id: String },
}

impl StoreError {
    pub fn not_found(operation: Operation, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            operation,
            id: id.into(),
        }
    }

    pub fn invalid(operation: Operation, reason: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    pub fn storage(operation: Operation, fault: impl Into<StorageFault>) -> Self {
        StoreError::StorageUnavailable {
            operation,
            source: fault.into(),
        }
    }

    /// Whether the error is a rejection of the given record rather than an
    /// infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, StoreError::StorageUnavailable { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
