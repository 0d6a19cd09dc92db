use std::str::FromStr;

use rusqlite::types::{Type, ValueRef};
use rusqlite::{ffi, params, Connection, Error as SqlError, Row};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::error::{Operation, StoreError, StoreResult};
use crate::models::{normalize_optional, optional_to_column, Product};

use super::connection::ProductStore;

impl ProductStore {
    /// Every product ordered by name. An empty table yields an empty list.
    pub fn list_all(&self) -> StoreResult<Vec<Product>> {
        self.load_products(Operation::ListAll)
    }

    /// Persist a new product. Fails with `DuplicateKey` when the id is taken,
    /// leaving the existing row untouched.
    pub fn insert(&self, product: &Product) -> StoreResult<()> {
        let op = Operation::Insert;
        validate_product(op, product)?;

        let conn = self.connect(op)?;
        conn.execute(
            "INSERT INTO Products (ProductID, ProductName, Category, UnitPrice, Quantity, Supplier, Status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product.id,
                product.name,
                optional_to_column(&product.category),
                product.unit_price.to_string(),
                product.quantity,
                optional_to_column(&product.supplier),
                optional_to_column(&product.status),
            ],
        )
        .map_err(|err| map_insert_error(err, &product.id))?;

        info!(product_id = %product.id, "product inserted");
        Ok(())
    }

    /// Overwrite all non-key columns of an existing product. There is no
    /// upsert: an unknown id fails with `NotFound` and writes nothing.
    pub fn update(&self, product: &Product) -> StoreResult<()> {
        let op = Operation::Update;
        validate_product(op, product)?;

        let conn = self.connect(op)?;
        let updated = conn
            .execute(
                "UPDATE Products
                 SET ProductName = ?2,
                     Category = ?3,
                     UnitPrice = ?4,
                     Quantity = ?5,
                     Supplier = ?6,
                     Status = ?7
                 WHERE ProductID = ?1",
                params![
                    product.id,
                    product.name,
                    optional_to_column(&product.category),
                    product.unit_price.to_string(),
                    product.quantity,
                    optional_to_column(&product.supplier),
                    optional_to_column(&product.status),
                ],
            )
            .map_err(|err| storage_failure(op, err))?;

        if updated == 0 {
            warn!(product_id = %product.id, "update matched no product");
            return Err(StoreError::not_found(op, &product.id));
        }

        info!(product_id = %product.id, "product updated");
        Ok(())
    }

    /// Permanently remove one product.
    pub fn delete(&self, product_id: &str) -> StoreResult<()> {
        let op = Operation::Delete;
        require_id(op, product_id)?;

        let conn = self.connect(op)?;
        let deleted = conn
            .execute(
                "DELETE FROM Products WHERE ProductID = ?1",
                params![product_id],
            )
            .map_err(|err| storage_failure(op, err))?;

        if deleted == 0 {
            warn!(product_id = %product_id, "delete matched no product");
            return Err(StoreError::not_found(op, product_id));
        }

        info!(product_id = %product_id, "product deleted");
        Ok(())
    }

    /// Full read shared by `list_all` and the query helpers; `op` only
    /// labels errors and log lines.
    pub(crate) fn load_products(&self, op: Operation) -> StoreResult<Vec<Product>> {
        let conn = self.connect(op)?;
        let products = fetch_products(&conn).map_err(|err| storage_failure(op, err))?;
        debug!(operation = %op, rows = products.len(), "loaded products");
        Ok(products)
    }
}

fn fetch_products(conn: &Connection) -> rusqlite::Result<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT ProductID, ProductName, Category, UnitPrice, Quantity, Supplier, Status
         FROM Products
         ORDER BY ProductName, ProductID",
    )?;

    let products = stmt
        .query_map([], product_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(products)
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: normalize_optional(row.get(0)?),
        name: normalize_optional(row.get(1)?),
        category: normalize_optional(row.get(2)?),
        unit_price: read_price(row, 3)?,
        quantity: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        supplier: normalize_optional(row.get(5)?),
        status: normalize_optional(row.get(6)?),
    })
}

/// Decode `UnitPrice`. The column normally holds a decimal string, but REAL and
/// INTEGER values from older files are accepted too, and NULL reads as zero.
fn read_price(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let conversion = |ty: Type, msg: String| {
        SqlError::FromSqlConversionFailure(idx, ty, msg.into())
    };

    match row.get_ref(idx)? {
        ValueRef::Null => Ok(Decimal::ZERO),
        ValueRef::Integer(value) => Ok(Decimal::from(value)),
        ValueRef::Real(value) => Decimal::from_f64(value)
            .ok_or_else(|| conversion(Type::Real, format!("price {value} is not representable"))),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|err| conversion(Type::Text, err.to_string()))?;
            Decimal::from_str(text.trim())
                .map_err(|err| conversion(Type::Text, format!("price '{text}': {err}")))
        }
        ValueRef::Blob(_) => Err(SqlError::InvalidColumnType(
            idx,
            "UnitPrice".to_string(),
            Type::Blob,
        )),
    }
}

fn require_id(op: Operation, id: &str) -> StoreResult<()> {
    if id.trim().is_empty() {
        warn!(operation = %op, "rejected empty ProductID");
        return Err(StoreError::invalid(op, "ProductID is required"));
    }
    Ok(())
}

/// Store-side guard for the non-negative price/quantity invariant, so a
/// caller that skips form validation still cannot write bad rows.
fn validate_product(op: Operation, product: &Product) -> StoreResult<()> {
    require_id(op, &product.id)?;

    let reason = if product.name.trim().is_empty() {
        Some("ProductName is required")
    } else if product.unit_price < Decimal::ZERO {
        Some("UnitPrice must not be negative")
    } else if product.quantity < 0 {
        Some("Quantity must not be negative")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            warn!(operation = %op, product_id = %product.id, reason, "rejected product");
            Err(StoreError::invalid(op, format!("{reason} (ProductID '{}')", product.id)))
        }
        None => Ok(()),
    }
}

/// Primary-key and unique violations become `DuplicateKey`; everything else
/// is a storage failure.
fn map_insert_error(err: SqlError, id: &str) -> StoreError {
    if is_key_violation(&err) {
        warn!(product_id = %id, "duplicate ProductID rejected");
        StoreError::DuplicateKey { id: id.to_string() }
    } else {
        storage_failure(Operation::Insert, err)
    }
}

fn is_key_violation(err: &SqlError) -> bool {
    matches!(
        err,
        SqlError::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn storage_failure(op: Operation, err: SqlError) -> StoreError {
    error!(operation = %op, error = %err, "storage failure");
    StoreError::storage(op, err)
}
