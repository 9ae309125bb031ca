use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::libs::error::{CrudError, CrudResult};
use crate::libs::form::Snapshot;
use crate::libs::query_builder::{SqlValue, Statement};
use crate::libs::row::Row;
use crate::libs::schema::{FieldKind, FieldSchema, Table};

/// Something that can run rendered statements inside one transaction at a
/// time. The first `execute` after a `commit`/`rollback` starts a new one.
#[async_trait]
pub trait Backend: Send {
    /// Runs a write statement, returns the affected row count.
    async fn execute(&mut self, stmt: &Statement) -> CrudResult<u64>;

    async fn fetch_all(&mut self, stmt: &Statement) -> CrudResult<Vec<Row>>;

    async fn commit(&mut self) -> CrudResult<()>;

    async fn rollback(&mut self) -> CrudResult<()>;
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts non-blank text to the field's kind.
pub fn typed_value(field: &'static FieldSchema, raw: &str) -> CrudResult<SqlValue> {
    match field.kind {
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(|v| SqlValue::Integer(Some(v)))
            .map_err(|e| CrudError::validation(field.name, e.to_string())),
        FieldKind::Text => Ok(SqlValue::Text(Some(raw.to_string()))),
        FieldKind::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(|d| SqlValue::Date(Some(d)))
            .map_err(|e| CrudError::validation(field.name, format!("{} (expected YYYY-MM-DD)", e))),
    }
}

/// Blank (whitespace only) input becomes a NULL of the field's kind.
pub fn form_value(field: &'static FieldSchema, raw: &str) -> CrudResult<SqlValue> {
    if raw.trim().is_empty() {
        Ok(SqlValue::null(field.kind))
    } else {
        typed_value(field, raw)
    }
}

fn form_values(snapshot: &Snapshot) -> CrudResult<Vec<SqlValue>> {
    snapshot
        .table()
        .describe()
        .fields
        .iter()
        .zip(snapshot.values())
        .map(|(field, raw)| form_value(field, raw))
        .collect()
}

/// Runs the four CRUD operations against a backend.
///
/// Every write commits on success and rolls back on any failure before the
/// error is returned. Nothing is retried.
pub struct CrudExecutor<B> {
    backend: B,
}

impl<B: Backend> CrudExecutor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    // -------- Create --------
    pub async fn create(&mut self, snapshot: &Snapshot) -> CrudResult<u64> {
        let values = form_values(snapshot)?;
        self.write(Statement::insert(snapshot.table(), values)).await
    }

    // -------- Read --------
    pub async fn read(&mut self, table: Table) -> CrudResult<Vec<Row>> {
        let rows = self.backend.fetch_all(&Statement::select_all(table)).await?;
        debug!(%table, rows = rows.len(), "read");
        Ok(rows)
    }

    // -------- Update --------
    /// A blank key binds NULL, matches nothing, and still succeeds.
    pub async fn update(&mut self, snapshot: &Snapshot) -> CrudResult<u64> {
        let values = form_values(snapshot)?;
        self.write(Statement::update(snapshot.table(), values)).await
    }

    // -------- Delete --------
    /// Only the key is read, and it is not blank-to-NULL converted.
    pub async fn delete(&mut self, snapshot: &Snapshot) -> CrudResult<u64> {
        let table = snapshot.table();
        let key = typed_value(table.describe().primary_key(), snapshot.key())?;
        self.write(Statement::delete(table, key)).await
    }

    async fn write(&mut self, stmt: Statement) -> CrudResult<u64> {
        let result = match self.backend.execute(&stmt).await {
            Ok(affected) => self.backend.commit().await.map(|()| affected),
            Err(e) => Err(e),
        };
        match result {
            Ok(affected) => {
                info!(table = %stmt.table, kind = ?stmt.kind, affected, "committed");
                Ok(affected)
            }
            Err(e) => {
                warn!(table = %stmt.table, kind = ?stmt.kind, error = %e, "rolling back");
                if let Err(rb) = self.backend.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }
}
