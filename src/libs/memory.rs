//! In-memory backend used by the unit tests. Interprets the structured
//! statement rather than its SQL text.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::libs::error::{CrudError, CrudResult, server_error_text};
use crate::libs::executor::Backend;
use crate::libs::query_builder::{SqlValue, Statement, StatementKind};
use crate::libs::row::{Cell, Row};
use crate::libs::schema::Table;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: HashMap<Table, Vec<Row>>,
    // Copy of `tables` taken when the current transaction began.
    backup: Option<HashMap<Table, Vec<Row>>>,
    statements: Vec<String>,
    fail_execute: Option<String>,
    fail_commit: Option<String>,
    disconnected: bool,
    commits: usize,
    rollbacks: usize,
}

fn to_cell(value: &SqlValue) -> Cell {
    match value {
        SqlValue::Integer(v) => v.map_or(Cell::Null, Cell::Integer),
        SqlValue::Text(v) => v.clone().map_or(Cell::Null, Cell::Text),
        SqlValue::Date(v) => v.map_or(Cell::Null, Cell::Date),
    }
}

// `key = NULL` is never true.
fn key_matches(row: &Row, key: &SqlValue) -> bool {
    !key.is_null() && row[0] == to_cell(key)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    /// The next write is applied, then reported as failed, so only a
    /// rollback can undo it.
    pub fn fail_next_execute(&mut self, message: &str) {
        self.fail_execute = Some(message.to_string());
    }

    pub fn fail_next_commit(&mut self, message: &str) {
        self.fail_commit = Some(message.to_string());
    }

    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    fn apply(&mut self, stmt: &Statement) -> CrudResult<u64> {
        let rows = self.tables.entry(stmt.table).or_default();
        match stmt.kind {
            StatementKind::Insert => {
                let row: Row = stmt.params.iter().map(to_cell).collect();
                if row[0] != Cell::Null && rows.iter().any(|r| r[0] == row[0]) {
                    let schema = stmt.table.describe();
                    return Err(CrudError::Database(server_error_text(
                        &format!(
                            "duplicate key value violates unique constraint \"{}_pkey\"",
                            schema.name
                        ),
                        Some(&format!(
                            "Key ({})=({}) already exists.",
                            schema.primary_key().name,
                            row[0]
                        )),
                        None,
                    )));
                }
                rows.push(row);
                Ok(1)
            }
            StatementKind::Update => {
                let (key, sets) = stmt
                    .params
                    .split_last()
                    .ok_or_else(|| CrudError::Database("update without key".into()))?;
                let mut affected = 0;
                for row in rows.iter_mut().filter(|r| key_matches(r, key)) {
                    for (cell, value) in row[1..].iter_mut().zip(sets) {
                        *cell = to_cell(value);
                    }
                    affected += 1;
                }
                Ok(affected)
            }
            StatementKind::Delete => {
                let key = &stmt.params[0];
                let before = rows.len();
                rows.retain(|r| !key_matches(r, key));
                Ok((before - rows.len()) as u64)
            }
            StatementKind::Select => Err(CrudError::Database(
                "cannot execute a query as a write".into(),
            )),
        }
    }

    fn check_connected(&self) -> CrudResult<()> {
        if self.disconnected {
            return Err(CrudError::Database(
                "server closed the connection unexpectedly".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn execute(&mut self, stmt: &Statement) -> CrudResult<u64> {
        self.check_connected()?;
        if self.backup.is_none() {
            self.backup = Some(self.tables.clone());
        }
        self.statements.push(stmt.sql.clone());

        let affected = self.apply(stmt)?;
        match self.fail_execute.take() {
            Some(message) => Err(CrudError::Database(message)),
            None => Ok(affected),
        }
    }

    async fn fetch_all(&mut self, stmt: &Statement) -> CrudResult<Vec<Row>> {
        self.check_connected()?;
        self.statements.push(stmt.sql.clone());
        Ok(self.tables.get(&stmt.table).cloned().unwrap_or_default())
    }

    async fn commit(&mut self) -> CrudResult<()> {
        self.check_connected()?;
        self.commits += 1;
        if let Some(message) = self.fail_commit.take() {
            return Err(CrudError::Database(message));
        }
        self.backup = None;
        Ok(())
    }

    async fn rollback(&mut self) -> CrudResult<()> {
        self.rollbacks += 1;
        if let Some(backup) = self.backup.take() {
            self.tables = backup;
        }
        self.check_connected()
    }
}
