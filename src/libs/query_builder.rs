use chrono::NaiveDate;

use crate::libs::schema::{FieldKind, Table, TableSchema};

/// A typed bound parameter. NULLs keep their kind so the server sees the
/// column's type rather than an untyped text parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(Option<i64>),
    Text(Option<String>),
    Date(Option<NaiveDate>),
}

impl SqlValue {
    pub fn null(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer => SqlValue::Integer(None),
            FieldKind::Text => SqlValue::Text(None),
            FieldKind::Date => SqlValue::Date(None),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Integer(v) => v.is_none(),
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Date(v) => v.is_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
    Update,
    Delete,
}

/// One rendered statement plus the parameters to bind, in placeholder order.
///
/// Identifiers always come from the static table registry, never from user
/// input. Values always travel as bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub table: Table,
    pub sql: String,
    pub params: Vec<SqlValue>,
}

fn placeholders(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("${}", i)).collect()
}

fn columns(schema: &TableSchema) -> String {
    schema.field_names().join(", ")
}

impl Statement {
    // -------- INSERT INTO t (f..) VALUES ($1..) --------
    pub fn insert(table: Table, values: Vec<SqlValue>) -> Self {
        let schema = table.describe();
        debug_assert_eq!(values.len(), schema.fields.len());
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            schema.name,
            columns(schema),
            placeholders(values.len()).join(", ")
        );
        Self {
            kind: StatementKind::Insert,
            table,
            sql,
            params: values,
        }
    }

    // -------- SELECT f.. FROM t --------
    pub fn select_all(table: Table) -> Self {
        let schema = table.describe();
        Self {
            kind: StatementKind::Select,
            table,
            sql: format!("SELECT {} FROM {}", columns(schema), schema.name),
            params: Vec::new(),
        }
    }

    // -------- UPDATE t SET f1 = $1, .. WHERE pk = $n --------
    /// `values` follows field order; the key is moved to the last parameter.
    pub fn update(table: Table, mut values: Vec<SqlValue>) -> Self {
        let schema = table.describe();
        debug_assert_eq!(values.len(), schema.fields.len());
        let sets: Vec<String> = schema.fields[1..]
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ${}", f.name, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            schema.name,
            sets.join(", "),
            schema.primary_key().name,
            schema.fields.len()
        );
        let key = values.remove(0);
        values.push(key);
        Self {
            kind: StatementKind::Update,
            table,
            sql,
            params: values,
        }
    }

    // -------- DELETE FROM t WHERE pk = $1 --------
    pub fn delete(table: Table, key: SqlValue) -> Self {
        let schema = table.describe();
        Self {
            kind: StatementKind::Delete,
            table,
            sql: format!(
                "DELETE FROM {} WHERE {} = $1",
                schema.name,
                schema.primary_key().name
            ),
            params: vec![key],
        }
    }
}
