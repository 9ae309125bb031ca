use serde_json::{Map, Value};

use crate::libs::error::{CrudError, CrudResult};
use crate::libs::row::Row;
use crate::libs::schema::{FieldSchema, Table};

/// The four buttons under every form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudAction {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudAction {
    pub const ALL: [CrudAction; 4] = [
        CrudAction::Create,
        CrudAction::Read,
        CrudAction::Update,
        CrudAction::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CrudAction::Create => "Create",
            CrudAction::Read => "Read",
            CrudAction::Update => "Update",
            CrudAction::Delete => "Delete",
        }
    }

    pub fn from_label(label: &str) -> Option<CrudAction> {
        Self::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Raw text of each input, in field order.
#[derive(Debug, Clone)]
pub struct FormState {
    table: Table,
    values: Vec<String>,
}

impl FormState {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            values: vec![String::new(); table.describe().fields.len()],
        }
    }

    fn index(&self, field: &str) -> CrudResult<usize> {
        self.table
            .describe()
            .position(field)
            .ok_or_else(|| CrudError::UnknownField(field.to_string()))
    }

    pub fn set(&mut self, field: &str, text: impl Into<String>) -> CrudResult<()> {
        let i = self.index(field)?;
        self.values[i] = text.into();
        Ok(())
    }

    pub fn get(&self, field: &str) -> CrudResult<&str> {
        let i = self.index(field)?;
        Ok(&self.values[i])
    }

    pub fn clear(&mut self, field: &str) -> CrudResult<()> {
        self.set(field, String::new())
    }

    pub fn clear_all(&mut self) {
        self.values.iter_mut().for_each(String::clear);
    }

    /// Copies the current inputs so later edits cannot leak into a running
    /// operation.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.table, self.values.clone())
    }
}

/// The inputs of one form as they were when an action was triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    table: Table,
    values: Vec<String>,
}

impl Snapshot {
    /// # Panics
    /// If `values` does not have one entry per field of `table`.
    pub fn new(table: Table, values: Vec<String>) -> Self {
        assert_eq!(
            values.len(),
            table.describe().fields.len(),
            "snapshot of {} needs one value per field",
            table
        );
        Self { table, values }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The primary key input, untouched.
    pub fn key(&self) -> &str {
        &self.values[0]
    }
}

/// Results grid. Columns match the form's fields.
#[derive(Debug, Clone)]
pub struct Grid {
    columns: Vec<&'static str>,
    rows: Vec<Row>,
}

impl Grid {
    pub fn new(table: Table) -> Self {
        Self {
            columns: table.describe().field_names(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Drops every existing row, then takes the new ones in the given order.
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.rows.clear();
        self.rows.extend(rows);
    }

    pub fn to_json(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut map = Map::new();
                for (col, cell) in self.columns.iter().zip(row) {
                    map.insert(col.to_string(), Value::from(cell));
                }
                Value::Object(map)
            })
            .collect();
        Value::Array(rows)
    }

    /// Plain text table, padded to the widest cell of each column.
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                cells
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(col.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |values: Vec<&str>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:<width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = line(self.columns.clone());
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &cells {
            out.push('\n');
            out.push_str(&line(row.iter().map(String::as_str).collect()));
        }
        out
    }
}

/// One labeled input per field.
#[derive(Debug, Clone, Copy)]
pub struct Input {
    pub label: &'static str,
    pub field: &'static FieldSchema,
}

/// Everything one tab shows: inputs, the button row, the results grid.
#[derive(Debug, Clone)]
pub struct Form {
    table: Table,
    inputs: Vec<Input>,
    pub state: FormState,
    pub grid: Grid,
}

impl Form {
    pub fn build(table: Table) -> Self {
        let inputs = table
            .describe()
            .fields
            .iter()
            .map(|field| Input {
                label: field.name,
                field,
            })
            .collect();
        Self {
            table,
            inputs,
            state: FormState::new(table),
            grid: Grid::new(table),
        }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn buttons(&self) -> [CrudAction; 4] {
        CrudAction::ALL
    }
}
