use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use std::fmt;

/// A single value as returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Time(NaiveTime),
    /// NUMERIC, kept in its exact decimal text.
    Numeric(String),
    /// A non-NULL value of a type the client cannot decode; holds the
    /// server's type name.
    Opaque(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(v) => write!(f, "{}", v),
            Cell::Text(v) | Cell::Numeric(v) => f.write_str(v),
            Cell::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Cell::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Cell::TimestampTz(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f%:z")),
            Cell::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Cell::Opaque(type_name) => write!(f, "<{}>", type_name),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Integer(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Value::Null,
            Cell::Integer(v) => Value::from(*v),
            Cell::Float(v) => Value::from(*v),
            Cell::Bool(v) => Value::from(*v),
            Cell::Text(v) => Value::from(v.as_str()),
            other => Value::from(other.to_string()),
        }
    }
}

/// One result row, columns in the table's field order.
pub type Row = Vec<Cell>;
