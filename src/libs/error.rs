//! Error types for CRUD operations.

use sqlx::postgres::PgDatabaseError;
use thiserror::Error;

/// Result type alias for CRUD operations.
pub type CrudResult<T> = Result<T, CrudError>;

/// Everything a CRUD operation can report back to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrudError {
    /// The database rejected the statement or the connection failed.
    /// Carries the driver's message verbatim.
    #[error("{0}")]
    Database(String),

    #[error("invalid value for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("unknown field: {0}")]
    UnknownField(String),
}

impl CrudError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CrudError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Joins a server error the way libpq prints it: the message, then the
/// `DETAIL:` and `HINT:` lines when the server sent them.
pub fn server_error_text(message: &str, detail: Option<&str>, hint: Option<&str>) -> String {
    let mut text = message.to_string();
    if let Some(detail) = detail {
        text.push_str("\nDETAIL:  ");
        text.push_str(detail);
    }
    if let Some(hint) = hint {
        text.push_str("\nHINT:  ");
        text.push_str(hint);
    }
    text
}

impl From<sqlx::Error> for CrudError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => match db.try_downcast_ref::<PgDatabaseError>() {
                Some(pg) => CrudError::Database(server_error_text(
                    pg.message(),
                    pg.detail(),
                    pg.hint(),
                )),
                None => CrudError::Database(db.message().to_string()),
            },
            other => CrudError::Database(other.to_string()),
        }
    }
}
