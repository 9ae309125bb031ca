use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Decimal;
use sqlx::{Connection, Executor as _, PgConnection, Postgres, Row as _, TypeInfo as _, ValueRef as _};
use tracing::{debug, info, warn};

use crate::libs::error::CrudResult;
use crate::libs::executor::Backend;
use crate::libs::query_builder::{SqlValue, Statement};
use crate::libs::row::{Cell, Row};
use crate::libs::schema::FieldKind;

/// Where the driving school database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            dbname: "DrivingSchool".into(),
            user: "postgres".into(),
            password: "postgres".into(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password)
    }
}

/// Owns the single database connection and its open transaction.
///
/// Writes open a transaction lazily on their first statement; it stays open
/// until `commit` or `rollback`. Reads outside a transaction run in
/// autocommit.
pub struct ConnectionManager {
    conn: PgConnection,
    in_transaction: bool,
}

impl ConnectionManager {
    pub async fn connect(config: &ConnectionConfig) -> CrudResult<Self> {
        info!(host = %config.host, dbname = %config.dbname, "connecting");
        let conn = PgConnection::connect_with(&config.connect_options()).await?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Connects from a `postgres://` URL instead of the fixed parameters.
    pub async fn connect_url(url: &str) -> CrudResult<Self> {
        let conn = PgConnection::connect(url).await?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    // -------- Execute raw SQL --------
    /// Runs SQL text as is, outside the CRUD statement builder. May hold
    /// several statements.
    pub async fn raw(&mut self, sql: &str) -> CrudResult<u64> {
        let result = sqlx::raw_sql(sql).execute(&mut self.conn).await?;
        Ok(result.rows_affected())
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub async fn close(mut self) -> CrudResult<()> {
        if self.in_transaction {
            self.rollback().await?;
        }
        self.conn.close().await?;
        info!("connection closed");
        Ok(())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for v in params {
        query = match v {
            SqlValue::Integer(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.as_deref()),
            SqlValue::Date(d) => query.bind(*d),
        };
    }
    query
}

fn attempt<T>(row: &PgRow, index: usize, cell: impl FnOnce(T) -> Cell) -> Option<Cell>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index)
        .ok()
        .map(|v| v.map_or(Cell::Null, cell))
}

fn decode_integer(row: &PgRow, index: usize) -> Option<Cell> {
    attempt(row, index, |v: i32| Cell::Integer(v.into()))
        .or_else(|| attempt(row, index, Cell::Integer))
        .or_else(|| attempt(row, index, |v: i16| Cell::Integer(v.into())))
}

// A non-NULL value no decoder understood still shows up, as its type name.
fn opaque(row: &PgRow, index: usize) -> Cell {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => Cell::Null,
        Ok(raw) => {
            let type_name = raw.type_info().name().to_string();
            debug!(index, %type_name, "no decoder for column");
            Cell::Opaque(type_name)
        }
        Err(e) => {
            debug!(index, error = %e, "no such column");
            Cell::Opaque("unknown".into())
        }
    }
}

// Whatever the column turned out to be on the server side.
fn decode_any(row: &PgRow, index: usize) -> Cell {
    decode_integer(row, index)
        .or_else(|| attempt(row, index, Cell::Float))
        .or_else(|| attempt(row, index, |v: f32| Cell::Float(v.into())))
        .or_else(|| attempt(row, index, |v: Decimal| Cell::Numeric(v.to_string())))
        .or_else(|| attempt(row, index, Cell::Bool))
        .or_else(|| attempt(row, index, Cell::Text))
        .or_else(|| attempt(row, index, Cell::Date))
        .or_else(|| attempt(row, index, Cell::Timestamp))
        .or_else(|| attempt(row, index, Cell::TimestampTz))
        .or_else(|| attempt(row, index, Cell::Time))
        .unwrap_or_else(|| opaque(row, index))
}

fn decode_cell(row: &PgRow, index: usize, kind: FieldKind) -> Cell {
    let declared = match kind {
        FieldKind::Integer => decode_integer(row, index),
        FieldKind::Text => attempt(row, index, Cell::Text),
        FieldKind::Date => attempt(row, index, Cell::Date),
    };
    declared.unwrap_or_else(|| decode_any(row, index))
}

#[async_trait]
impl Backend for ConnectionManager {
    async fn execute(&mut self, stmt: &Statement) -> CrudResult<u64> {
        if !self.in_transaction {
            self.conn.execute(sqlx::raw_sql("BEGIN")).await?;
            self.in_transaction = true;
        }
        debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
        let result = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch_all(&mut self, stmt: &Statement) -> CrudResult<Vec<Row>> {
        debug!(sql = %stmt.sql, "fetch");
        let rows = bind_params(sqlx::query(&stmt.sql), &stmt.params)
            .fetch_all(&mut self.conn)
            .await?;
        let fields = stmt.table.describe().fields;
        Ok(rows
            .iter()
            .map(|r| {
                fields
                    .iter()
                    .enumerate()
                    .map(|(i, f)| decode_cell(r, i, f.kind))
                    .collect()
            })
            .collect())
    }

    async fn commit(&mut self) -> CrudResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.conn.execute(sqlx::raw_sql("COMMIT")).await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> CrudResult<()> {
        if self.in_transaction {
            self.in_transaction = false;
            if let Err(e) = self.conn.execute(sqlx::raw_sql("ROLLBACK")).await {
                warn!(error = %e, "rollback failed");
                return Err(e.into());
            }
        }
        Ok(())
    }
}
