// SQLite tables as row sources

use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use sentinel_recon::{Row, Value};

use crate::error::SourceError;
use crate::RowSource;

pub struct SqliteSource {
    conn: Connection,
    label: String,
}

impl SqliteSource {
    /// Open read-only and check the connection with `SELECT 1`.
    pub fn open(path: &Path, label: &str) -> Result<Self, SourceError> {
        let connect_err = |e: rusqlite::Error| SourceError::Connect {
            label: label.to_string(),
            message: format!("{}: {e}", path.display()),
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connect_err)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(connect_err)?;

        log::debug!("{label}: opened {}", path.display());
        Ok(Self { conn, label: label.to_string() })
    }

    fn fetch_err(&self, table: &str, e: impl std::fmt::Display) -> SourceError {
        SourceError::Fetch {
            label: self.label.clone(),
            table: table.to_string(),
            message: e.to_string(),
        }
    }
}

impl RowSource for SqliteSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch_table(&self, table: &str, filter: Option<&str>) -> Result<Vec<Row>, SourceError> {
        let mut query = format!("SELECT * FROM {}", quote_table(table));
        if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
            query.push_str(" WHERE ");
            query.push_str(filter);
        }

        let mut stmt = self.conn.prepare(&query).map_err(|e| self.fetch_err(table, e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([]).map_err(|e| self.fetch_err(table, e))?;
        let mut out = Vec::new();
        while let Some(sql_row) = rows.next().map_err(|e| self.fetch_err(table, e))? {
            let mut row = Row::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value = sql_row.get_ref(i).map_err(|e| self.fetch_err(table, e))?;
                row.insert(column.as_str(), from_sql(value));
            }
            out.push(row);
        }

        log::debug!("{}: fetched {} row(s) from {table}", self.label, out.len());
        Ok(out)
    }

    fn primary_key(&self, table: &str) -> Result<Vec<String>, SourceError> {
        let introspect_err = |e: rusqlite::Error| SourceError::Introspect {
            label: self.label.clone(),
            table: table.to_string(),
            message: e.to_string(),
        };

        // pk is the 1-based position within the key, 0 for non-key columns
        let mut stmt = self
            .conn
            .prepare("SELECT name, pk FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
            .map_err(introspect_err)?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(introspect_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(introspect_err)?;
        Ok(names)
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
    }
}

/// Quote each dot-separated part as an SQL identifier (`main.t` → `"main"."t"`).
fn quote_table(table: &str) -> String {
    table
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Create (or replace) `table` in the database at `path` from a DDL column
/// list and insert `rows`. Columns are taken from each row in order.
pub fn write_table(path: &Path, table: &str, columns_ddl: &str, rows: &[Row]) -> Result<(), String> {
    let mut conn = Connection::open(path).map_err(|e| e.to_string())?;
    let quoted = quote_table(table);

    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {quoted}; CREATE TABLE {quoted} ({columns_ddl});"
    ))
    .map_err(|e| e.to_string())?;

    let tx = conn.transaction().map_err(|e| e.to_string())?;
    for row in rows {
        let columns: Vec<String> = row.columns().map(quote_table).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {quoted} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        tx.execute(&sql, params_from_iter(row.iter().map(|(_, v)| to_sql(v))))
            .map_err(|e| e.to_string())?;
    }
    tx.commit().map_err(|e| e.to_string())?;

    Ok(())
}
