//! Database connection management.

use crate::store::{validate_identifier, Filter, RelationalStore, Row, TableSpec, Value};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

/// An open SQLite session with foreign-key enforcement enabled.
///
/// The connection is owned exclusively and released when the value is
/// dropped or [`Database::close`]d.
#[derive(Debug)]
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open a new database connection at the specified path.
    ///
    /// If the file doesn't exist, the database will be created. The parent
    /// directory must already exist.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Self::configure_session(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(Self { connection: conn })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_session(&conn)?;
        Ok(Self { connection: conn })
    }

    /// Per-connection settings. SQLite does not persist `foreign_keys`, so
    /// this runs for every new connection.
    fn configure_session(conn: &Connection) -> crate::Result<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Whether the session currently enforces foreign keys.
    pub fn foreign_keys_enabled(&self) -> crate::Result<bool> {
        let enabled: i64 = self
            .connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
        Ok(enabled == 1)
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Release the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> crate::Result<()> {
        self.connection.close().map_err(|(_, e)| e.into())
    }

    fn where_clause(filter: Option<&Filter>) -> crate::Result<(String, Vec<Value>)> {
        match filter {
            Some(filter) if !filter.is_empty() => {
                let (clause, params) = filter.to_sql()?;
                Ok((format!(" WHERE {}", clause), params))
            }
            _ => Ok((String::new(), Vec::new())),
        }
    }
}

impl RelationalStore for Database {
    fn open_or_create(path: &Path) -> crate::Result<Self> {
        Self::open(path)
    }

    fn create_table(&self, spec: &TableSpec) -> crate::Result<()> {
        let sql = spec.to_sql()?;
        self.connection.execute_batch(&sql)?;
        tracing::info!(table = spec.name(), "table declared");
        Ok(())
    }

    fn insert(&self, table: &str, row: &Row) -> crate::Result<i64> {
        validate_identifier(table)?;
        let sql = if row.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            let columns = row
                .columns()
                .map(|column| validate_identifier(column).map(|_| column))
                .collect::<crate::Result<Vec<_>>>()?;
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders
            )
        };

        self.connection.execute(&sql, params_from_iter(row.values()))?;
        let rowid = self.connection.last_insert_rowid();
        tracing::debug!(table, rowid, "row inserted");
        Ok(rowid)
    }

    fn query(&self, table: &str, filter: Option<&Filter>) -> crate::Result<Vec<Row>> {
        validate_identifier(table)?;
        let (where_clause, params) = Self::where_clause(filter)?;
        let sql = format!("SELECT * FROM {}{}", table, where_clause);

        let mut stmt = self.connection.prepare(&sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, column) in columns.iter().enumerate() {
                record.set(column.clone(), row.get::<_, Value>(index)?);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn delete(&self, table: &str, filter: Option<&Filter>) -> crate::Result<usize> {
        validate_identifier(table)?;
        let (where_clause, params) = Self::where_clause(filter)?;
        let sql = format!("DELETE FROM {}{}", table, where_clause);
        let removed = self
            .connection
            .execute(&sql, params_from_iter(params.iter()))?;
        tracing::debug!(table, removed, "rows deleted");
        Ok(removed)
    }

    fn table_names(&self) -> crate::Result<Vec<String>> {
        let mut stmt = self.connection.prepare(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tables = Vec::new();
        for name in names {
            tables.push(name?);
        }
        Ok(tables)
    }

    fn close(self) -> crate::Result<()> {
        Database::close(self)
    }
}
