//! The relational store capability and the values that flow through it.

use std::path::Path;

pub use rusqlite::types::Value;

/// Operations the bootstrap and the typed stores need from a relational store.
///
/// Implementations own their connection exclusively. Dropping a store
/// releases it; [`RelationalStore::close`] does the same but reports errors.
pub trait RelationalStore: Sized {
    /// Open the store at `path`, creating the file if it is absent, with
    /// referential-integrity enforcement enabled for the session.
    fn open_or_create(path: &Path) -> crate::Result<Self>;

    /// Declare a table unless one with the same name already exists.
    fn create_table(&self, spec: &TableSpec) -> crate::Result<()>;

    /// Insert one row and return its rowid.
    fn insert(&self, table: &str, row: &Row) -> crate::Result<i64>;

    /// Return every row of `table` matching `filter`, in storage order.
    fn query(&self, table: &str, filter: Option<&Filter>) -> crate::Result<Vec<Row>>;

    /// Remove every row of `table` matching `filter` and return how many went.
    fn delete(&self, table: &str, filter: Option<&Filter>) -> crate::Result<usize>;

    /// Names of the user tables currently declared, sorted.
    fn table_names(&self) -> crate::Result<Vec<String>>;

    /// Release the connection.
    fn close(self) -> crate::Result<()>;
}

/// Ordered column → value pairs, used both for inserts and for query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Row::set`].
    pub fn with<C: Into<String>, V: Into<Value>>(mut self, column: C, value: V) -> Self {
        self.set(column, value);
        self
    }

    /// Builder shorthand for a text cell.
    pub fn text<C: Into<String>>(self, column: C, value: &str) -> Self {
        self.with(column, value.to_string())
    }

    /// Set a column, replacing any earlier value for the same column.
    pub fn set<C: Into<String>, V: Into<Value>>(&mut self, column: C, value: V) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read an integer column.
    pub fn integer(&self, column: &str) -> crate::Result<i64> {
        match self.get(column) {
            Some(Value::Integer(value)) => Ok(*value),
            other => Err(crate::Error::generic(format!(
                "Expected integer in column {}, found {:?}",
                column, other
            ))),
        }
    }

    /// Read a nullable text column.
    pub fn optional_text(&self, column: &str) -> crate::Result<Option<String>> {
        match self.get(column) {
            Some(Value::Text(value)) => Ok(Some(value.clone())),
            Some(Value::Null) | None => Ok(None),
            other => Err(crate::Error::generic(format!(
                "Expected text in column {}, found {:?}",
                column, other
            ))),
        }
    }

    /// Read a required text column.
    pub fn required_text(&self, column: &str) -> crate::Result<String> {
        self.optional_text(column)?
            .ok_or_else(|| crate::Error::generic(format!("Missing text in column {}", column)))
    }
}

/// A table declaration: named columns with their type and constraints, plus
/// any table-level constraint clauses such as `FOREIGN KEY (...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    name: String,
    columns: Vec<(String, String)>,
    constraints: Vec<String>,
}

impl TableSpec {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Add a column; `definition` is its type and column constraints.
    pub fn column<N: Into<String>, D: Into<String>>(mut self, name: N, definition: D) -> Self {
        self.columns.push((name.into(), definition.into()));
        self
    }

    /// Add a table-level constraint clause.
    pub fn constraint<S: Into<String>>(mut self, clause: S) -> Self {
        self.constraints.push(clause.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Render the idempotent `CREATE TABLE IF NOT EXISTS` statement.
    pub fn to_sql(&self) -> crate::Result<String> {
        validate_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(crate::Error::generic(format!(
                "Table {} declares no columns",
                self.name
            )));
        }

        let mut parts = Vec::with_capacity(self.columns.len() + self.constraints.len());
        for (name, definition) in &self.columns {
            validate_identifier(name)?;
            parts.push(format!("{} {}", name, definition).trim_end().to_string());
        }
        parts.extend(self.constraints.iter().cloned());

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            self.name,
            parts.join(", ")
        ))
    }
}

/// Row filter for [`RelationalStore::query`] and [`RelationalStore::delete`].
///
/// Conditions are joined with `AND`. Equality values are always bound as
/// parameters; raw expressions are inserted verbatim and must come from
/// trusted code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, Value),
    Raw(String),
}

impl Filter {
    /// `column = value`.
    pub fn eq<C: Into<String>, V: Into<Value>>(column: C, value: V) -> Self {
        Self::default().and_eq(column, value)
    }

    /// A free-form SQL expression, e.g. `"Priority IN ('high', 'urgent')"`.
    pub fn raw<S: Into<String>>(expression: S) -> Self {
        Self::default().and_raw(expression)
    }

    pub fn and_eq<C: Into<String>, V: Into<Value>>(mut self, column: C, value: V) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn and_raw<S: Into<String>>(mut self, expression: S) -> Self {
        self.conditions.push(Condition::Raw(expression.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the `WHERE` clause body and its bound parameters.
    pub fn to_sql(&self) -> crate::Result<(String, Vec<Value>)> {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut params = Vec::new();
        for condition in &self.conditions {
            match condition {
                Condition::Eq(column, value) => {
                    validate_identifier(column)?;
                    if *value == Value::Null {
                        clauses.push(format!("{} IS NULL", column));
                    } else {
                        clauses.push(format!("{} = ?", column));
                        params.push(value.clone());
                    }
                }
                Condition::Raw(expression) => clauses.push(format!("({})", expression)),
            }
        }
        Ok((clauses.join(" AND "), params))
    }
}

/// Accept only plain identifiers (`[A-Za-z_][A-Za-z0-9_]*`) for table and
/// column names, since they are spliced into SQL text.
pub fn validate_identifier(name: &str) -> crate::Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(crate::Error::InvalidIdentifier(name.to_string()))
    }
}
