use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::types::{FromSql, Value, ValueRef};

use crate::StorageError;

/// SQL text plus positional arguments (`?1`, `?2`, ...).
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// A single result row. Values are looked up by column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T, StorageError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| StorageError::MissingColumn(column.to_string()))?;

        T::column_result(ValueRef::from(&self.values[idx])).map_err(|e| StorageError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: Vec<Row>,
    rows_affected: usize,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Rows changed by a write statement. Zero for queries.
    pub fn rows_affected(&self) -> usize {
        self.rows_affected
    }
}

impl IntoIterator for Rows {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

pub(crate) fn run(conn: &Connection, statement: &Statement) -> Result<Rows, StorageError> {
    let mut stmt = conn.prepare(&statement.sql)?;
    let params = rusqlite::params_from_iter(statement.args.iter());

    if stmt.column_count() == 0 {
        let rows_affected = stmt.execute(params)?;
        return Ok(Rows {
            rows: Vec::new(),
            rows_affected,
        });
    }

    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query(params)?;
    while let Some(row) = cursor.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(Row {
            columns: columns.clone(),
            values,
        });
    }

    Ok(Rows {
        rows,
        rows_affected: 0,
    })
}
