/// Query Execution Module
///
/// Binds positional parameters, executes statements through a driver
/// [`Handle`] and shapes raw result rows into the four fetch shapes.

use crate::core::db::driver::{Handle, RawRows, Statement};
use crate::core::db::value::{detect_type, Value};
use crate::core::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// How a result row is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchShape {
    /// Addressable both by position and by column name
    IndexedAndNamed,
    /// Values in column order
    IndexedOnly,
    /// Column name to value
    AssocOnly,
    /// A JSON object with one field per column
    Object,
}

/// JSON object produced by the [`FetchShape::Object`] shape.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A row addressable by position and by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Looks a value up by column name. With duplicate names the last column wins.
    pub fn get_named(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Column name to value, in column order.
///
/// A repeated column name keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssocRow {
    entries: Vec<(String, Value)>,
}

impl AssocRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Converts the row into a JSON object.
    pub fn to_record(&self) -> Record {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }

    fn insert(&mut self, column: &str, value: Value) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }
}

/// A row in one of the four fetch shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedRow {
    IndexedAndNamed(Row),
    IndexedOnly(Vec<Value>),
    AssocOnly(AssocRow),
    Object(Record),
}

impl ShapedRow {
    pub fn shape(&self) -> FetchShape {
        match self {
            ShapedRow::IndexedAndNamed(_) => FetchShape::IndexedAndNamed,
            ShapedRow::IndexedOnly(_) => FetchShape::IndexedOnly,
            ShapedRow::AssocOnly(_) => FetchShape::AssocOnly,
            ShapedRow::Object(_) => FetchShape::Object,
        }
    }

    pub fn into_row(self) -> Option<Row> {
        match self {
            ShapedRow::IndexedAndNamed(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            ShapedRow::IndexedOnly(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_assoc(self) -> Option<AssocRow> {
        match self {
            ShapedRow::AssocOnly(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            ShapedRow::Object(record) => Some(record),
            _ => None,
        }
    }
}

fn shape_row(columns: &Arc<[String]>, values: Vec<Value>, shape: FetchShape) -> ShapedRow {
    match shape {
        FetchShape::IndexedAndNamed => ShapedRow::IndexedAndNamed(Row {
            columns: Arc::clone(columns),
            values,
        }),
        FetchShape::IndexedOnly => ShapedRow::IndexedOnly(values),
        FetchShape::AssocOnly => ShapedRow::AssocOnly(assoc_row(columns, values)),
        FetchShape::Object => ShapedRow::Object(assoc_row(columns, values).to_record()),
    }
}

fn assoc_row(columns: &[String], values: Vec<Value>) -> AssocRow {
    let mut row = AssocRow::default();
    for (column, value) in columns.iter().zip(values) {
        row.insert(column, value);
    }
    row
}

/// Shapes the first row, or `None` when the result is empty.
pub fn shape_first(raw: RawRows, shape: FetchShape) -> Option<ShapedRow> {
    let columns: Arc<[String]> = raw.columns.into();
    raw.rows
        .into_iter()
        .next()
        .map(|values| shape_row(&columns, values, shape))
}

/// Shapes every row.
pub fn shape_all(raw: RawRows, shape: FetchShape) -> Vec<ShapedRow> {
    let columns: Arc<[String]> = raw.columns.into();
    raw.rows
        .into_iter()
        .map(|values| shape_row(&columns, values, shape))
        .collect()
}

/// Deserializes an object-shaped row into `T`.
pub fn record_into<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(record))?)
}

/// Binds parameters without type hints, leaving conversion to the driver.
/// Used by the structured write helpers.
pub fn bind_untyped<S: Statement>(stmt: &mut S, params: &[Value]) -> Result<()> {
    for (index, value) in params.iter().enumerate() {
        stmt.bind_value(index + 1, value, None)?;
    }
    Ok(())
}

/// Binds parameters with the hint chosen by [`detect_type`].
/// Used by the free-form fetch operations.
pub fn bind_detected<S: Statement>(stmt: &mut S, params: &[Value]) -> Result<()> {
    for (index, value) in params.iter().enumerate() {
        stmt.bind_value(index + 1, value, detect_type(value))?;
    }
    Ok(())
}

/// Query execution service that operates on a driver handle
pub struct QueryExecutor<'a, H: Handle> {
    handle: &'a H,
}

impl<'a, H: Handle> QueryExecutor<'a, H> {
    pub fn new(handle: &'a H) -> Self {
        QueryExecutor { handle }
    }

    /// Prepares `sql`, binds `params` untyped and executes it.
    ///
    /// # Returns
    ///
    /// The number of affected rows.
    pub fn execute_write(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!("Executing write ({} params): {}", params.len(), sql);
        let mut stmt = self.handle.prepare(sql)?;
        bind_untyped(&mut stmt, params)?;
        stmt.execute()
    }

    /// Prepares `sql`, binds `params` with detected hints and collects up to
    /// `limit` rows.
    pub fn execute_query(&self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<RawRows> {
        debug!("Executing query ({} params): {}", params.len(), sql);
        let mut stmt = self.handle.prepare(sql)?;
        bind_detected(&mut stmt, params)?;
        stmt.query(limit)
    }

    pub fn fetch(&self, sql: &str, params: &[Value], shape: FetchShape) -> Result<Option<ShapedRow>> {
        let raw = self.execute_query(sql, params, Some(1))?;
        Ok(shape_first(raw, shape))
    }

    pub fn fetch_all(&self, sql: &str, params: &[Value], shape: FetchShape) -> Result<Vec<ShapedRow>> {
        let raw = self.execute_query(sql, params, None)?;
        Ok(shape_all(raw, shape))
    }
}
