/// SQL Builder Module
///
/// Builds the single-table INSERT, UPDATE and DELETE statements used by the
/// facade's write helpers. Values never reach the SQL text; they travel as
/// positional `?` parameters in the same order as their placeholders.
use crate::core::db::value::Value;
use crate::core::{DbFacadeError, Result};
use tracing::debug;

/// Ordered column/value pairs.
///
/// Behaves like an ordered map: setting an existing column replaces its
/// value without changing its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    entries: Vec<(String, Value)>,
}

/// Match conditions for UPDATE and DELETE, AND-joined in iteration order.
pub type Identifier = ColumnSet;

impl ColumnSet {
    pub fn new() -> Self {
        ColumnSet::default()
    }

    /// Builder-style [`ColumnSet::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

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

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ColumnSet::new();
        for (column, value) in iter {
            set.set(column, value);
        }
        set
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for ColumnSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// SQL text plus the parameters for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltStatement {
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// `INSERT INTO <table> (c1, c2) VALUES (?, ?)`
///
/// # Errors
///
/// Returns `DbFacadeError::Validation` if `data` is empty.
pub fn build_insert(table: &str, data: &ColumnSet) -> Result<BuiltStatement> {
    require_non_empty(data, "insert", "column set")?;

    let columns: Vec<&str> = data.columns().collect();
    let placeholders = vec!["?"; columns.len()];
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );

    debug!("Built insert: {}", sql);
    Ok(BuiltStatement {
        sql,
        params: data.values().cloned().collect(),
    })
}

/// `UPDATE <table> SET c1 = ?, c2 = ? WHERE k1 = ? AND k2 = ?`
///
/// Parameters are the new values followed by the identifier values.
///
/// # Errors
///
/// Returns `DbFacadeError::Validation` if either `data` or `identifier` is empty.
pub fn build_update(table: &str, data: &ColumnSet, identifier: &Identifier) -> Result<BuiltStatement> {
    require_non_empty(data, "update", "column set")?;
    require_non_empty(identifier, "update", "identifier")?;

    let assignments: Vec<String> = data.columns().map(|c| format!("{} = ?", c)).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        table,
        assignments.join(", "),
        where_clause(identifier)
    );

    debug!("Built update: {}", sql);
    Ok(BuiltStatement {
        sql,
        params: data.values().chain(identifier.values()).cloned().collect(),
    })
}

/// `DELETE FROM <table> WHERE k1 = ? AND k2 = ?`
///
/// # Errors
///
/// Returns `DbFacadeError::Validation` if `identifier` is empty.
pub fn build_delete(table: &str, identifier: &Identifier) -> Result<BuiltStatement> {
    require_non_empty(identifier, "delete", "identifier")?;

    let sql = format!("DELETE FROM {} WHERE {}", table, where_clause(identifier));

    debug!("Built delete: {}", sql);
    Ok(BuiltStatement {
        sql,
        params: identifier.values().cloned().collect(),
    })
}

fn where_clause(identifier: &Identifier) -> String {
    identifier
        .columns()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn require_non_empty(set: &ColumnSet, operation: &str, what: &str) -> Result<()> {
    if set.is_empty() {
        return Err(DbFacadeError::Validation(format!(
            "Cannot build {} statement from an empty {}",
            operation, what
        )));
    }
    Ok(())
}

/// Builds a [`ColumnSet`] from `column => value` pairs.
///
/// ```
/// let data = dbfacade::columns! { "name" => "Ann", "age" => 30 };
/// assert_eq!(data.len(), 2);
/// ```
#[macro_export]
macro_rules! columns {
    () => { $crate::ColumnSet::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::ColumnSet::new()$(.with($column, $value))+
    };
}

/// Builds a `Vec<Value>` of positional parameters.
///
/// ```
/// let params = dbfacade::params![2, "Ann"];
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Value::from($value)),+]
    };
}
