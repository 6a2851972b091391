/// Driver Capability Module
///
/// The narrow interface the facade needs from a database library. A
/// [`Driver`] opens [`Handle`]s, a handle prepares [`Statement`]s and carries
/// the administrative operations (transactions, attributes, error state).
use crate::core::db::value::{TypeHint, Value};
use crate::core::Result;
use std::collections::BTreeMap;
use std::fmt;

/// Connection descriptor derived from configuration.
///
/// Renders as `driver:host=...;dbname=...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub driver: String,
    pub host: String,
    pub dbname: String,
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:host={};dbname={}", self.driver, self.host, self.dbname)
    }
}

/// Column names and raw values of an executed query, before shaping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Error state of the last operation on a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Five-character SQLSTATE, `00000` when the last operation succeeded
    pub sqlstate: String,
    pub driver_code: Option<i32>,
    pub message: Option<String>,
}

impl ErrorInfo {
    pub const SUCCESS: &'static str = "00000";

    pub fn success() -> Self {
        ErrorInfo {
            sqlstate: Self::SUCCESS.to_string(),
            driver_code: None,
            message: None,
        }
    }
}

/// Handle attributes readable through [`Handle::get_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    DriverName,
    ClientVersion,
    ServerVersion,
    AutoCommit,
    /// Lock wait timeout in seconds
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

/// Opens handles from a descriptor and credentials.
pub trait Driver {
    type Handle: Handle;

    /// Name matched against the descriptor's driver prefix.
    fn name(&self) -> &str;

    /// Driver names this build can connect with.
    fn available_drivers(&self) -> Vec<String>;

    fn connect(
        &self,
        descriptor: &Descriptor,
        username: &str,
        password: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<Self::Handle>;
}

/// A live connection.
pub trait Handle {
    type Statement<'a>: Statement
    where
        Self: 'a;

    fn prepare(&self, sql: &str) -> Result<Self::Statement<'_>>;

    /// Runs one or more statements without parameters and returns the
    /// affected-row count.
    fn exec(&self, sql: &str) -> Result<usize>;

    fn last_insert_id(&self) -> Result<String>;

    fn begin_transaction(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn roll_back(&self) -> Result<()>;
    fn in_transaction(&self) -> bool;

    fn error_code(&self) -> String;
    fn error_info(&self) -> ErrorInfo;

    fn get_attribute(&self, attribute: Attribute) -> Result<AttributeValue>;
    fn set_attribute(&self, attribute: Attribute, value: AttributeValue) -> Result<()>;

    /// Quotes `value` for literal embedding in SQL text.
    fn quote(&self, value: &str, hint: TypeHint) -> String;
}

/// A prepared statement with positional parameters.
pub trait Statement {
    /// Binds `value` at the 1-based `position`. A `None` hint leaves the
    /// conversion to the driver.
    fn bind_value(&mut self, position: usize, value: &Value, hint: Option<TypeHint>) -> Result<()>;

    /// Executes a statement that returns no rows; yields the affected-row count.
    fn execute(&mut self) -> Result<usize>;

    /// Executes the statement and collects at most `limit` rows.
    fn query(&mut self, limit: Option<usize>) -> Result<RawRows>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_display() {
        let descriptor = Descriptor {
            driver: "mysql".to_string(),
            host: "localhost".to_string(),
            dbname: "test".to_string(),
        };
        assert_eq!(descriptor.to_string(), "mysql:host=localhost;dbname=test");
    }

    #[test]
    fn test_error_info_success() {
        let info = ErrorInfo::success();
        assert_eq!(info.sqlstate, "00000");
        assert!(info.driver_code.is_none());
        assert!(info.message.is_none());
    }
}
