/// SQLite Connection Module
///
/// The rusqlite-backed implementation of the driver capability traits:
/// opening handles from a descriptor, tracking the error state of the last
/// operation, transactions and handle attributes.

use crate::core::db::driver::{
    Attribute, AttributeValue, Descriptor, Driver, ErrorInfo, Handle, RawRows, Statement,
};
use crate::core::db::value::{TypeHint, Value};
use crate::core::{DbFacadeError, Result};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const DRIVER_NAME: &str = "sqlite";

/// rusqlite's own default busy timeout
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite takes the busy timeout as a C int of milliseconds.
const MAX_BUSY_TIMEOUT_MILLIS: u64 = i32::MAX as u64;

/// SQLSTATE class 25: invalid transaction state
const INVALID_TRANSACTION_STATE: &str = "25000";

/// Opens SQLite handles. The descriptor's `dbname` is the database path
/// (`:memory:` for an in-memory database); `host` and credentials are unused.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

/// An open SQLite connection plus the error state of its last operation.
#[derive(Debug)]
pub struct SqliteHandle {
    connection: Connection,
    last_error: RefCell<Option<ErrorInfo>>,
    busy_timeout: Cell<Duration>,
}

/// A prepared statement borrowed from a [`SqliteHandle`].
pub struct SqliteStatement<'a> {
    stmt: rusqlite::Statement<'a>,
    handle: &'a SqliteHandle,
}

/// Connection options understood by the SQLite driver.
#[derive(Debug, Clone, PartialEq)]
struct SqliteOptions {
    foreign_keys: bool,
    journal_mode: Option<String>,
    busy_timeout: Option<Duration>,
    read_only: bool,
}

impl SqliteOptions {
    fn parse(options: &BTreeMap<String, String>) -> Result<Self> {
        let mut parsed = SqliteOptions {
            foreign_keys: true,
            journal_mode: None,
            busy_timeout: None,
            read_only: false,
        };

        for (key, value) in options {
            match key.as_str() {
                "foreign_keys" => parsed.foreign_keys = parse_flag(key, value)?,
                "read_only" => parsed.read_only = parse_flag(key, value)?,
                "journal_mode" => {
                    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                        return Err(DbFacadeError::Config(format!(
                            "Invalid journal_mode option: {}",
                            value
                        )));
                    }
                    parsed.journal_mode = Some(value.to_uppercase());
                }
                "busy_timeout" => {
                    let millis = value.parse::<u64>().map_err(|_| {
                        DbFacadeError::Config(format!(
                            "busy_timeout must be a number of milliseconds, got {}",
                            value
                        ))
                    })?;
                    if millis > MAX_BUSY_TIMEOUT_MILLIS {
                        return Err(DbFacadeError::Config(format!(
                            "busy_timeout must be at most {} milliseconds, got {}",
                            MAX_BUSY_TIMEOUT_MILLIS, millis
                        )));
                    }
                    parsed.busy_timeout = Some(Duration::from_millis(millis));
                }
                other => warn!("Ignoring unknown sqlite option: {}", other),
            }
        }

        Ok(parsed)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(DbFacadeError::Config(format!(
            "Option {} expects a boolean, got {}",
            key, value
        ))),
    }
}

impl Driver for SqliteDriver {
    type Handle = SqliteHandle;

    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn available_drivers(&self) -> Vec<String> {
        vec![DRIVER_NAME.to_string()]
    }

    fn connect(
        &self,
        descriptor: &Descriptor,
        username: &str,
        _password: &str,
        options: &BTreeMap<String, String>,
    ) -> Result<SqliteHandle> {
        if descriptor.driver != DRIVER_NAME {
            return Err(DbFacadeError::Connection(format!(
                "could not find driver {}",
                descriptor.driver
            )));
        }
        if descriptor.dbname.is_empty() {
            return Err(DbFacadeError::Config("dbname must name a database file".to_string()));
        }
        if !username.is_empty() {
            debug!("sqlite ignores credentials; username {} unused", username);
        }

        let options = SqliteOptions::parse(options)?;

        let opened = if options.read_only {
            Connection::open_with_flags(
                &descriptor.dbname,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            Connection::open(&descriptor.dbname)
        };
        let connection = opened
            .map_err(|e| DbFacadeError::Connection(format!("{}: {}", descriptor.dbname, e)))?;

        let mut pragmas = format!(
            "PRAGMA foreign_keys = {};",
            if options.foreign_keys { "ON" } else { "OFF" }
        );
        if let Some(mode) = &options.journal_mode {
            pragmas.push_str(&format!(" PRAGMA journal_mode = {};", mode));
        }
        connection
            .execute_batch(&pragmas)
            .map_err(|e| DbFacadeError::Connection(format!("Failed to initialize connection: {}", e)))?;

        let busy_timeout = options.busy_timeout.unwrap_or(DEFAULT_BUSY_TIMEOUT);
        connection
            .busy_timeout(busy_timeout)
            .map_err(|e| DbFacadeError::Connection(format!("Failed to set busy timeout: {}", e)))?;

        info!("Opened sqlite database {}", descriptor.dbname);

        Ok(SqliteHandle {
            connection,
            last_error: RefCell::new(None),
            busy_timeout: Cell::new(busy_timeout),
        })
    }
}

impl SqliteHandle {
    /// Records the outcome of a driver call and attaches `context` to failures.
    fn track<T>(&self, result: rusqlite::Result<T>, context: &str) -> Result<T> {
        match result {
            Ok(value) => {
                *self.last_error.borrow_mut() = None;
                Ok(value)
            }
            Err(e) => {
                *self.last_error.borrow_mut() = Some(error_info_from(&e));
                Err(DbFacadeError::Query(format!("{}: {}", context, e)))
            }
        }
    }

    /// Records a refused transaction-state change and returns its error.
    fn refuse_transaction(&self, message: &str) -> DbFacadeError {
        *self.last_error.borrow_mut() = Some(ErrorInfo {
            sqlstate: INVALID_TRANSACTION_STATE.to_string(),
            driver_code: None,
            message: Some(message.to_string()),
        });
        DbFacadeError::Transaction(message.to_string())
    }

    fn total_changes(&self) -> Result<u64> {
        let total: i64 = self.track(
            self.connection
                .query_row("SELECT total_changes()", [], |row| row.get(0)),
            "Failed to read change count",
        )?;
        Ok(total.max(0) as u64)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

/// Maps a rusqlite error onto SQLSTATE-style error info.
fn error_info_from(error: &rusqlite::Error) -> ErrorInfo {
    match error {
        rusqlite::Error::SqliteFailure(failure, message) => ErrorInfo {
            sqlstate: if failure.code == ErrorCode::ConstraintViolation {
                "23000".to_string()
            } else {
                "HY000".to_string()
            },
            driver_code: Some(failure.extended_code),
            message: Some(message.clone().unwrap_or_else(|| failure.to_string())),
        },
        other => ErrorInfo {
            sqlstate: "HY000".to_string(),
            driver_code: None,
            message: Some(other.to_string()),
        },
    }
}

impl Handle for SqliteHandle {
    type Statement<'a> = SqliteStatement<'a>;

    fn prepare(&self, sql: &str) -> Result<SqliteStatement<'_>> {
        let stmt = self.track(self.connection.prepare(sql), "Failed to prepare statement")?;
        Ok(SqliteStatement { stmt, handle: self })
    }

    /// Runs every statement in `sql` and returns the rows they changed.
    /// Row-returning statements are stepped once and contribute nothing.
    fn exec(&self, sql: &str) -> Result<usize> {
        let before = self.total_changes()?;
        self.track(self.connection.execute_batch(sql), "Statement execution failed")?;
        let after = self.total_changes()?;
        Ok(after.saturating_sub(before) as usize)
    }

    fn last_insert_id(&self) -> Result<String> {
        Ok(self.connection.last_insert_rowid().to_string())
    }

    fn begin_transaction(&self) -> Result<()> {
        if self.in_transaction() {
            return Err(self.refuse_transaction("There is already an active transaction"));
        }
        self.track(self.connection.execute_batch("BEGIN"), "Failed to begin transaction")
    }

    fn commit(&self) -> Result<()> {
        if !self.in_transaction() {
            return Err(self.refuse_transaction("There is no active transaction"));
        }
        self.track(self.connection.execute_batch("COMMIT"), "Failed to commit transaction")
    }

    fn roll_back(&self) -> Result<()> {
        if !self.in_transaction() {
            return Err(self.refuse_transaction("There is no active transaction"));
        }
        self.track(self.connection.execute_batch("ROLLBACK"), "Failed to roll back transaction")
    }

    fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }

    fn error_code(&self) -> String {
        self.last_error
            .borrow()
            .as_ref()
            .map(|info| info.sqlstate.clone())
            .unwrap_or_else(|| ErrorInfo::SUCCESS.to_string())
    }

    fn error_info(&self) -> ErrorInfo {
        self.last_error.borrow().clone().unwrap_or_else(ErrorInfo::success)
    }

    fn get_attribute(&self, attribute: Attribute) -> Result<AttributeValue> {
        Ok(match attribute {
            Attribute::DriverName => AttributeValue::Text(DRIVER_NAME.to_string()),
            Attribute::ClientVersion | Attribute::ServerVersion => {
                AttributeValue::Text(rusqlite::version().to_string())
            }
            Attribute::AutoCommit => AttributeValue::Bool(self.connection.is_autocommit()),
            Attribute::Timeout => AttributeValue::Integer(self.busy_timeout.get().as_secs() as i64),
        })
    }

    fn set_attribute(&self, attribute: Attribute, value: AttributeValue) -> Result<()> {
        match (attribute, value) {
            (Attribute::Timeout, AttributeValue::Integer(seconds)) => {
                if seconds < 0 {
                    return Err(DbFacadeError::Validation(format!(
                        "Timeout must not be negative, got {}",
                        seconds
                    )));
                }
                let millis = seconds
                    .checked_mul(1000)
                    .filter(|millis| *millis as u64 <= MAX_BUSY_TIMEOUT_MILLIS)
                    .ok_or_else(|| {
                        DbFacadeError::Validation(format!(
                            "Timeout must be at most {} seconds, got {}",
                            MAX_BUSY_TIMEOUT_MILLIS / 1000,
                            seconds
                        ))
                    })?;
                let timeout = Duration::from_millis(millis as u64);
                self.track(self.connection.busy_timeout(timeout), "Failed to set busy timeout")?;
                self.busy_timeout.set(timeout);
                Ok(())
            }
            (Attribute::Timeout, other) => Err(DbFacadeError::Validation(format!(
                "Timeout expects an integer number of seconds, got {:?}",
                other
            ))),
            (attribute, _) => Err(DbFacadeError::Unsupported(format!(
                "Attribute {:?} is read-only for the sqlite driver",
                attribute
            ))),
        }
    }

    fn quote(&self, value: &str, _hint: TypeHint) -> String {
        // sqlite quotes every literal as text regardless of the hint
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Converts a value for binding, honoring the hint when one is given.
fn to_sql_value(value: &Value, hint: Option<TypeHint>) -> SqlValue {
    match hint {
        None => match value {
            Value::Text(s) => SqlValue::Text(s.clone()),
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Null => SqlValue::Null,
            Value::Real(f) => SqlValue::Real(*f),
            Value::Blob(b) => SqlValue::Blob(b.clone()),
        },
        Some(TypeHint::Null) => SqlValue::Null,
        Some(TypeHint::Str) => match value {
            Value::Blob(b) => SqlValue::Blob(b.clone()),
            other => other.text_form().map(SqlValue::Text).unwrap_or(SqlValue::Null),
        },
        Some(TypeHint::Int) => match value {
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Real(f) => SqlValue::Integer(*f as i64),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .unwrap_or_else(|_| SqlValue::Text(s.clone())),
            Value::Null => SqlValue::Null,
            Value::Blob(b) => SqlValue::Blob(b.clone()),
        },
        Some(TypeHint::Bool) => {
            let truthy = match value {
                Value::Bool(b) => *b,
                Value::Integer(i) => *i != 0,
                Value::Real(f) => *f != 0.0,
                Value::Text(s) => !(s.is_empty() || s == "0"),
                Value::Blob(b) => !b.is_empty(),
                Value::Null => return SqlValue::Null,
            };
            SqlValue::Integer(i64::from(truthy))
        }
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Statement for SqliteStatement<'_> {
    fn bind_value(&mut self, position: usize, value: &Value, hint: Option<TypeHint>) -> Result<()> {
        let bound = to_sql_value(value, hint);
        self.handle.track(
            self.stmt.raw_bind_parameter(position, bound),
            &format!("Failed to bind parameter {}", position),
        )
    }

    fn execute(&mut self) -> Result<usize> {
        self.handle.track(self.stmt.raw_execute(), "Statement execution failed")
    }

    fn query(&mut self, limit: Option<usize>) -> Result<RawRows> {
        let handle = self.handle;
        let columns: Vec<String> = self.stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut collected = Vec::new();
        let mut rows = self.stmt.raw_query();
        while limit.map_or(true, |max| collected.len() < max) {
            let Some(row) = handle.track(rows.next(), "Query execution failed")? else {
                break;
            };
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                let value_ref = handle.track(row.get_ref(i), "Result processing failed")?;
                values.push(from_value_ref(value_ref));
            }
            collected.push(values);
        }

        Ok(RawRows {
            columns,
            rows: collected,
        })
    }
}
