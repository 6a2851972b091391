//! The `Database` facade: lazy connection management plus the parameterized
//! write helpers, shaped fetches and driver passthroughs.

use crate::config::{ConnectionConfig, DatabaseConfig, Settings};
use crate::core::db::builder::{build_delete, build_insert, build_update, ColumnSet, Identifier};
use crate::core::db::connection::SqliteDriver;
use crate::core::db::driver::{Attribute, AttributeValue, Driver, ErrorInfo, Handle};
use crate::core::db::query::{record_into, AssocRow, FetchShape, QueryExecutor, Row, ShapedRow};
use crate::core::db::value::{TypeHint, Value};
use crate::core::{DbFacadeError, Result};
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};

/// What the facade does when opening the handle fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectErrorPolicy {
    /// Log the failure and report [`DbFacadeError::NotConnected`]; the next
    /// call tries again.
    #[default]
    Log,
    /// Return the underlying configuration or connection error.
    Propagate,
}

/// Single-connection database facade.
///
/// The handle is opened on the first operation and kept for the facade's
/// lifetime. A failed attempt leaves it unset, so every later call retries.
pub struct Database<D: Driver = SqliteDriver> {
    config: Option<DatabaseConfig>,
    policy: ConnectErrorPolicy,
    driver: D,
    handle: OnceCell<D::Handle>,
}

impl Database<SqliteDriver> {
    pub fn new(config: DatabaseConfig) -> Self {
        Database::with_driver(SqliteDriver, Some(config))
    }

    /// A facade with no configuration yet; see [`Database::set_config`].
    pub fn unconfigured() -> Self {
        Database::with_driver(SqliteDriver, None)
    }

    pub fn from_settings(settings: Settings) -> Self {
        Database::new(settings.database).with_connect_error_policy(settings.connect_errors)
    }
}

impl<D: Driver> Database<D> {
    pub fn with_driver(driver: D, config: Option<DatabaseConfig>) -> Self {
        Database {
            config,
            policy: ConnectErrorPolicy::default(),
            driver,
            handle: OnceCell::new(),
        }
    }

    pub fn with_connect_error_policy(mut self, policy: ConnectErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the configuration. Validation happens on the next connect
    /// attempt; an already open handle is kept.
    pub fn set_config(&mut self, config: DatabaseConfig) {
        self.config = Some(config);
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn is_connected(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Opens the handle if it is not open yet.
    pub fn connect(&self) -> Result<()> {
        self.handle().map(|_| ())
    }

    fn open(&self) -> Result<D::Handle> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| DbFacadeError::Config("no connection configuration set".to_string()))?;
        let config = ConnectionConfig::try_from(config)?;
        let descriptor = config.descriptor();

        debug!("Connecting to {}", descriptor);
        self.driver
            .connect(&descriptor, &config.username, &config.password, &config.options)
    }

    /// Returns the open handle, connecting first when needed.
    fn handle(&self) -> Result<&D::Handle> {
        self.handle
            .get_or_try_init(|| self.open())
            .map_err(|err| match self.policy {
                ConnectErrorPolicy::Log => {
                    error!("Database connection error: {}", err);
                    DbFacadeError::NotConnected
                }
                ConnectErrorPolicy::Propagate => err,
            })
    }

    fn executor(&self) -> Result<QueryExecutor<'_, D::Handle>> {
        Ok(QueryExecutor::new(self.handle()?))
    }

    /// Inserts one row.
    ///
    /// # Returns
    ///
    /// The driver-generated id of the new row, or `None` when the statement
    /// affected no rows.
    pub fn insert(&self, table: &str, data: &ColumnSet) -> Result<Option<String>> {
        let handle = self.handle()?;
        let stmt = build_insert(table, data)?;
        let affected = QueryExecutor::new(handle).execute_write(&stmt.sql, &stmt.params)?;
        if affected == 0 {
            return Ok(None);
        }
        handle.last_insert_id().map(Some)
    }

    /// Updates the rows matching `identifier` and returns how many changed.
    pub fn update(&self, table: &str, data: &ColumnSet, identifier: &Identifier) -> Result<usize> {
        let executor = self.executor()?;
        let stmt = build_update(table, data, identifier)?;
        executor.execute_write(&stmt.sql, &stmt.params)
    }

    /// Deletes the rows matching `identifier` and returns how many were removed.
    pub fn delete(&self, table: &str, identifier: &Identifier) -> Result<usize> {
        let executor = self.executor()?;
        let stmt = build_delete(table, identifier)?;
        executor.execute_write(&stmt.sql, &stmt.params)
    }

    /// Runs `sql` and shapes the first row; `None` when nothing matched.
    pub fn fetch(&self, sql: &str, params: &[Value], shape: FetchShape) -> Result<Option<ShapedRow>> {
        self.executor()?.fetch(sql, params, shape)
    }

    /// Runs `sql` and shapes every row.
    pub fn fetch_all(&self, sql: &str, params: &[Value], shape: FetchShape) -> Result<Vec<ShapedRow>> {
        self.executor()?.fetch_all(sql, params, shape)
    }

    pub fn fetch_array(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self
            .fetch(sql, params, FetchShape::IndexedAndNamed)?
            .and_then(ShapedRow::into_row))
    }

    pub fn fetch_all_array(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        Ok(self
            .fetch_all(sql, params, FetchShape::IndexedAndNamed)?
            .into_iter()
            .filter_map(ShapedRow::into_row)
            .collect())
    }

    pub fn fetch_assoc(&self, sql: &str, params: &[Value]) -> Result<Option<AssocRow>> {
        Ok(self
            .fetch(sql, params, FetchShape::AssocOnly)?
            .and_then(ShapedRow::into_assoc))
    }

    pub fn fetch_all_assoc(&self, sql: &str, params: &[Value]) -> Result<Vec<AssocRow>> {
        Ok(self
            .fetch_all(sql, params, FetchShape::AssocOnly)?
            .into_iter()
            .filter_map(ShapedRow::into_assoc)
            .collect())
    }

    /// Fetches the first row as an object of type `T`.
    ///
    /// Use [`Record`](crate::Record) for a dynamic object.
    pub fn fetch_object<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Option<T>> {
        self.fetch(sql, params, FetchShape::Object)?
            .and_then(ShapedRow::into_record)
            .map(record_into)
            .transpose()
    }

    pub fn fetch_all_object<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        self.fetch_all(sql, params, FetchShape::Object)?
            .into_iter()
            .filter_map(ShapedRow::into_record)
            .map(record_into)
            .collect()
    }

    /// Runs parameterless SQL and shapes every row.
    pub fn query(&self, sql: &str, shape: FetchShape) -> Result<Vec<ShapedRow>> {
        self.fetch_all(sql, &[], shape)
    }

    /// Prepares a statement for manual binding.
    pub fn prepare(&self, sql: &str) -> Result<<D::Handle as Handle>::Statement<'_>> {
        self.handle()?.prepare(sql)
    }

    pub fn begin_transaction(&self) -> Result<()> {
        self.handle()?.begin_transaction()
    }

    pub fn commit(&self) -> Result<()> {
        self.handle()?.commit()
    }

    pub fn roll_back(&self) -> Result<()> {
        self.handle()?.roll_back()
    }

    pub fn in_transaction(&self) -> Result<bool> {
        Ok(self.handle()?.in_transaction())
    }

    pub fn last_insert_id(&self) -> Result<String> {
        self.handle()?.last_insert_id()
    }

    /// Runs a raw statement and returns the affected-row count.
    pub fn exec(&self, sql: &str) -> Result<usize> {
        self.handle()?.exec(sql)
    }

    pub fn get_attribute(&self, attribute: Attribute) -> Result<AttributeValue> {
        self.handle()?.get_attribute(attribute)
    }

    pub fn set_attribute(&self, attribute: Attribute, value: AttributeValue) -> Result<()> {
        self.handle()?.set_attribute(attribute, value)
    }

    pub fn available_drivers(&self) -> Result<Vec<String>> {
        self.handle()?;
        Ok(self.driver.available_drivers())
    }

    pub fn quote(&self, value: &str, hint: TypeHint) -> Result<String> {
        Ok(self.handle()?.quote(value, hint))
    }

    pub fn error_code(&self) -> Result<String> {
        Ok(self.handle()?.error_code())
    }

    pub fn error_info(&self) -> Result<ErrorInfo> {
        Ok(self.handle()?.error_info())
    }
}
