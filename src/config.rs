use crate::core::db::driver::Descriptor;
use crate::core::{DbFacadeError, Result};
use crate::facade::ConnectErrorPolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Top-level settings parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connect_errors: ConnectErrorPolicy,
    pub database: DatabaseConfig,
}

/// Connection configuration as supplied by the caller.
///
/// Exactly the keys `driver`, `host`, `name`, `username`, `password` and
/// `options` are accepted. Each may be absent at parse time; a missing key is
/// reported when the facade first tries to connect.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub driver: Option<String>,
    pub host: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub options: Option<BTreeMap<String, String>>,
}

impl DatabaseConfig {
    /// A fully populated configuration with no driver options.
    pub fn new(
        driver: impl Into<String>,
        host: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        DatabaseConfig {
            driver: Some(driver.into()),
            host: Some(host.into()),
            name: Some(name.into()),
            username: Some(username.into()),
            password: Some(password.into()),
            options: Some(BTreeMap::new()),
        }
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

/// A validated configuration, ready to connect with.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub driver: String,
    pub host: String,
    pub database_name: String,
    pub username: String,
    pub password: String,
    pub options: BTreeMap<String, String>,
}

impl ConnectionConfig {
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            driver: self.driver.clone(),
            host: self.host.clone(),
            dbname: self.database_name.clone(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("database_name", &self.database_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| DbFacadeError::Config(format!("missing required key `{}`", key)))
}

impl TryFrom<&DatabaseConfig> for ConnectionConfig {
    type Error = DbFacadeError;

    fn try_from(config: &DatabaseConfig) -> Result<Self> {
        Ok(ConnectionConfig {
            driver: required(&config.driver, "driver")?,
            host: required(&config.host, "host")?,
            database_name: required(&config.name, "name")?,
            username: required(&config.username, "username")?,
            password: required(&config.password, "password")?,
            options: config
                .options
                .clone()
                .ok_or_else(|| DbFacadeError::Config("missing required key `options`".to_string()))?,
        })
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(content: &str) -> Result<Settings> {
    Ok(toml::from_str(content)?)
}

/// Loads settings from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let settings = dbfacade::config::load_settings("dbfacade.toml").expect("Failed to load config");
/// println!("{:?}", settings);
/// ```
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}
