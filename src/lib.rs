// Core infrastructure modules
pub mod core;

pub mod config;
pub mod facade;

#[cfg(test)]
mod test_utils;

pub use crate::config::{ConnectionConfig, DatabaseConfig, Settings};
pub use crate::core::db::{
    Attribute, AttributeValue, AssocRow, ColumnSet, ErrorInfo, FetchShape, Identifier, Record, Row,
    ShapedRow, SqliteDriver, TypeHint, Value,
};
pub use crate::core::{DbFacadeError, Result};
pub use crate::facade::{ConnectErrorPolicy, Database};
