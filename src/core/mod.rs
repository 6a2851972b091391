/// Core Module for dbfacade
///
/// The building blocks beneath the facade: the shared error type and the
/// database layer (values, SQL building, driver traits, the SQLite adapter
/// and query execution).

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbFacadeError, Result};
