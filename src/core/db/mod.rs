/// Database Module
///
/// ## Architecture
///
/// The database layer is split by concern, leaves first:
/// - **Values** (`value.rs`): parameter/column values and binding type detection
/// - **SQL Building** (`builder.rs`): single-table INSERT, UPDATE and DELETE
/// - **Driver Capability** (`driver.rs`): the traits a database library must implement
/// - **SQLite Adapter** (`connection.rs`): the rusqlite implementation of those traits
/// - **Query Execution** (`query.rs`): binding, execution and fetch-shape normalization
///
/// ## Error Handling
///
/// All database operations use the standardized `DbFacadeError` type.
pub mod builder;
pub mod connection;
pub mod driver;
pub mod query;
pub mod value;

pub use builder::*;
pub use connection::*;
pub use driver::*;
pub use query::*;
pub use value::*;
