/// # Test Utilities Module
///
/// Fixtures for facade tests: a file-backed SQLite database in a temporary
/// directory with a small `users` table.

use crate::config::DatabaseConfig;
use crate::facade::Database;
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use tempfile::TempDir;

/// Fixture setup talks to rusqlite directly, outside the facade's error type.
pub type FixtureResult<T> = std::result::Result<T, Box<dyn Error>>;

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub path: PathBuf,
    // Keeps the directory alive for the fixture's lifetime
    _dir: TempDir,
}

impl DatabaseFixture {
    /// Create an empty database file
    pub fn new() -> FixtureResult<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("fixture.db");
        Connection::open(&path)?;
        Ok(DatabaseFixture { path, _dir: dir })
    }

    /// Create fixture with the `users` schema and two rows
    pub fn with_sample_data() -> FixtureResult<Self> {
        let fixture = Self::new()?;
        let conn = Connection::open(&fixture.path)?;
        conn.execute_batch(
            "
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER,
                email TEXT UNIQUE
            );

            INSERT INTO users (name, age, email) VALUES ('Zed', 52, 'zed@example.com');
            INSERT INTO users (name, age, email) VALUES ('Bea', 30, 'bea@example.com');
            ",
        )?;
        Ok(fixture)
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new("sqlite", "localhost", self.path.to_string_lossy(), "", "")
    }

    pub fn database(&self) -> Database {
        Database::new(self.config())
    }

    /// Reads a count through a separate connection, bypassing the facade.
    pub fn count(&self, sql: &str) -> FixtureResult<i64> {
        let conn = Connection::open(&self.path)?;
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}
