//! Schema versioning for the client store.
//!
//! The version lives in the `metadata` table. A fresh file reports version 0
//! and is walked forward one step at a time until it reaches
//! [`CURRENT_VERSION`].

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Create missing tables and bring the schema up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a statement fails or the stored version is newer than
/// this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let mut version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "store was written by a newer version (schema {version}, supported {CURRENT_VERSION})"
            ),
        });
    }

    while version < CURRENT_VERSION {
        version += 1;
        debug!("Migrating store schema to v{}", version);
        migrate_to(conn, version)?;
        set_schema_version(conn, version)?;
    }
    Ok(())
}

/// Read the stored schema version; 0 when none has been written.
fn schema_version(conn: &Connection) -> Result<i32> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

fn migrate_to(_conn: &Connection, version: i32) -> Result<()> {
    match version {
        // v1 is the base layout created by SCHEMA_STATEMENTS.
        1 => Ok(()),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}
