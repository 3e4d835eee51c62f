//! `SQLite` schema for the client key-value store.

/// Item table: one row per key, values are opaque strings.
pub const CREATE_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS items (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// Bookkeeping table for the store itself (schema version).
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_ITEMS_TABLE, CREATE_METADATA_TABLE];
