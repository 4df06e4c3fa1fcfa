//! `SQLite` schema definitions for checkin.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the items table.
///
/// Each row is one whole value; writers replace it in full.
pub const CREATE_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS items (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_ITEMS_TABLE, CREATE_METADATA_TABLE];
