//! SQL DDL for the contacts table.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT
/// - `contact` UNIQUE, `email` UNIQUE compared case-insensitively
/// - `name` sorted case-insensitively
/// - timestamps stored as RFC3339 text
///
/// The UNIQUE constraints are the last word on duplicates; handler-level
/// lookups only produce friendlier errors.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    contact TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    picture TEXT NOT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL  -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(name);
"#;
