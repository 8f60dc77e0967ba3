//! Database module: models, schema and the contacts repository.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite)
//! - `sqlite.rs`: pool construction and the `ContactsStorage` repository

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Contact, ContactFields};
pub use schema::SQLITE_INIT;
pub use sqlite::{ContactsStorage, SqlitePool, connect};
