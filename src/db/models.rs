use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted contact row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable columns written by `create` and `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub contact: String,
    pub email: String,
    pub picture: String,
}
