use crate::config::Config;
use crate::db::models::{Contact, ContactFields};
use crate::db::schema::SQLITE_INIT;
use crate::error::ContactsError;
use backon::{ConstantBuilder, Retryable};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub type SqlitePool = Pool<Sqlite>;

const SELECT_COLUMNS: &str =
    "SELECT id, name, contact, email, picture, created_at, updated_at FROM contacts";

/// Open the connection pool, retrying a fixed number of times with a constant
/// delay between attempts. The last error is returned once attempts run out.
pub async fn connect(cfg: &Config) -> Result<SqlitePool, ContactsError> {
    let options = SqliteConnectOptions::from_str(&cfg.database_url)?.create_if_missing(true);
    let policy = ConstantBuilder::default()
        .with_delay(cfg.db_connect_delay())
        .with_max_times(cfg.db_connect_attempts.saturating_sub(1));

    let pool = (|| async {
        SqlitePoolOptions::new()
            .max_connections(cfg.db_max_connections)
            .acquire_timeout(Duration::from_secs(cfg.db_acquire_timeout_secs))
            .connect_with(options.clone())
            .await
    })
    .retry(policy)
    .notify(|err: &sqlx::Error, delay: Duration| {
        warn!(error = %err, delay_secs = delay.as_secs(), "database not reachable; retrying");
    })
    .await?;

    info!(max_connections = cfg.db_max_connections, "database pool ready");
    Ok(pool)
}

/// Repository over the `contacts` table.
#[derive(Clone)]
pub struct ContactsStorage {
    pool: SqlitePool,
}

impl ContactsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), ContactsError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn find_all(&self) -> Result<Vec<Contact>, ContactsError> {
        // Explicit collation also covers tables created before `name` was NOCASE.
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY name COLLATE NOCASE ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Contact>, ContactsError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Insert a row and return it as stored.
    pub async fn create(&self, fields: &ContactFields) -> Result<Contact, ContactsError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"INSERT INTO contacts (name, contact, email, picture, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&fields.name)
        .bind(&fields.contact)
        .bind(&fields.email)
        .bind(&fields.picture)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(ContactsError::DatabaseError(sqlx::Error::RowNotFound))
    }

    /// Overwrite every mutable column. `None` when the row no longer exists.
    pub async fn update(
        &self,
        id: i64,
        fields: &ContactFields,
    ) -> Result<Option<Contact>, ContactsError> {
        let result = sqlx::query(
            r#"UPDATE contacts SET
                name = ?,
                contact = ?,
                email = ?,
                picture = ?,
                updated_at = ?
              WHERE id = ?"#,
        )
        .bind(&fields.name)
        .bind(&fields.contact)
        .bind(&fields.email)
        .bind(&fields.picture)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// Returns whether a row was actually removed.
    pub async fn delete(&self, id: i64) -> Result<bool, ContactsError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists_by_contact(
        &self,
        contact: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, ContactsError> {
        self.exists_where("contact", contact, exclude_id).await
    }

    /// Email comparison is case-insensitive through the column collation.
    pub async fn exists_by_email(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, ContactsError> {
        self.exists_where("email", email, exclude_id).await
    }

    async fn exists_where(
        &self,
        column: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, ContactsError> {
        let found = match exclude_id {
            Some(id) => {
                sqlx::query(&format!(
                    "SELECT id FROM contacts WHERE {column} = ? AND id != ? LIMIT 1"
                ))
                .bind(value)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("SELECT id FROM contacts WHERE {column} = ? LIMIT 1"))
                    .bind(value)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(found.is_some())
    }

    fn row_to_model(row: SqliteRow) -> Result<Contact, ContactsError> {
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(Contact {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            email: row.try_get("email")?,
            picture: row.try_get("picture")?,
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
