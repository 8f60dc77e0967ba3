use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration.
///
/// Layered as: built-in defaults, then `CONTACTS_*` environment variables,
/// then the bare `PORT` / `DATABASE_URL` variables used by most hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub loglevel: String,
    pub max_upload_bytes: usize,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_connect_attempts: usize,
    pub db_connect_delay_secs: u64,
    pub startup_retry_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://contacts.db?mode=rwc".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            uploads_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("public"),
            loglevel: "info".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            db_max_connections: 10,
            // Callers queue for a free connection instead of failing fast.
            db_acquire_timeout_secs: 24 * 60 * 60,
            db_connect_attempts: 10,
            db_connect_delay_secs: 5,
            startup_retry_delay_secs: 10,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("CONTACTS_"))
            .merge(Env::raw().only(&["PORT", "DATABASE_URL"]))
    }

    pub fn from_env() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Body limit for write requests: one image plus room for the text parts.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes + 1024 * 1024
    }

    pub fn db_connect_delay(&self) -> Duration {
        Duration::from_secs(self.db_connect_delay_secs)
    }

    pub fn startup_retry_delay(&self) -> Duration {
        Duration::from_secs(self.startup_retry_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_development() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
        assert!(cfg.body_limit() > cfg.max_upload_bytes);
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PORT", "8080");
            jail.set_env("CONTACTS_UPLOADS_DIR", "/srv/uploads");
            let cfg = Config::from_env()?;
            assert_eq!(cfg.port, 8080);
            assert_eq!(cfg.uploads_dir, PathBuf::from("/srv/uploads"));
            assert_eq!(cfg.loglevel, "info");
            Ok(())
        });
    }
}
