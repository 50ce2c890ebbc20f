use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
const DEFAULT_TRANSPORT_LATENCY_MS: u64 = 1_000;
const DEFAULT_QUEUE_PRUNE_DAYS: i64 = 7;
const DEFAULT_ADMIN_SUFFIX: &str = "@admin.tillbook";

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Volatile store, gone on exit. Demos and tests.
    InMemory,
    /// SQLite file at an explicit path.
    File(PathBuf),
    /// SQLite file in the OS data directory.
    DataDir,
}

/// Everything tunable about the app, with working defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseLocation,
    /// How often the background worker drains the queue while online.
    pub sync_interval: Duration,
    /// Emails ending in this suffix sign in as admins.
    pub admin_email_suffix: String,
    /// Artificial delay of the simulated transport, per pushed record.
    pub transport_latency: Duration,
    /// Settled queue entries older than this get pruned after a drain.
    pub queue_prune_age: chrono::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::DataDir,
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            admin_email_suffix: DEFAULT_ADMIN_SUFFIX.to_string(),
            transport_latency: Duration::from_millis(DEFAULT_TRANSPORT_LATENCY_MS),
            queue_prune_age: chrono::Duration::days(DEFAULT_QUEUE_PRUNE_DAYS),
        }
    }
}

impl AppConfig {
    /// Read configuration from `TILLBOOK_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        match std::env::var("TILLBOOK_DB") {
            Ok(raw) if raw == "memory" => config.database = DatabaseLocation::InMemory,
            Ok(raw) => config.database = DatabaseLocation::File(PathBuf::from(raw)),
            Err(_) => {
                tracing::info!("TILLBOOK_DB not set; using the OS data directory");
            }
        }

        if let Some(secs) = read_env_u64("TILLBOOK_SYNC_INTERVAL_SECS") {
            config.sync_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = read_env_u64("TILLBOOK_TRANSPORT_LATENCY_MS") {
            config.transport_latency = Duration::from_millis(ms);
        }
        if let Some(days) = read_env_u64("TILLBOOK_QUEUE_PRUNE_DAYS") {
            config.queue_prune_age = chrono::Duration::days(days as i64);
        }
        if let Ok(suffix) = std::env::var("TILLBOOK_ADMIN_SUFFIX") {
            config.admin_email_suffix = suffix;
        }

        config
    }

    pub fn with_database(mut self, database: DatabaseLocation) -> Self {
        self.database = database;
        self
    }

    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    pub fn with_admin_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.admin_email_suffix = suffix.into();
        self
    }

    pub fn with_transport_latency(mut self, latency: Duration) -> Self {
        self.transport_latency = latency;
        self
    }

    pub fn with_queue_prune_age(mut self, age: chrono::Duration) -> Self {
        self.queue_prune_age = age;
        self
    }
}

fn read_env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, raw = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}
