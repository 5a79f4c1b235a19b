use rusqlite::{Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use crate::config::Config;
use crate::tts::Voice;
use tracing::{info, debug, warn};

const API_KEY: &str = "api_key";

/// Key-value settings store shared by all commands
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        if let Some(parent) = std::path::Path::new(&config.database_url).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.database_url)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let sql = "
            CREATE TABLE IF NOT EXISTS global_settings (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE TABLE IF NOT EXISTS guild_settings (
                guild_id TEXT PRIMARY KEY,
                voice TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
        ";
        self.conn()?.execute_batch(sql)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }

    /// Run a synchronous database call off the async executor
    pub async fn run_blocking<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    // --- Global settings ---

    pub fn get_api_key(&self) -> anyhow::Result<Option<String>> {
        let conn = self.conn()?;
        let value: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM global_settings WHERE key = ?1",
                [API_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten().filter(|key| !key.is_empty()))
    }

    pub fn set_api_key(&self, api_key: &str) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO global_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            (API_KEY, api_key),
        )?;
        debug!("Database: OpenAI API key updated");
        Ok(())
    }

    // --- Guild settings ---

    pub fn get_guild_voice(&self, guild_id: u64) -> anyhow::Result<Option<Voice>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT voice FROM guild_settings WHERE guild_id = ?1",
                [guild_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => match raw.parse() {
                Ok(voice) => Ok(Some(voice)),
                Err(e) => {
                    warn!("Database: Ignoring stored voice for guild {}: {}", guild_id, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub fn set_guild_voice(&self, guild_id: u64, voice: Voice) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO guild_settings (guild_id, voice, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(guild_id) DO UPDATE SET voice = ?2, updated_at = CURRENT_TIMESTAMP",
            (guild_id.to_string(), voice.as_str()),
        )?;
        Ok(())
    }

    /// Nothing is stored per user, so there is never anything to remove.
    pub fn delete_user_data(&self, user_id: u64) -> anyhow::Result<usize> {
        debug!("Database: No stored data for user {}", user_id);
        Ok(0)
    }
}
