use crate::tts::Voice;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub command_prefix: String,
    pub database_url: String,
    pub status_message: String,
    pub dev_guild_id: Option<u64>,

    // Speech synthesis
    pub openai_api_base: String,
    pub tts_model: String,
    pub default_voice: Voice,
    pub openai_timeout_secs: u64,

    // Username lookups
    pub sherlock_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/foxcogs.db".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| "Ready to talk!".to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            tts_model: env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            default_voice: match env::var("DEFAULT_VOICE") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e| anyhow::anyhow!("DEFAULT_VOICE is invalid: {}", e))?,
                Err(_) => Voice::default(),
            },
            openai_timeout_secs: env::var("OPENAI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            sherlock_timeout_secs: env::var("SHERLOCK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("command_prefix", &self.command_prefix)
            .field("database_url", &self.database_url)
            .field("status_message", &self.status_message)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("openai_api_base", &self.openai_api_base)
            .field("tts_model", &self.tts_model)
            .field("default_voice", &self.default_voice)
            .field("openai_timeout_secs", &self.openai_timeout_secs)
            .field("sherlock_timeout_secs", &self.sherlock_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        discord_token: "test".to_string(),
        owner_id: Some(1),
        command_prefix: "!".to_string(),
        database_url: ":memory:".to_string(),
        status_message: "test".to_string(),
        dev_guild_id: None,
        openai_api_base: "http://localhost:9/v1".to_string(),
        tts_model: "tts-1".to_string(),
        default_voice: Voice::Alloy,
        openai_timeout_secs: 60,
        sherlock_timeout_secs: 10,
    }
}
