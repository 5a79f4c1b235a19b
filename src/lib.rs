pub mod commands;
pub mod config;
pub mod db;
pub mod sherlock;
pub mod tts;
pub mod voice;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub db: db::Database,
    pub speech: Arc<dyn tts::SpeechSynthesizer>,
    pub username_checker: Arc<dyn sherlock::UsernameChecker>,
    /// Guilds with a TTS playback in progress
    pub voice_locks: voice::VoiceLocks,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
