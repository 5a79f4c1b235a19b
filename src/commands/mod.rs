pub mod privacy;
pub mod settings;
pub mod sherlock;
pub mod tts;
