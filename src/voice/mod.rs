use anyhow::anyhow;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use serenity::{ChannelId, GuildId};
use songbird::input::Input;
use songbird::{Event, Songbird, TrackEvent};
use std::sync::Arc;
use tracing::{debug, info};

pub mod events;
pub mod lock;

pub use events::{PlaybackEnd, PlaybackFinished};
pub use lock::{VoiceLease, VoiceLocks};

/// The bot's voice connection, one per guild
#[async_trait]
pub trait VoiceSessions: Send + Sync {
    /// Join `channel_id`, moving the existing connection if there is one
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> anyhow::Result<()>;
    /// Play `audio` and resolve once the track has finished
    async fn play(&self, guild_id: GuildId, audio: Vec<u8>) -> anyhow::Result<()>;
    async fn disconnect(&self, guild_id: GuildId) -> anyhow::Result<()>;
}

pub struct SongbirdSessions {
    manager: Arc<Songbird>,
}

impl SongbirdSessions {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }

    pub async fn from_context(ctx: &serenity::Context) -> anyhow::Result<Self> {
        let manager = songbird::get(ctx)
            .await
            .ok_or_else(|| anyhow!("Songbird Voice client not initialized"))?;
        Ok(Self::new(manager))
    }
}

#[async_trait]
impl VoiceSessions for SongbirdSessions {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> anyhow::Result<()> {
        self.manager.join(guild_id, channel_id).await?;
        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(())
    }

    async fn play(&self, guild_id: GuildId, audio: Vec<u8>) -> anyhow::Result<()> {
        let handler_lock = self
            .manager
            .get(guild_id)
            .ok_or_else(|| anyhow!("Not connected to a voice channel in guild {}", guild_id))?;

        let (finished, done) = PlaybackFinished::new();
        let track = {
            let mut handler = handler_lock.lock().await;
            handler.play_only_input(Input::from(audio))
        };
        track.add_event(Event::Track(TrackEvent::End), finished.clone())?;
        track.add_event(Event::Track(TrackEvent::Error), finished)?;
        debug!("Waiting for track {} to finish in guild {}", track.uuid(), guild_id);

        match done.await {
            Ok(PlaybackEnd::Completed) => Ok(()),
            Ok(PlaybackEnd::Failed) => Err(anyhow!("Audio playback failed")),
            Err(_) => Err(anyhow!("Track was dropped before it finished playing")),
        }
    }

    async fn disconnect(&self, guild_id: GuildId) -> anyhow::Result<()> {
        if self.manager.get(guild_id).is_some() {
            self.manager.remove(guild_id).await?;
            info!("Left voice channel in guild {}", guild_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbird::input::codecs::{get_codec_registry, get_probe};

    /// 16-bit mono PCM WAV, the layout the speech endpoint returns (24 kHz)
    fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&1u16.to_le_bytes()); // mono
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    #[tokio::test]
    async fn test_synthesized_wav_is_playable() {
        let samples: Vec<i16> = (0..2400).map(|i| ((i % 100) as i16 - 50) * 200).collect();
        let input = Input::from(wav_bytes(24_000, &samples));

        let playable = input
            .make_playable_async(get_codec_registry(), get_probe())
            .await
            .expect("songbird should decode speech WAV");
        assert!(playable.is_playable());
    }
}
