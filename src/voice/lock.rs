use dashmap::DashSet;
use serenity::model::id::GuildId;
use std::sync::Arc;

/// Tracks which guilds currently have a TTS playback in progress.
///
/// A guild holds at most one [`VoiceLease`]; the lease is released when
/// dropped, so early returns and errors cannot leave a guild locked.
#[derive(Clone, Default)]
pub struct VoiceLocks {
    active: Arc<DashSet<GuildId>>,
}

pub struct VoiceLease {
    guild_id: GuildId,
    active: Arc<DashSet<GuildId>>,
}

impl VoiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, guild_id: GuildId) -> Option<VoiceLease> {
        if self.active.insert(guild_id) {
            Some(VoiceLease {
                guild_id,
                active: Arc::clone(&self.active),
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, guild_id: GuildId) -> bool {
        self.active.contains(&guild_id)
    }
}

impl VoiceLease {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }
}

impl Drop for VoiceLease {
    fn drop(&mut self) {
        self.active.remove(&self.guild_id);
    }
}
