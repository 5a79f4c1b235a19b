use crate::db::Database;
use crate::voice::{VoiceLocks, VoiceSessions};
use poise::serenity_prelude::{ChannelId, GuildId};
use super::{AudioFormat, SpeechSynthesizer, UnsupportedVoice, Voice};
use thiserror::Error;
use tracing::{error, info, warn};

/// Name of the file attached when the caller is not in a voice channel
pub const ATTACHMENT_NAME: &str = "tts_audio.mp3";

/// Input limit of the OpenAI speech endpoint
pub const MAX_INPUT_CHARS: usize = 4096;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error(transparent)]
    UnsupportedVoice(#[from] UnsupportedVoice),
    #[error("Give me something to say.")]
    EmptyText,
    #[error("That message is too long to speak ({len} characters, the limit is {max}).")]
    TextTooLong { len: usize, max: usize },
    #[error("OpenAI API key is not set. Please ask the bot owner to set it.")]
    NotConfigured,
    #[error("I'm already speaking in this server, try again when I'm done.")]
    Busy,
    #[error("An error occurred while reading the TTS settings: {0}")]
    Settings(#[source] anyhow::Error),
    #[error("An error occurred while generating the TTS: {0}")]
    Synthesis(#[source] anyhow::Error),
    #[error("An error occurred while playing the TTS: {0}")]
    Playback(#[source] anyhow::Error),
}

pub struct SpeechRequest<'a> {
    pub guild_id: GuildId,
    /// Explicit voice; falls back to the guild default when `None`
    pub voice: Option<Voice>,
    pub text: &'a str,
    /// Voice channel the caller is connected to, if any
    pub caller_channel: Option<ChannelId>,
}

#[derive(Debug)]
pub struct AudioAttachment {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum Delivery {
    /// Spoken in the caller's voice channel
    Played,
    /// Returned for upload as a file
    Attachment(AudioAttachment),
}

/// Turns a text request into audio and routes it to the caller.
pub struct SpeechRelay<'a> {
    db: &'a Database,
    synthesizer: &'a dyn SpeechSynthesizer,
    sessions: &'a dyn VoiceSessions,
    locks: &'a VoiceLocks,
    default_voice: Voice,
}

impl<'a> SpeechRelay<'a> {
    pub fn new(
        db: &'a Database,
        synthesizer: &'a dyn SpeechSynthesizer,
        sessions: &'a dyn VoiceSessions,
        locks: &'a VoiceLocks,
        default_voice: Voice,
    ) -> Self {
        Self {
            db,
            synthesizer,
            sessions,
            locks,
            default_voice,
        }
    }

    pub async fn run(&self, request: SpeechRequest<'_>) -> Result<Delivery, TtsError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(TtsError::TextTooLong {
                len,
                max: MAX_INPUT_CHARS,
            });
        }

        let voice = self.resolve_voice(request.guild_id, request.voice).await?;
        let api_key = self
            .db
            .run_blocking(|db| db.get_api_key())
            .await
            .map_err(|e| logged(TtsError::Settings(e)))?
            .ok_or(TtsError::NotConfigured)?;

        match request.caller_channel {
            Some(channel_id) => {
                let _lease = self
                    .locks
                    .try_acquire(request.guild_id)
                    .ok_or(TtsError::Busy)?;
                let audio = self.synthesize(&api_key, voice, text, AudioFormat::Wav).await?;
                self.speak(request.guild_id, channel_id, audio).await?;
                Ok(Delivery::Played)
            }
            None => {
                let audio = self.synthesize(&api_key, voice, text, AudioFormat::Mp3).await?;
                Ok(Delivery::Attachment(AudioAttachment {
                    filename: ATTACHMENT_NAME,
                    bytes: audio,
                }))
            }
        }
    }

    async fn resolve_voice(&self, guild_id: GuildId, explicit: Option<Voice>) -> Result<Voice, TtsError> {
        if let Some(voice) = explicit {
            return Ok(voice);
        }
        let stored = self
            .db
            .run_blocking(move |db| db.get_guild_voice(guild_id.get()))
            .await
            .map_err(|e| logged(TtsError::Settings(e)))?;
        Ok(stored.unwrap_or(self.default_voice))
    }

    async fn synthesize(
        &self,
        api_key: &str,
        voice: Voice,
        text: &str,
        format: AudioFormat,
    ) -> Result<Vec<u8>, TtsError> {
        let audio = self
            .synthesizer
            .synthesize(api_key, voice, text, format)
            .await
            .map_err(|e| logged(TtsError::Synthesis(e)))?;
        info!("Synthesized {} bytes of {:?} audio with voice {}", audio.len(), format, voice);
        Ok(audio)
    }

    async fn speak(&self, guild_id: GuildId, channel_id: ChannelId, audio: Vec<u8>) -> Result<(), TtsError> {
        if let Err(e) = self.sessions.connect(guild_id, channel_id).await {
            // A failed join can still leave a half-open call behind
            if let Err(leave_err) = self.sessions.disconnect(guild_id).await {
                warn!("Cleanup after failed join in guild {} failed: {}", guild_id, leave_err);
            }
            return Err(logged(TtsError::Playback(e)));
        }

        let played = self.sessions.play(guild_id, audio).await;
        let left = self.sessions.disconnect(guild_id).await;

        match (played, left) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), left) => {
                if let Err(leave_err) = left {
                    warn!("Leaving guild {} after failed playback failed: {}", guild_id, leave_err);
                }
                Err(logged(TtsError::Playback(e)))
            }
            (Ok(()), Err(e)) => Err(logged(TtsError::Playback(e))),
        }
    }
}

fn logged(err: TtsError) -> TtsError {
    error!("Error in TTS command: {:?}", err);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts `ERROR` events emitted while installed as the thread default
    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl ErrorCounter {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let subscriber = tracing_subscriber::registry().with(self.clone());
            tracing::subscriber::set_default(subscriber)
        }

        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct FakeSynth {
        calls: Mutex<Vec<(String, Voice, String, AudioFormat)>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynth {
        async fn synthesize(
            &self,
            api_key: &str,
            voice: Voice,
            text: &str,
            format: AudioFormat,
        ) -> anyhow::Result<Vec<u8>> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), voice, text.to_string(), format));
            if self.fail {
                anyhow::bail!("quota exceeded");
            }
            Ok(b"ID3fake".to_vec())
        }
    }

    #[derive(Default)]
    struct FakeSessions {
        log: Mutex<Vec<String>>,
        fail_play: bool,
    }

    #[async_trait]
    impl VoiceSessions for FakeSessions {
        async fn connect(&self, _guild_id: GuildId, channel_id: ChannelId) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("connect {}", channel_id));
            Ok(())
        }

        async fn play(&self, _guild_id: GuildId, audio: Vec<u8>) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("play {}", audio.len()));
            if self.fail_play {
                anyhow::bail!("decoder error");
            }
            Ok(())
        }

        async fn disconnect(&self, _guild_id: GuildId) -> anyhow::Result<()> {
            self.log.lock().unwrap().push("disconnect".to_string());
            Ok(())
        }
    }

    fn test_db(api_key: Option<&str>) -> Database {
        let db = Database::new(&test_config()).unwrap();
        db.execute_init().unwrap();
        if let Some(key) = api_key {
            db.set_api_key(key).unwrap();
        }
        db
    }

    fn request(text: &str, voice: Option<Voice>, channel: Option<u64>) -> SpeechRequest<'_> {
        SpeechRequest {
            guild_id: GuildId::new(100),
            voice,
            text,
            caller_channel: channel.map(ChannelId::new),
        }
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_external_call() {
        let db = test_db(None);
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);
        let errors = ErrorCounter::default();
        let _guard = errors.install();

        let result = relay.run(request("hello", None, Some(5))).await;
        let err = result.unwrap_err();
        assert!(matches!(err, TtsError::NotConfigured));
        assert_eq!(
            err.to_string(),
            "OpenAI API key is not set. Please ask the bot owner to set it."
        );
        assert!(synth.calls.lock().unwrap().is_empty());
        assert!(sessions.log.lock().unwrap().is_empty());
        assert_eq!(errors.count(), 0);
    }

    #[tokio::test]
    async fn test_caller_outside_voice_gets_mp3_attachment() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);

        let delivery = relay
            .run(request("hello", Some(Voice::Echo), None))
            .await
            .unwrap();
        match delivery {
            Delivery::Attachment(file) => {
                assert_eq!(file.filename, "tts_audio.mp3");
                assert_eq!(file.bytes, b"ID3fake".to_vec());
            }
            other => panic!("expected attachment, got {:?}", other),
        }

        let calls = synth.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            ("sk-test".to_string(), Voice::Echo, "hello".to_string(), AudioFormat::Mp3)
        );
        assert!(sessions.log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caller_in_voice_hears_playback() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);

        let delivery = relay
            .run(request("hello", Some(Voice::Echo), Some(55)))
            .await
            .unwrap();
        assert!(matches!(delivery, Delivery::Played));
        assert_eq!(
            *sessions.log.lock().unwrap(),
            vec!["connect 55".to_string(), "play 7".to_string(), "disconnect".to_string()]
        );
        assert_eq!(synth.calls.lock().unwrap()[0].3, AudioFormat::Wav);
        // Lease released after playback
        assert!(!locks.is_active(GuildId::new(100)));
    }

    #[tokio::test]
    async fn test_guild_voice_used_when_none_given() {
        let db = test_db(Some("sk-test"));
        db.set_guild_voice(100, Voice::Nova).unwrap();
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);

        relay.run(request("hello", None, None)).await.unwrap();
        assert_eq!(synth.calls.lock().unwrap()[0].1, Voice::Nova);
    }

    #[tokio::test]
    async fn test_configured_default_when_guild_unset() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Shimmer);

        relay.run(request("hello", None, None)).await.unwrap();
        assert_eq!(synth.calls.lock().unwrap()[0].1, Voice::Shimmer);
    }

    #[tokio::test]
    async fn test_synthesis_failure_relays_nothing() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth {
            fail: true,
            ..Default::default()
        };
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);
        let errors = ErrorCounter::default();
        let _guard = errors.install();

        let err = relay
            .run(request("hello", None, Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Synthesis(_)));
        assert_eq!(errors.count(), 1);
        assert_eq!(
            err.to_string(),
            "An error occurred while generating the TTS: quota exceeded"
        );
        assert_eq!(synth.calls.lock().unwrap().len(), 1);
        assert!(sessions.log.lock().unwrap().is_empty());
        assert!(!locks.is_active(GuildId::new(100)));
    }

    #[tokio::test]
    async fn test_playback_failure_still_disconnects() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions {
            fail_play: true,
            ..Default::default()
        };
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);
        let errors = ErrorCounter::default();
        let _guard = errors.install();

        let err = relay
            .run(request("hello", None, Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Playback(_)));
        assert_eq!(errors.count(), 1);
        assert_eq!(sessions.log.lock().unwrap().last().unwrap(), "disconnect");
    }

    #[tokio::test]
    async fn test_busy_guild_rejected_before_synthesis() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let _held = locks.try_acquire(GuildId::new(100)).unwrap();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);

        let err = relay
            .run(request("hello", None, Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Busy));
        assert!(synth.calls.lock().unwrap().is_empty());

        // Attachments don't touch the voice connection, so they still go through
        assert!(relay.run(request("hello", None, None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_text_bounds() {
        let db = test_db(Some("sk-test"));
        let synth = FakeSynth::default();
        let sessions = FakeSessions::default();
        let locks = VoiceLocks::new();
        let relay = SpeechRelay::new(&db, &synth, &sessions, &locks, Voice::Alloy);

        assert!(matches!(
            relay.run(request("   ", None, None)).await,
            Err(TtsError::EmptyText)
        ));
        let long = "a".repeat(MAX_INPUT_CHARS + 1);
        assert!(matches!(
            relay.run(request(&long, None, None)).await,
            Err(TtsError::TextTooLong { .. })
        ));
        assert!(synth.calls.lock().unwrap().is_empty());
    }
}
