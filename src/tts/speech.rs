use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice as OpenAiVoice},
    Client,
};
use async_trait::async_trait;
use crate::config::Config;
use super::Voice;
use std::time::Duration;
use tracing::debug;

/// Container format requested from the speech endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Sent to chat as a downloadable file
    Mp3,
    /// Played into a voice channel; decoded by symphonia's `wav`/`pcm` features
    Wav,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        api_key: &str,
        voice: Voice,
        text: &str,
        format: AudioFormat,
    ) -> anyhow::Result<Vec<u8>>;
}

pub struct OpenAiSpeech {
    http_client: reqwest::Client,
    api_base: String,
    model: String,
}

impl OpenAiSpeech {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.openai_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_base: config.openai_api_base.clone(),
            model: config.tts_model.clone(),
        })
    }

    // The key lives in the settings store and can change at any time,
    // so the client is cheap to rebuild per request.
    fn client(&self, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(&self.api_base)
            .with_api_key(api_key);
        Client::with_config(config).with_http_client(self.http_client.clone())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(
        &self,
        api_key: &str,
        voice: Voice,
        text: &str,
        format: AudioFormat,
    ) -> anyhow::Result<Vec<u8>> {
        let request = CreateSpeechRequestArgs::default()
            .model(speech_model(&self.model))
            .voice(openai_voice(voice))
            .response_format(match format {
                AudioFormat::Mp3 => SpeechResponseFormat::Mp3,
                AudioFormat::Wav => SpeechResponseFormat::Wav,
            })
            .input(text)
            .build()?;

        debug!("Requesting {} chars of speech as {:?} with voice {}", text.chars().count(), format, voice);
        let response = self.client(api_key).audio().speech(request).await?;

        Ok(response.bytes.to_vec())
    }
}

fn speech_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn openai_voice(voice: Voice) -> OpenAiVoice {
    match voice {
        Voice::Alloy => OpenAiVoice::Alloy,
        Voice::Echo => OpenAiVoice::Echo,
        Voice::Fable => OpenAiVoice::Fable,
        Voice::Onyx => OpenAiVoice::Onyx,
        Voice::Nova => OpenAiVoice::Nova,
        Voice::Shimmer => OpenAiVoice::Shimmer,
    }
}
