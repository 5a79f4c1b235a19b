use crate::tts::{Delivery, SpeechRelay, SpeechRequest, Voice};
use crate::voice::SongbirdSessions;
use crate::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// The prefix and slash forms take their arguments in a different order
/// (Discord wants required options first), so they are declared separately
/// and merged into a single `tts` command.
pub fn tts() -> poise::Command<Data, Error> {
    let prefix = tts_prefix();
    let mut command = tts_slash();
    command.prefix_action = prefix.prefix_action;
    command.aliases = prefix.aliases;
    command
}

/// Send text-to-speech messages
///
/// Speaks in your voice channel if you are in one, otherwise replies with an mp3.
/// `tts [voice] <text>`: a leading voice name picks the voice for this message.
#[poise::command(prefix_command, guild_only, rename = "tts", aliases("t2s", "text2"))]
async fn tts_prefix(
    ctx: Context<'_>,
    #[description = "Voice to use"] voice: Option<Voice>,
    #[rest]
    #[description = "Text to speak"]
    text: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    speak(ctx, voice, &text).await
}

/// Send text-to-speech messages
#[poise::command(slash_command, guild_only, rename = "tts")]
async fn tts_slash(
    ctx: Context<'_>,
    #[description = "Text to speak"] text: String,
    #[description = "Voice to use (defaults to the server voice)"]
    #[autocomplete = "autocomplete_voice"]
    voice: Option<String>,
) -> Result<(), Error> {
    let voice = match voice.as_deref().map(str::parse::<Voice>).transpose() {
        Ok(voice) => voice,
        Err(e) => {
            ctx.send(poise::CreateReply::default().content(e.to_string()).ephemeral(true))
                .await?;
            return Ok(());
        }
    };

    ctx.defer().await?;
    speak(ctx, voice, &text).await
}

pub(crate) async fn autocomplete_voice<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = String> + 'a {
    voice_suggestions(partial).into_iter()
}

fn voice_suggestions(partial: &str) -> Vec<String> {
    let partial = partial.trim().to_lowercase();
    Voice::ALL
        .into_iter()
        .filter(|voice| voice.as_str().starts_with(&partial))
        .map(|voice| voice.to_string())
        .collect()
}

async fn speak(ctx: Context<'_>, voice: Option<Voice>, text: &str) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a server")?;
    let caller_channel = ctx.guild().and_then(|guild| {
        guild
            .voice_states
            .get(&ctx.author().id)
            .and_then(|vs| vs.channel_id)
    });

    info!(
        "TTS requested by {} in guild {} ({} chars, voice channel: {:?})",
        ctx.author().id,
        guild_id,
        text.chars().count(),
        caller_channel
    );

    let data = ctx.data();
    let sessions = SongbirdSessions::from_context(ctx.serenity_context()).await?;
    let relay = SpeechRelay::new(
        &data.db,
        data.speech.as_ref(),
        &sessions,
        &data.voice_locks,
        data.config.default_voice,
    );

    let request = SpeechRequest {
        guild_id,
        voice,
        text,
        caller_channel,
    };

    match relay.run(request).await {
        Ok(Delivery::Played) => {
            ctx.say("TTS message played in voice channel.").await?;
        }
        Ok(Delivery::Attachment(file)) => {
            let attachment = serenity::CreateAttachment::bytes(file.bytes, file.filename);
            ctx.send(poise::CreateReply::default().attachment(attachment))
                .await?;
        }
        Err(e) => {
            ctx.say(e.to_string()).await?;
        }
    }

    Ok(())
}
