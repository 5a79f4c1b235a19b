use crate::tts::Voice;
use crate::{Context, Error};
use tracing::{info, warn};

/// Set the OpenAI API key used for text-to-speech (Owner only)
#[poise::command(prefix_command, slash_command, owners_only, hide_in_help)]
pub async fn set_openai_key(
    ctx: Context<'_>,
    #[description = "OpenAI API key"] api_key: String,
) -> Result<(), Error> {
    // Don't leave the key sitting in chat
    if let poise::Context::Prefix(prefix) = ctx {
        if let Err(e) = prefix.msg.delete(ctx.serenity_context()).await {
            warn!("Could not delete message containing the OpenAI API key: {}", e);
        }
    }

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ The API key cannot be empty.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.data()
        .db
        .run_blocking(move |db| db.set_api_key(&api_key))
        .await?;
    info!("OpenAI API key updated by owner {}", ctx.author().id);

    ctx.send(
        poise::CreateReply::default()
            .content("OpenAI API key has been set.")
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Set the default TTS voice for this server
///
/// Default is `alloy`. Other options: echo, fable, onyx, nova, shimmer
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn ttsvoice(
    ctx: Context<'_>,
    #[description = "Voice to use by default"]
    #[autocomplete = "super::tts::autocomplete_voice"]
    voice: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let voice: Voice = match voice.parse() {
        Ok(voice) => voice,
        Err(e) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("❌ {}", e))
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    ctx.data()
        .db
        .run_blocking(move |db| db.set_guild_voice(guild_id.get(), voice))
        .await?;
    info!("Default TTS voice for guild {} set to {}", guild_id, voice);

    ctx.say(format!("Default TTS voice set to {}", voice)).await?;
    Ok(())
}
