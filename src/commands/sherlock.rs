use crate::sherlock::{candidate_names, execute_queries, summarize, Platform};
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::{debug, info};

/// Check which social platforms have a member's names taken
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn sherlock(
    ctx: Context<'_>,
    #[description = "Member to look up"] member: serenity::User,
) -> Result<(), Error> {
    ctx.defer().await?;

    let nick = match ctx.guild_id() {
        Some(guild_id) => match guild_id.member(ctx.serenity_context(), member.id).await {
            Ok(guild_member) => guild_member.nick,
            Err(e) => {
                debug!("No guild member for {}: {}", member.id, e);
                None
            }
        },
        None => None,
    };

    let names = candidate_names(member.display_name(), nick.as_deref());
    info!(
        "Sherlock lookup for {} by {}: {} name(s) on {} platforms",
        member.id,
        ctx.author().id,
        names.len(),
        Platform::ALL.len()
    );

    let results = execute_queries(ctx.data().username_checker.as_ref(), &names, &Platform::ALL).await;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🔎 Sherlock: {}", member.display_name()))
        .color(0x5865F2)
        .footer(serenity::CreateEmbedFooter::new(
            "Based on public profile pages; results may be stale",
        ));
    for (name, lines) in summarize(&results) {
        embed = embed.field(name, lines, true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
