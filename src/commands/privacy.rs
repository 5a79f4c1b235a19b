use crate::{Context, Error};
use tracing::info;

/// Delete the data this bot stores about you
#[poise::command(prefix_command, slash_command)]
pub async fn delete_data(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get();
    let removed = ctx
        .data()
        .db
        .run_blocking(move |db| db.delete_user_data(user_id))
        .await?;
    info!("User data deletion requested by user {} ({} records removed)", user_id, removed);

    ctx.send(
        poise::CreateReply::default()
            .content("Nothing to delete: no data about users is stored.")
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
