use std::sync::Arc;

use anyhow::Context as AnyhowContext;
use serenity::{
    Client,
    all::{GatewayIntents, Http},
};

use cordwork::{
    Context,
    config::Configuration,
    discord::{Bridge, SerenityApi},
    logging,
};

mod commands;
mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Configuration::load()?;
    let _guard = logging::init(&config.logging)?;

    let token = config
        .authentication
        .discord_token
        .as_deref()
        .context("Expected authentication.discord_token to be filled in config")?;

    let http = Arc::new(Http::new(token));
    let ctx = Context::builder(config.framework.clone(), Arc::new(SerenityApi::new(http.clone())))
        .commands(commands::manifest())
        .handlers(handlers::manifest())
        .build()?;
    ctx.setup().await.context("Failed to set up the framework")?;

    let mut client = Client::builder(
        token,
        GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT,
    )
    .event_handler(Bridge::new(ctx, http))
    .await
    .context("Error creating client")?;

    if let Err(why) = client.start().await {
        tracing::error!("Client error: {why:?}");
    }

    Ok(())
}
