pub mod command;
pub mod discord;
pub mod handler;
pub mod message;
pub mod notifier;
pub mod slash;

use crate::{
    audio::registry::SessionRegistry, config::BotConfig, source::YtDlpResolver,
    voice::SongbirdBackend,
};
use color_eyre::eyre::{Result, WrapErr};
use discord::Bot;
use handler::CommandHandler;
use serenity::{Client, all::GatewayIntents};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::info;

pub async fn run(config: BotConfig) -> Result<()> {
    let (events, event_inbox) = flume::unbounded();

    let manager = Songbird::serenity();
    let backend = Arc::new(SongbirdBackend::new(manager.clone()));
    let registry = Arc::new(SessionRegistry::new(
        backend,
        events,
        config.session.clone(),
    ));
    let resolver = Arc::new(YtDlpResolver::new(config.ytdlp.clone()));
    let handler = Arc::new(CommandHandler::new(
        registry.clone(),
        resolver,
        config.prefix.clone(),
        config.queue_display_limit,
    ));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;

    let mut client = Client::builder(&config.token, intents)
        .event_handler(Bot::new(handler))
        .register_songbird_with(manager)
        .await
        .wrap_err("failed to build the Discord client")?;

    let notifier = notifier::spawn(client.http.clone(), event_inbox);

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown_requested");
            shard_manager.shutdown_all().await;
        }
    });

    info!(prefix = %config.prefix, "bot_starting");
    let result = client
        .start()
        .await
        .wrap_err("Discord client stopped with an error");

    registry.shutdown_all().await;
    notifier.abort();
    info!("bot_stopped");
    result
}
