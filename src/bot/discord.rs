use crate::{
    audio::ids::{ChannelId, GuildId},
    bot::{
        command::Command,
        handler::{CommandHandler, Invocation},
        message, slash,
    },
};
use async_trait::async_trait;
use serenity::{
    all::{
        Command as ApplicationCommand, CreateInteractionResponse,
        CreateInteractionResponseMessage, EditInteractionResponse, Guild, Interaction, Message,
        Ready, UnavailableGuild, UserId,
    },
    model::id::{ChannelId as DiscordChannelId, GuildId as DiscordGuildId},
    prelude::{Context, EventHandler},
};
use std::sync::Arc;
use tracing::{error, info, warn};

impl From<DiscordGuildId> for GuildId {
    fn from(id: DiscordGuildId) -> Self {
        GuildId(id.get())
    }
}

impl From<DiscordChannelId> for ChannelId {
    fn from(id: DiscordChannelId) -> Self {
        ChannelId(id.get())
    }
}

pub struct Bot {
    handler: Arc<CommandHandler>,
}

impl Bot {
    pub fn new(handler: Arc<CommandHandler>) -> Self {
        Self { handler }
    }
}

/// The voice channel `user` sits in, from the gateway cache.
fn voice_channel_of(ctx: &Context, guild: DiscordGuildId, user: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild)?;
    guild
        .voice_states
        .get(&user)
        .and_then(|state| state.channel_id)
        .map(ChannelId::from)
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "discord_ready");

        match ApplicationCommand::set_global_commands(&ctx.http, slash::definitions()).await {
            Ok(commands) => info!(count = commands.len(), "slash_commands_registered"),
            Err(err) => error!(error = %err, "slash_commands_failed"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(parsed) = Command::parse_known(&msg.content, self.handler.prefix()) else {
            return;
        };

        let reply = match parsed {
            Ok(command) => {
                let invocation = Invocation {
                    guild: guild_id.into(),
                    text_channel: msg.channel_id.into(),
                    user_voice: voice_channel_of(&ctx, guild_id, msg.author.id),
                };
                let typing = msg.channel_id.start_typing(&ctx.http);
                let reply = self.handler.handle(&invocation, command).await;
                typing.stop();
                reply
            }
            Err(err) => message::parse_error(&err, self.handler.prefix()),
        };

        if let Err(err) = msg.channel_id.say(&ctx.http, reply).await {
            error!(guild = %guild_id, error = %err, "reply_failed");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let Some(guild_id) = command.guild_id else {
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(message::GUILD_ONLY)
                    .ephemeral(true),
            );
            if let Err(err) = command.create_response(&ctx.http, response).await {
                warn!(error = %err, "interaction_reply_failed");
            }
            return;
        };

        if let Err(err) = command.defer(&ctx.http).await {
            warn!(guild = %guild_id, error = %err, "interaction_defer_failed");
            return;
        }

        let reply = match slash::parse(&command.data) {
            Ok(parsed) => {
                let invocation = Invocation {
                    guild: guild_id.into(),
                    text_channel: command.channel_id.into(),
                    user_voice: voice_channel_of(&ctx, guild_id, command.user.id),
                };
                self.handler.handle(&invocation, parsed).await
            }
            Err(err) => message::parse_error(&err, "/"),
        };

        let edit = EditInteractionResponse::new().content(reply);
        if let Err(err) = command.edit_response(&ctx.http, edit).await {
            error!(guild = %guild_id, error = %err, "interaction_reply_failed");
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // An unavailable guild is an outage, not a removal.
        if incomplete.unavailable {
            return;
        }
        if self.handler.registry().remove(incomplete.id.into()).await {
            info!(guild = %incomplete.id, "guild_removed");
        }
    }
}
