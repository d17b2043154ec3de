use serenity::{async_trait, client::EventHandler, model::prelude::*, prelude::*};

use crate::command::{self, ParseCommandError};
use crate::play;

pub struct Handler {
    prefix: String,
}

impl Handler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Handler { prefix: prefix.into() }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, new_message: Message) {
        match command::parse_command(&new_message, &self.prefix) {
            Ok(command) => {
                log::debug!("{} in {}: {:?}", new_message.author.id, new_message.channel_id, command);
                // Challenges wait on the opponent, so commands run on their own task.
                let prefix = self.prefix.clone();
                tokio::spawn(async move { play::run_command(&ctx, &new_message, &prefix, command).await });
            }

            Err(e) => match e {
                ParseCommandError::BotAuthor => {}

                ParseCommandError::NoPrefix => {
                    if !new_message.author.bot {
                        play::handle_text(&ctx, &new_message).await;
                    }
                }

                ParseCommandError::InvalidTargetUser => {
                    let _ = new_message
                        .reply(
                            &ctx,
                            "That user could not be found, was not specified, or cannot be challenged.",
                        )
                        .await;
                }

                ParseCommandError::InvalidDifficulty(word) => {
                    let _ = new_message
                        .reply(&ctx, format!("Unknown difficulty `{}`, use easy, medium or hard.", word))
                        .await;
                }

                ParseCommandError::InvalidCommand(name) => {
                    log::debug!("Unknown command `{}`", name);
                    let _ = new_message.react(&ctx, '❓').await;
                }
            },
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Component(component) => play::handle_component(&ctx, &component).await,
            Interaction::Modal(modal) => play::handle_modal(&ctx, &modal).await,
            _ => {}
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!("Connected as {} (prefix `{}`)", ready.user.name, self.prefix);
    }
}
