mod command;
mod component;
mod config;
mod coordinator;
mod event_handler;
mod fivem;
mod games;
mod play;
mod render;
mod session;

use serenity::prelude::GatewayIntents;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut builder = serenity::Client::builder(&config.token, intents)
        .type_map_insert::<play::GameModel>(play::GameModel::new(&config))
        .event_handler(event_handler::Handler::new(config.prefix.clone()));

    if let Some(addr) = &config.fivem_addr {
        match fivem::FivemClient::new(addr.clone(), config.fivem_cache) {
            Ok(client) => builder = builder.type_map_insert::<fivem::FivemClient>(Arc::new(client)),
            Err(e) => log::warn!("FiveM status disabled: {}", e),
        }
    }

    let mut client = match builder.await {
        Ok(client) => client,
        Err(e) => {
            log::error!("Error when building Client: {:?}", e);
            std::process::exit(1);
        }
    };

    match client.start().await {
        Ok(()) => log::info!("Exited with no errors"),
        Err(e) => log::error!("Exited with error: {:?}", e),
    }
}
