pub use crate::error::Result;
use crate::config::config;
use crate::handler::{BotState, Command};
use crate::model::Db;
use chrono::Utc;
use cron::Schedule;
use dotenvy::dotenv;
use std::str::FromStr;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};

mod config;
mod error;
mod handler;
mod model;
mod view;
mod worker;

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = dotenv();

    pretty_env_logger::init();
    if let Err(e) = env_file {
        log::warn!("no .env file loaded: {}", e);
    }
    log::info!("Starting lead tracker bot...");

    let schedule = Schedule::from_str(&config().SCHEDULE)?;
    let db = Db::new().await?;

    let bot = Bot::from_env();
    bot.set_my_commands(Command::bot_commands()).await?;

    worker::do_work(bot.clone(), db.clone(), schedule);

    let state = Arc::new(BotState::from_config(db, Utc::now()));
    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handler::answer);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
