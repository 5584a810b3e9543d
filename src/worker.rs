use crate::config::config;
use crate::model::lead::Lead;
use crate::model::queue::{follow_up_queue, QueuePolicy};
use crate::model::Db;
use crate::view::render;
use chrono::{Local, NaiveDate};
use cron::Schedule;
use log::{debug, error, info};
use teloxide::prelude::Requester;
use teloxide::types::ChatId;
use teloxide::Bot;
use tokio::time::sleep;

/// `None` when nothing is due, so quiet days send no message.
fn digest_text(leads: &[Lead], today: NaiveDate, policy: QueuePolicy) -> Option<String> {
    let queue = follow_up_queue(leads, today, policy);
    if queue.due.is_empty() {
        return None;
    }
    Some(render::fit_message(render::digest(&queue, today)))
}

async fn send_digest(bot: &Bot, db: &Db) -> crate::Result<()> {
    let leads = db.load_leads().await?;
    let today = Local::now().date_naive();
    match digest_text(&leads, today, config().queue_policy()) {
        Some(text) => {
            bot.send_message(ChatId(config().TG_OPERATOR_ID), text).await?;
            info!("follow-up digest sent");
        }
        None => debug!("no follow-ups due"),
    }
    Ok(())
}

pub fn do_work(bot: Bot, db: Db, schedule: Schedule) {
    tokio::spawn(async move {
        debug!("Upcoming fire times:");
        for datetime in schedule.upcoming(Local).take(5) {
            debug!("-> {}", datetime);
        }

        loop {
            let now = Local::now();
            let Some(next) = schedule.upcoming(Local).next() else {
                info!("schedule has no upcoming fire times, worker stops");
                return;
            };
            sleep((next - now).to_std().unwrap_or_default()).await;

            debug!("digest run at {}", Local::now());
            if let Err(e) = send_digest(&bot, &db).await {
                error!("follow-up digest failed: {:?}", e);
            }
        }
    });
}
