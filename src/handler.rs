use crate::config::config;
use crate::error::Error;
use crate::model::backup::{self, ImportMode};
use crate::model::call_log::LogPolicy;
use crate::model::queue::{follow_up_queue, QueuePolicy};
use crate::model::whatsapp::{self, Sender};
use crate::model::{csv, fetch, metrics, search, Db};
use crate::view::args;
use crate::view::confirm::{Action, Confirmations, Step};
use crate::view::render;
use crate::view::session::Session;
use crate::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{error, warn};
use std::sync::Arc;
use teloxide::types::InputFile;
use teloxide::{prelude::*, utils::command::BotCommands};
use tokio::sync::Mutex;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "snake_case",
    description = "Cold-call lead tracker. Fields go as key=value separated by ';'. \
                   Dates: YYYY-MM-DD, today, tomorrow, +N, none."
)]
pub enum Command {
    #[command(description = "show this help")]
    Help,
    #[command(description = "new lead: /add Business; phone=...; city=...; website=weak")]
    Add(String),
    #[command(
        description = "log a call: /call ID; who=owner; outcome=interested; interest=warm; follow_up=tomorrow; notes=..."
    )]
    Call(String),
    #[command(description = "fix data without logging a call: /edit ID; phone=...; whatsapp=yes")]
    Edit(String),
    #[command(description = "show one lead: /lead ID")]
    Lead(String),
    #[command(description = "list open leads: /leads [term]; city=...; profession=...; all; help")]
    Leads(String),
    #[command(description = "follow-up queue, due and upcoming")]
    Queue,
    #[command(description = "call metrics: /metrics daily|weekly|monthly|custom FROM TO")]
    Metrics(String),
    #[command(description = "WhatsApp link for a lead: /wa ID")]
    Wa(String),
    #[command(description = "delete a lead: /delete ID")]
    Delete(String),
    #[command(description = "delete every lead")]
    Wipe,
    #[command(description = "confirm a pending delete or wipe")]
    Confirm,
    #[command(description = "drop a pending delete or wipe")]
    Cancel,
    #[command(description = "download leads: /export json|csv|sync")]
    Export(String),
    #[command(description = "import a CSV or JSON file: /import URL [overwrite]")]
    Import(String),
    #[command(description = "paste a sync code: /sync CODE [overwrite]")]
    Sync(String),
    #[command(description = "calls and pace this session")]
    Pace,
    #[command(description = "start a new session")]
    ResetSession,
}

/// Shared by every handler call. Only the store is durable.
pub struct BotState {
    pub db: Db,
    pub log_policy: LogPolicy,
    pub queue_policy: QueuePolicy,
    pub sender: Sender,
    pub session: Mutex<Session>,
    pub confirmations: Mutex<Confirmations>,
}

impl BotState {
    pub fn from_config(db: Db, now: DateTime<Utc>) -> BotState {
        let cfg = config();
        BotState {
            db,
            log_policy: cfg.log_policy(),
            queue_policy: cfg.queue_policy(),
            sender: cfg.sender(),
            session: Mutex::new(Session::new(now, cfg.SESSION_GOAL)),
            confirmations: Mutex::new(Confirmations::default()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Document {
        file_name: String,
        body: Vec<u8>,
        caption: String,
    },
}

pub async fn answer(bot: Bot, msg: Message, cmd: Command, state: Arc<BotState>) -> ResponseResult<()> {
    if msg.chat.id != ChatId(config().TG_OPERATOR_ID) {
        warn!("ignoring {:?} from chat {}", cmd, msg.chat.id);
        return Ok(());
    }

    let today = Local::now().date_naive();
    let reply = handle(cmd, &state, Utc::now(), today)
        .await
        .unwrap_or_else(|e| {
            error!("{:?}", e);
            Reply::Text(e.user_message())
        });

    match reply {
        Reply::Text(text) => {
            bot.send_message(msg.chat.id, text).await?;
        }
        Reply::Document {
            file_name,
            body,
            caption,
        } => {
            bot.send_document(msg.chat.id, InputFile::memory(body).file_name(file_name))
                .caption(caption)
                .await?;
        }
    }
    Ok(())
}

fn require_id(raw: &str) -> Result<&str> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(Error::InvalidField {
            field: "lead id".to_string(),
            value: String::new(),
        });
    }
    Ok(id)
}

async fn find_lead(db: &Db, id: &str) -> Result<crate::model::lead::Lead> {
    db.read_lead(id)
        .await?
        .ok_or_else(|| Error::LeadNotFound(id.to_string()))
}

async fn import(state: &BotState, leads: Vec<crate::model::lead::Lead>, mode: ImportMode) -> Result<String> {
    let summary = state.db.bulk_import(leads, mode).await?;
    Ok(render::import(&summary))
}

pub async fn handle(cmd: Command, state: &BotState, now: DateTime<Utc>, today: NaiveDate) -> Result<Reply> {
    let db = &state.db;
    let text = match cmd {
        Command::Help => Command::descriptions().to_string(),
        Command::Add(raw) => {
            let parsed = args::split(&raw);
            let mut edit = args::lead_edit(&parsed.fields, today)?;
            if !parsed.head.is_empty() {
                edit.business_name = Some(parsed.head);
            }
            let lead = db.create_lead(edit).await?;
            format!("Created {}", render::lead_line(&lead))
        }
        Command::Call(raw) => {
            let parsed = args::split(&raw);
            let id = require_id(&parsed.head)?;
            let input = args::call_input(&parsed.fields, today)?;
            let lead = db.log_call(id, input, state.log_policy).await?;
            state.session.lock().await.record_call();
            let link = whatsapp::link(&lead, &state.sender);
            render::lead_card(&lead, link.as_deref())
        }
        Command::Edit(raw) => {
            let parsed = args::split(&raw);
            let id = require_id(&parsed.head)?;
            let edit = args::lead_edit(&parsed.fields, today)?;
            let lead = db.save_info(id, edit).await?;
            format!("Saved {}", render::lead_line(&lead))
        }
        Command::Lead(raw) => {
            let lead = find_lead(db, require_id(&raw)?).await?;
            let link = whatsapp::link(&lead, &state.sender);
            render::lead_card(&lead, link.as_deref())
        }
        Command::Leads(raw) => {
            let filter = args::lead_filter(&raw)?;
            let leads = db.load_leads().await?;
            render::lead_list(&search::search(&leads, &filter, today, &Local))
        }
        Command::Queue => {
            let leads = db.load_leads().await?;
            let queue = follow_up_queue(&leads, today, state.queue_policy);
            render::queue(&queue, today)
        }
        Command::Metrics(raw) => {
            let window = args::window(&raw)?;
            let leads = db.load_leads().await?;
            let m = metrics::compute(&leads, window, today, &Local);
            render::metrics(&m, window, window.bounds(today))
        }
        Command::Wa(raw) => {
            let lead = find_lead(db, require_id(&raw)?).await?;
            match whatsapp::link(&lead, &state.sender) {
                Some(link) => format!(
                    "{link}\n\nAfter sending, mark it: /edit {}; whatsapp=yes",
                    lead.id
                ),
                None => format!("{} has no phone number.", lead.business_name),
            }
        }
        Command::Delete(raw) => {
            let lead = find_lead(db, require_id(&raw)?).await?;
            state.confirmations.lock().await.request_delete(&lead.id);
            format!(
                "Delete {}?\nSend /confirm to delete or /cancel.",
                render::lead_line(&lead)
            )
        }
        Command::Wipe => {
            let count = db.load_leads().await?.len();
            state.confirmations.lock().await.request_wipe();
            format!(
                "This deletes all {count} leads. Export a backup first (/export json).\n\
                 Send /confirm to continue or /cancel."
            )
        }
        Command::Confirm => {
            let step = state.confirmations.lock().await.confirm();
            match step {
                Step::Nothing => "Nothing to confirm.".to_string(),
                Step::AskAgain => {
                    "Are you absolutely sure? This cannot be undone. Send /confirm once more."
                        .to_string()
                }
                Step::Execute(Action::Delete(id)) => {
                    if db.delete_lead(&id).await? {
                        format!("Lead {id} deleted.")
                    } else {
                        format!("Lead {id} was already gone.")
                    }
                }
                Step::Execute(Action::Wipe) => format!("Deleted {} leads.", db.wipe().await?),
            }
        }
        Command::Cancel => {
            if state.confirmations.lock().await.cancel() {
                "Cancelled.".to_string()
            } else {
                "Nothing to cancel.".to_string()
            }
        }
        Command::Export(raw) => {
            let leads = db.load_leads().await?;
            let stamp = today.format("%Y-%m-%d");
            let (file_name, body) = match raw.trim().to_lowercase().as_str() {
                "" | "json" => (
                    format!("coldcall_pro_backup_{stamp}.json"),
                    backup::export_json(&leads)?,
                ),
                "csv" if leads.is_empty() => return Ok(Reply::Text("No data to export.".to_string())),
                "csv" => (format!("leads_export_{stamp}.csv"), csv::export(&leads)),
                "sync" => (
                    format!("sync_code_{stamp}.txt"),
                    backup::encode_sync_code(&leads)?,
                ),
                other => {
                    return Err(Error::InvalidField {
                        field: "format".to_string(),
                        value: other.to_string(),
                    })
                }
            };
            return Ok(Reply::Document {
                file_name,
                body: body.into_bytes(),
                caption: format!("{} leads", leads.len()),
            });
        }
        Command::Import(raw) => {
            let Some((url, mode)) = args::import_target(&raw) else {
                return Ok(Reply::Text("Usage: /import URL [overwrite]".to_string()));
            };
            let leads = fetch::fetch_leads(url).await?;
            import(state, leads, mode).await?
        }
        Command::Sync(raw) => {
            let Some((code, mode)) = args::import_target(&raw) else {
                return Ok(Reply::Text("Usage: /sync CODE [overwrite]".to_string()));
            };
            let leads = backup::decode_sync_code(code)?;
            import(state, leads, mode).await?
        }
        Command::Pace => render::session(&*state.session.lock().await, now),
        Command::ResetSession => {
            state.session.lock().await.reset(now);
            "New session started.".to_string()
        }
    };
    Ok(Reply::Text(render::fit_message(text)))
}
