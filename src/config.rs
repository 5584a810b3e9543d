use crate::error::Error;
use crate::model::call_log::LogPolicy;
use crate::model::queue::QueuePolicy;
use crate::model::whatsapp::{Sender, DEFAULT_OFFER};
use crate::Result;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

pub fn config() -> &'static Config {
    static INSTANCE: OnceLock<Config> = OnceLock::new();

    INSTANCE.get_or_init(|| {
        Config::load_from_env().unwrap_or_else(|err| {
            panic!("FATAL - WHILE LOADING Config -cause: {:?}", err);
        })
    })
}

#[allow(non_snake_case)]
pub struct Config {
    // --TG
    pub TG_OPERATOR_ID: i64,
    // -- DB
    pub DB_URL: String,
    // -- Schedule for worker
    pub SCHEDULE: String,
    // -- Messaging
    pub COUNTRY_CODE: String,
    pub SENDER_NAME: String,
    pub SENDER_WEBSITE: String,
    pub SENDER_OFFER: String,
    // -- Call policy
    pub SESSION_GOAL: u32,
    pub CLOSE_CLEARS_FOLLOW_UP: bool,
    pub QUEUE_REQUIRES_CONVERSATION: bool,
}

impl Config {
    fn load_from_env() -> Result<Config> {
        Ok(Config {
            TG_OPERATOR_ID: get_env_as_parse("TG_OPERATOR_ID")?,
            DB_URL: get_env("DB_URL")?,
            SCHEDULE: get_env("SCHEDULE")?,
            COUNTRY_CODE: get_env_or("COUNTRY_CODE", "34"),
            SENDER_NAME: get_env_or("SENDER_NAME", "Francesco"),
            SENDER_WEBSITE: get_env_or("SENDER_WEBSITE", "https://fgdigitalsystems.com"),
            // one line in .env, `\n` for line breaks
            SENDER_OFFER: get_env_or("SENDER_OFFER", DEFAULT_OFFER).replace("\\n", "\n"),
            SESSION_GOAL: get_env_as_parse_or("SESSION_GOAL", 50)?,
            CLOSE_CLEARS_FOLLOW_UP: get_env_as_parse_or("CLOSE_CLEARS_FOLLOW_UP", true)?,
            QUEUE_REQUIRES_CONVERSATION: get_env_as_parse_or(
                "QUEUE_REQUIRES_CONVERSATION",
                true,
            )?,
        })
    }
}

impl Config {
    pub fn log_policy(&self) -> LogPolicy {
        LogPolicy {
            close_clears_follow_up: self.CLOSE_CLEARS_FOLLOW_UP,
        }
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy {
            require_conversation: self.QUEUE_REQUIRES_CONVERSATION,
        }
    }

    pub fn sender(&self) -> Sender {
        Sender {
            name: self.SENDER_NAME.clone(),
            website: self.SENDER_WEBSITE.clone(),
            country_code: self.COUNTRY_CODE.clone(),
            offer: self.SENDER_OFFER.clone(),
        }
    }
}

fn get_env(name: &'static str) -> Result<String> {
    env::var(name).map_err(|_| Error::ConfigMissingEnv(name))
}

fn get_env_or(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_as_parse<T: FromStr>(name: &'static str) -> Result<T> {
    let val = get_env(name)?;
    val.parse::<T>().map_err(|_| Error::ConfigWrongFormat(name))
}

fn get_env_as_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(val) => val.parse::<T>().map_err(|_| Error::ConfigWrongFormat(name)),
        Err(_) => Ok(default),
    }
}
