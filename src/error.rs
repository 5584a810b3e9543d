use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;
use teloxide::RequestError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // -- Config
    ConfigMissingEnv(&'static str),
    ConfigWrongFormat(&'static str),

    // -- Lead rules
    EmptyBusinessName,
    LeadNotFound(String),
    InvalidField { field: String, value: String },

    // -- Import
    ImportNotArray,
    ImportBadRecord(usize, serde_json::Error),
    ImportTooLarge(usize),

    Sqlx(sqlx::Error),
    Request(RequestError),
    RequestFailed(reqwest::Error),
    Json(serde_json::Error),
    Base64(base64::DecodeError),
    Utf8(FromUtf8Error),
    Schedule(cron::error::Error),
}

impl Error {
    /// Text shown to the operator when a command fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyBusinessName => "Business name is required.".to_string(),
            Error::LeadNotFound(id) => format!("Lead {id} not found."),
            Error::InvalidField { field, value } => {
                format!("Invalid value \"{value}\" for {field}.")
            }
            Error::ImportNotArray => {
                "Invalid file format. File must contain an array of leads.".to_string()
            }
            Error::ImportBadRecord(idx, _) => {
                format!("Lead #{} in the import is not a valid record.", idx + 1)
            }
            Error::Json(_) => "Invalid JSON. Nothing was imported.".to_string(),
            Error::Base64(_) | Error::Utf8(_) => {
                "Invalid sync code. Make sure you copied the full string correctly.".to_string()
            }
            Error::ImportTooLarge(limit) => {
                format!("File is larger than {} MB. Nothing was imported.", limit / (1024 * 1024))
            }
            Error::RequestFailed(_) => "Could not download the file.".to_string(),
            _ => "Internal error, see logs.".to_string(),
        }
    }
}

// region:    ---From

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::RequestFailed(value)
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        Error::Sqlx(value)
    }
}

impl From<RequestError> for Error {
    fn from(value: RequestError) -> Self {
        Error::Request(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Json(value)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(value: base64::DecodeError) -> Self {
        Error::Base64(value)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Error::Utf8(value)
    }
}

impl From<cron::error::Error> for Error {
    fn from(value: cron::error::Error) -> Self {
        Error::Schedule(value)
    }
}

// endregion: ---From

// region:    --- Error boilerplate
impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}
// endregion: --- Error boilerplate
