use crate::error::Error;
use crate::model::backup::import_json;
use crate::model::csv;
use crate::model::lead::Lead;
use crate::Result;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

/// `.csv` paths are CSV; otherwise a body starting with `[` is JSON.
pub fn detect_format(source: &str, body: &str) -> Format {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    if path.to_lowercase().ends_with(".csv") {
        return Format::Csv;
    }
    if body.trim_start().starts_with('[') {
        Format::Json
    } else {
        Format::Csv
    }
}

pub fn parse_document(source: &str, body: &str, now: DateTime<Utc>) -> Result<Vec<Lead>> {
    match detect_format(source, body) {
        Format::Csv => Ok(csv::import(body, now)),
        Format::Json => import_json(body),
    }
}

/// Largest document accepted by a remote import.
pub const MAX_DOWNLOAD: usize = 20 * 1024 * 1024;

fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<()> {
    if body.len() + chunk.len() > limit {
        return Err(Error::ImportTooLarge(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Reads the whole document before anything is parsed, so a broken download
/// never reaches the store.
pub async fn download(url: &str) -> Result<String> {
    let mut response = Client::new().get(url).send().await?.error_for_status()?;
    if response
        .content_length()
        .is_some_and(|len| len > MAX_DOWNLOAD as u64)
    {
        return Err(Error::ImportTooLarge(MAX_DOWNLOAD));
    }
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        append_capped(&mut body, &chunk, MAX_DOWNLOAD)?;
    }
    debug!("downloaded {} bytes from {url}", body.len());
    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub async fn fetch_leads(url: &str) -> Result<Vec<Lead>> {
    let body = download(url).await?;
    parse_document(url, &body, Utc::now())
}
