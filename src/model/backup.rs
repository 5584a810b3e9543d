use crate::error::Error;
use crate::model::lead::Lead;
use crate::model::Db;
use crate::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashSet;

/// Characters left alone by `encodeURIComponent`.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep existing leads; imported records whose id is taken are dropped.
    SkipDuplicates,
    /// Replace the whole collection with the imported records.
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Applies an import to the collection. New records go in front; within one
/// batch the first record with a given id wins. No matching by business name.
pub fn merge(existing: Vec<Lead>, incoming: Vec<Lead>, mode: ImportMode) -> (Vec<Lead>, ImportSummary) {
    let mut seen: HashSet<String> = match mode {
        ImportMode::SkipDuplicates => existing.iter().map(|l| l.id.clone()).collect(),
        ImportMode::Overwrite => HashSet::new(),
    };
    let offered = incoming.len();
    let mut fresh: Vec<Lead> = incoming
        .into_iter()
        .filter(|l| seen.insert(l.id.clone()))
        .collect();
    let imported = fresh.len();

    let leads = match mode {
        ImportMode::SkipDuplicates => {
            fresh.extend(existing);
            fresh
        }
        ImportMode::Overwrite => fresh,
    };
    let summary = ImportSummary {
        imported,
        skipped: offered - imported,
        total: leads.len(),
    };
    (leads, summary)
}

pub fn export_json(leads: &[Lead]) -> Result<String> {
    Ok(serde_json::to_string_pretty(leads)?)
}

/// The top level must be an array and every element a lead-shaped object;
/// anything else aborts the whole import.
pub fn import_json(text: &str) -> Result<Vec<Lead>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Array(items) = value else {
        return Err(Error::ImportNotArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| serde_json::from_value(item).map_err(|e| Error::ImportBadRecord(idx, e)))
        .collect()
}

/// Opaque snapshot for pasting on another device: base64 of the
/// percent-encoded JSON array.
pub fn encode_sync_code(leads: &[Lead]) -> Result<String> {
    let json = serde_json::to_string(leads)?;
    let escaped = utf8_percent_encode(&json, URI_COMPONENT).to_string();
    Ok(STANDARD.encode(escaped))
}

pub fn decode_sync_code(code: &str) -> Result<Vec<Lead>> {
    let escaped = String::from_utf8(STANDARD.decode(code.trim())?)?;
    let json = String::from_utf8(percent_decode_str(&escaped).collect())?;
    import_json(&json)
}

impl Db {
    pub async fn bulk_import(&self, incoming: Vec<Lead>, mode: ImportMode) -> Result<ImportSummary> {
        let existing = self.load_leads().await?;
        let (leads, summary) = merge(existing, incoming, mode);
        self.save_leads(&leads).await?;
        info!(
            "import ({:?}): {} added, {} skipped, {} total",
            mode, summary.imported, summary.skipped, summary.total
        );
        Ok(summary)
    }
}
