use crate::model::lead::{
    parse_date, parse_timestamp, CallOutcome, Choice, InterestLevel, Lead, LeadStage,
    MapsVisibility, WebsiteStatus, WhatsAppSent, WhoAnswered, DEFAULT_PROFESSION,
    UNKNOWN_BUSINESS,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use std::collections::HashMap;
use std::fmt::Write;

const EXPORT_HEADERS: [&str; 16] = [
    "Business Name",
    "Phone",
    "Profession",
    "City",
    "Contact Name",
    "Lead Stage",
    "Attempt Number",
    "Last Outcome",
    "Interest Level",
    "Follow Up Date",
    "Follow Up Time",
    "Reminder Note",
    "Last Call Date",
    "Who Answered",
    "Notes",
    "Created At",
];

/// Splits CSV text into records. Quoted fields may hold commas, newlines and
/// `""` escapes. Fields are trimmed and blank lines dropped.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => record.push(std::mem::take(&mut field).trim().to_string()),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field).trim().to_string());
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }
    record.push(field.trim().to_string());
    push_record(&mut records, record);
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.iter().any(|f| !f.is_empty()) {
        records.push(record);
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace('"', "").replace(' ', "_")
}

struct Row<'a>(HashMap<&'a str, &'a str>);

impl Row<'_> {
    fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.0.get(k).copied())
            .find(|v| !v.is_empty())
    }

    fn text(&self, keys: &[&str]) -> String {
        self.get(keys).unwrap_or_default().to_string()
    }

    fn choice<T: Choice>(&self, keys: &[&str]) -> T {
        self.get(keys).and_then(T::from_label).unwrap_or_default()
    }
}

fn stage_from_column(raw: &str) -> LeadStage {
    match raw.trim().to_uppercase().replace(' ', "_").as_str() {
        "CONTACTED" | "IN_PROGRESS" => LeadStage::InProgress,
        "CLOSED" => LeadStage::Closed,
        "BOOKED" => LeadStage::Booked,
        _ => LeadStage::New,
    }
}

/// Leading digits only, the way a lenient integer parse reads "3 calls".
fn leading_number(raw: &str) -> u32 {
    let digits: String = raw.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn timestamp_or_day(raw: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(raw).or_else(|| {
        parse_date(raw)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    })
}

fn lead_from_row(row: &Row, now: DateTime<Utc>) -> Lead {
    let business = row
        .get(&["business_name", "business"])
        .unwrap_or(UNKNOWN_BUSINESS);
    let mut lead = Lead::blank(business, now);

    lead.contact_name = row.text(&["contact_name", "contact"]);
    lead.phone = row.text(&["phone"]);
    lead.profession = row
        .get(&["profession"])
        .unwrap_or(DEFAULT_PROFESSION)
        .to_string();
    lead.city = row.text(&["city"]);
    lead.website_status = row.choice::<WebsiteStatus>(&["website_status"]);
    lead.maps_visibility =
        row.choice::<MapsVisibility>(&["google_maps_visibility", "maps_visibility"]);
    lead.outcome = row.choice::<CallOutcome>(&["outcome", "last_outcome"]);
    lead.interest_level = row.choice::<InterestLevel>(&["interest_level"]);
    lead.whatsapp_sent = row.choice::<WhatsAppSent>(&["whatsapp_sent"]);
    lead.who_answered = row.choice::<WhoAnswered>(&["who_answered"]);
    lead.attempt_number = row
        .get(&["call_attempts", "attempts", "attempt_number"])
        .map(leading_number)
        .unwrap_or(0);
    lead.lead_stage = row
        .get(&["lead_stage"])
        .map(stage_from_column)
        .unwrap_or_default();
    if lead.attempt_number > 0 && lead.lead_stage == LeadStage::New {
        lead.lead_stage = LeadStage::InProgress;
    }
    lead.last_call_date = row
        .get(&["last_call_date"])
        .and_then(timestamp_or_day)
        .or((lead.attempt_number > 0).then_some(now));
    lead.follow_up_date = row.get(&["follow_up_date"]).and_then(parse_date);
    lead.follow_up_time = row.text(&["follow_up_time"]);
    lead.reminder_note = row.text(&["reminder_note"]);
    lead.next_action = row.text(&["next_action"]);
    lead.notes = row.text(&["notes"]);
    if let Some(created) = row.get(&["created_at"]).and_then(timestamp_or_day) {
        lead.created_at = created;
    }
    lead
}

/// Reads leads from CSV text. Never fails: anything missing or unreadable
/// takes the same default a freshly created lead has. Every row gets a new id.
pub fn import(text: &str, now: DateTime<Utc>) -> Vec<Lead> {
    let mut records = parse_records(text).into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    let leads: Vec<Lead> = records
        .map(|values| {
            let row = Row(header
                .iter()
                .enumerate()
                .map(|(i, h)| (h.as_str(), values.get(i).map(String::as_str).unwrap_or("")))
                .collect());
            lead_from_row(&row, now)
        })
        .collect();
    debug!("csv import parsed {} rows", leads.len());
    leads
}

fn quoted(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

pub fn export(leads: &[Lead]) -> String {
    let mut out = EXPORT_HEADERS.join(",");
    for lead in leads {
        let follow_up = lead
            .follow_up_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let last_call = lead
            .last_call_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        let fields = [
            quoted(&lead.business_name),
            quoted(&lead.phone),
            quoted(&lead.profession),
            quoted(&lead.city),
            quoted(&lead.contact_name),
            quoted(lead.lead_stage.label()),
            lead.attempt_number.to_string(),
            quoted(lead.outcome.label()),
            quoted(lead.interest_level.label()),
            quoted(&follow_up),
            quoted(&lead.follow_up_time),
            quoted(&lead.reminder_note),
            quoted(&last_call),
            quoted(lead.who_answered.label()),
            quoted(&lead.notes),
            quoted(&lead.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ];
        let _ = write!(out, "\n{}", fields.join(","));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    #[test]
    fn minimal_row_takes_defaults() {
        let text = "business_name,phone,outcome\n\"Acme Co\",555-1234,booked\n";
        let leads = import(text, now());
        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.business_name, "Acme Co");
        assert_eq!(lead.phone, "555-1234");
        assert_eq!(lead.outcome, CallOutcome::Booked);
        assert_eq!(lead.lead_stage, LeadStage::New);
        assert_eq!(lead.attempt_number, 0);
        assert_eq!(lead.profession, DEFAULT_PROFESSION);
        assert_eq!(lead.website_status, WebsiteStatus::No);
        assert_eq!(lead.maps_visibility, MapsVisibility::NotVisible);
        assert_eq!(lead.who_answered, WhoAnswered::NoAnswer);
        assert_eq!(lead.last_call_date, None);
        assert_eq!(lead.created_at, now());
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let records =
            parse_records("a,b,c\r\n\"x, y\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n\r\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["x, y", "say \"hi\"", "two\nlines"]);
    }

    #[test]
    fn header_synonyms_and_enum_matching() {
        let text = "Business,Contact,Google_Maps_Visibility,Last_Outcome,Interest_Level,WhatsApp_Sent,Call_Attempts,Lead_Stage,Follow_Up_Date\n\
                    Fisio Norte,Luis,page_1,CALL_LATER,hot,yes,2,contacted,2026-10-22\n\
                    Sin Nombre,,nowhere,maybe,lukewarm,,x,weird,soon";
        let leads = import(text, now());
        assert_eq!(leads.len(), 2);

        let a = &leads[0];
        assert_eq!(a.business_name, "Fisio Norte");
        assert_eq!(a.contact_name, "Luis");
        assert_eq!(a.maps_visibility, MapsVisibility::Page1);
        assert_eq!(a.outcome, CallOutcome::CallLater);
        assert_eq!(a.interest_level, InterestLevel::Hot);
        assert_eq!(a.whatsapp_sent, WhatsAppSent::Yes);
        assert_eq!(a.attempt_number, 2);
        assert_eq!(a.lead_stage, LeadStage::InProgress);
        assert_eq!(a.last_call_date, Some(now()));
        assert_eq!(a.follow_up_date, NaiveDate::from_ymd_opt(2026, 10, 22));

        let b = &leads[1];
        assert_eq!(b.maps_visibility, MapsVisibility::NotVisible);
        assert_eq!(b.outcome, CallOutcome::NoAnswer);
        assert_eq!(b.interest_level, InterestLevel::Cold);
        assert_eq!(b.attempt_number, 0);
        assert_eq!(b.lead_stage, LeadStage::New);
        assert_eq!(b.follow_up_date, None);
    }

    #[test]
    fn missing_business_name_uses_placeholder() {
        let leads = import("phone\n600000000", now());
        assert_eq!(leads[0].business_name, UNKNOWN_BUSINESS);
    }

    #[test]
    fn called_rows_never_stay_new() {
        let leads = import("business,attempts\nA,3 calls", now());
        assert_eq!(leads[0].attempt_number, 3);
        assert_eq!(leads[0].lead_stage, LeadStage::InProgress);
    }

    #[test]
    fn header_only_or_empty_yields_nothing() {
        assert!(import("", now()).is_empty());
        assert!(import("business_name,phone\n\n", now()).is_empty());
    }

    #[test]
    fn export_quotes_and_reimports() {
        let mut lead = Lead::blank("Bar \"El Puerto\"", now());
        lead.notes = "said \"call me\", maybe".to_string();
        lead.attempt_number = 2;
        lead.lead_stage = LeadStage::InProgress;
        lead.outcome = CallOutcome::NotNow;
        lead.last_call_date = Some(now());
        lead.follow_up_date = NaiveDate::from_ymd_opt(2026, 11, 2);

        let text = export(std::slice::from_ref(&lead));
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_HEADERS.join(","));
        assert!(text.contains("\"Bar \"\"El Puerto\"\"\""));
        assert!(text.contains(",2,\"Not now\","));

        let back = import(&text, now());
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].business_name, lead.business_name);
        assert_eq!(back[0].notes, lead.notes);
        assert_eq!(back[0].attempt_number, 2);
        assert_eq!(back[0].lead_stage, LeadStage::InProgress);
        assert_eq!(back[0].outcome, CallOutcome::NotNow);
        assert_eq!(back[0].follow_up_date, lead.follow_up_date);
        assert_eq!(back[0].last_call_date, lead.last_call_date);
        assert_ne!(back[0].id, lead.id);
    }
}
