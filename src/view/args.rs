use crate::error::Error;
use crate::model::backup::ImportMode;
use crate::model::call_log::{CallInput, LeadEdit};
use crate::model::lead::{parse_date, Choice};
use crate::model::metrics::Window;
use crate::model::search::LeadFilter;
use crate::Result;
use chrono::{Days, NaiveDate};

/// `head; key=value; key=value`. The head is the first segment when it has no
/// `=` in it (a business name, a lead id or a search term).
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub head: String,
    pub fields: Vec<(String, String)>,
}

pub fn split(raw: &str) -> Args {
    let mut args = Args::default();
    for (idx, part) in raw.split(';').enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((key, value)) => args.fields.push((normalize_key(key), value.trim().to_string())),
            None if idx == 0 => args.head = part.to_string(),
            None => args.fields.push((normalize_key(part), String::new())),
        }
    }
    args
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

fn invalid(field: &str, value: &str) -> Error {
    Error::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    }
}

pub fn choice<T: Choice>(field: &str, value: &str) -> Result<T> {
    T::from_label(value).ok_or_else(|| invalid(field, value))
}

/// `YYYY-MM-DD`, `today`, `tomorrow` or `+N` days; `none` clears.
pub fn date(field: &str, value: &str, today: NaiveDate) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    let parsed = match value.to_lowercase().as_str() {
        "" | "none" | "-" | "clear" => return Ok(None),
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        v if v.starts_with('+') => v[1..]
            .parse::<u64>()
            .ok()
            .and_then(|n| today.checked_add_days(Days::new(n))),
        _ => parse_date(value),
    };
    parsed.map(Some).ok_or_else(|| invalid(field, value))
}

fn apply_edit_field(edit: &mut LeadEdit, key: &str, value: &str, today: NaiveDate) -> Result<()> {
    let text = || Some(value.to_string());
    match key {
        "business" | "business_name" | "name" => edit.business_name = text(),
        "contact" | "contact_name" => edit.contact_name = text(),
        "phone" => edit.phone = text(),
        "profession" => edit.profession = text(),
        "city" => edit.city = text(),
        "website" | "website_status" => edit.website_status = Some(choice(key, value)?),
        "maps" | "maps_visibility" => edit.maps_visibility = Some(choice(key, value)?),
        "follow_up" | "follow_up_date" | "date" => edit.follow_up_date = Some(date(key, value, today)?),
        "time" | "follow_up_time" => edit.follow_up_time = text(),
        "reminder" | "reminder_note" => edit.reminder_note = text(),
        "next" | "next_action" => edit.next_action = text(),
        "whatsapp" | "whatsapp_sent" => edit.whatsapp_sent = Some(choice(key, value)?),
        "notes" | "note" => edit.notes = text(),
        _ => return Err(invalid(key, value)),
    }
    Ok(())
}

pub fn lead_edit(fields: &[(String, String)], today: NaiveDate) -> Result<LeadEdit> {
    let mut edit = LeadEdit::default();
    for (key, value) in fields {
        apply_edit_field(&mut edit, key, value, today)?;
    }
    Ok(edit)
}

pub fn call_input(fields: &[(String, String)], today: NaiveDate) -> Result<CallInput> {
    let mut input = CallInput::default();
    for (key, value) in fields {
        match key.as_str() {
            "who" | "who_answered" => input.who_answered = Some(choice(key, value)?),
            "outcome" | "result" => input.outcome = Some(choice(key, value)?),
            "interest" | "interest_level" => input.interest_level = Some(choice(key, value)?),
            _ => apply_edit_field(&mut input.edit, key, value, today)?,
        }
    }
    Ok(input)
}

/// Head is the search term; `all` shows finished leads, `help` keeps only
/// leads with a weak web or maps presence.
pub fn lead_filter(raw: &str) -> Result<LeadFilter> {
    let args = split(raw);
    let mut filter = LeadFilter::default();
    match args.head.to_lowercase().as_str() {
        "" => {}
        "all" => filter.hide_finished = false,
        "help" => filter.needs_help = true,
        _ => filter.term = Some(args.head.clone()),
    }
    for (key, value) in &args.fields {
        match key.as_str() {
            "all" => filter.hide_finished = false,
            "help" | "needs_help" => filter.needs_help = true,
            "q" | "term" => filter.term = Some(value.clone()),
            "city" => filter.city = Some(value.clone()),
            "profession" => filter.profession = Some(value.clone()),
            _ => return Err(invalid(key, value)),
        }
    }
    Ok(filter)
}

/// `daily` (default), `weekly`, `monthly` or `custom FROM TO`.
pub fn window(raw: &str) -> Result<Window> {
    let mut words = raw.split_whitespace();
    match words.next().map(str::to_lowercase).as_deref() {
        None | Some("daily") | Some("today") => Ok(Window::Daily),
        Some("weekly") | Some("week") => Ok(Window::Weekly),
        Some("monthly") | Some("month") => Ok(Window::Monthly),
        Some("custom") => Ok(Window::Custom {
            start: words.next().and_then(parse_date),
            end: words.next().and_then(parse_date),
        }),
        Some(other) => Err(invalid("window", other)),
    }
}

/// Payload plus an optional trailing `overwrite`.
pub fn import_target(raw: &str) -> Option<(&str, ImportMode)> {
    let mut words = raw.split_whitespace();
    let target = words.next()?;
    let mode = if words.any(|w| w.eq_ignore_ascii_case("overwrite")) {
        ImportMode::Overwrite
    } else {
        ImportMode::SkipDuplicates
    };
    Some((target, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::{CallOutcome, InterestLevel, WhatsAppSent, WhoAnswered};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn split_head_and_fields() {
        let args = split(" Clinic X ; phone = 600 111 222 ;City=Madrid;; Follow-Up=tomorrow");
        assert_eq!(args.head, "Clinic X");
        assert_eq!(
            args.fields,
            vec![
                ("phone".to_string(), "600 111 222".to_string()),
                ("city".to_string(), "Madrid".to_string()),
                ("follow_up".to_string(), "tomorrow".to_string()),
            ]
        );
        assert_eq!(split("phone=1").head, "");
    }

    #[test]
    fn relative_and_cleared_dates() {
        assert_eq!(date("d", "today", today()).unwrap(), Some(today()));
        assert_eq!(
            date("d", "tomorrow", today()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 20)
        );
        assert_eq!(
            date("d", "+12", today()).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 31)
        );
        assert_eq!(date("d", "none", today()).unwrap(), None);
        assert!(date("d", "next week", today()).is_err());
    }

    #[test]
    fn call_fields_route_to_call_or_edit() {
        let args = split("k1; outcome=call_later; who=owner; interest=WARM; follow_up=2026-10-25; notes=ring after 5; whatsapp=yes");
        let input = call_input(&args.fields, today()).unwrap();
        assert_eq!(input.outcome, Some(CallOutcome::CallLater));
        assert_eq!(input.who_answered, Some(WhoAnswered::Owner));
        assert_eq!(input.interest_level, Some(InterestLevel::Warm));
        assert_eq!(input.edit.follow_up_date, Some(NaiveDate::from_ymd_opt(2026, 10, 25)));
        assert_eq!(input.edit.notes.as_deref(), Some("ring after 5"));
        assert_eq!(input.edit.whatsapp_sent, Some(WhatsAppSent::Yes));
    }

    #[test]
    fn typos_are_rejected_not_defaulted() {
        let args = split("k1; outcome=bookd");
        assert!(matches!(
            call_input(&args.fields, today()),
            Err(Error::InvalidField { .. })
        ));
        let args = split("k1; colour=red");
        assert!(lead_edit(&args.fields, today()).is_err());
    }

    #[test]
    fn filters_and_windows() {
        let filter = lead_filter("dental; city=valencia; all").unwrap();
        assert_eq!(filter.term.as_deref(), Some("dental"));
        assert_eq!(filter.city.as_deref(), Some("valencia"));
        assert!(!filter.hide_finished);
        assert!(lead_filter("help").unwrap().needs_help);

        assert_eq!(window("").unwrap(), Window::Daily);
        assert_eq!(window("Weekly").unwrap(), Window::Weekly);
        assert_eq!(
            window("custom 2026-10-01").unwrap(),
            Window::Custom {
                start: NaiveDate::from_ymd_opt(2026, 10, 1),
                end: None
            }
        );
        assert!(window("yearly").is_err());
    }

    #[test]
    fn import_target_reads_mode() {
        assert_eq!(
            import_target("https://x/a.csv"),
            Some(("https://x/a.csv", ImportMode::SkipDuplicates))
        );
        assert_eq!(
            import_target("CODE overwrite"),
            Some(("CODE", ImportMode::Overwrite))
        );
        assert_eq!(import_target("   "), None);
    }
}
