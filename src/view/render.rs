use crate::model::backup::ImportSummary;
use crate::model::lead::Lead;
use crate::model::metrics::{Metrics, Window};
use crate::model::queue::{urgency, FollowUpQueue, Urgency};
use crate::view::session::Session;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::fmt::Write;

const MAX_LINES: usize = 30;

/// Telegram's text limit, counted in UTF-16 code units.
pub const MAX_MESSAGE: usize = 4096;
const CUT_MARK: &str = "\n... (cut)";

/// Trims `text` so Telegram accepts it. A rejected send after a committed
/// change would leave the operator without a reply.
pub fn fit_message(mut text: String) -> String {
    if text.encode_utf16().count() <= MAX_MESSAGE {
        return text;
    }
    let budget = MAX_MESSAGE - CUT_MARK.len();
    let mut used = 0;
    let end = text
        .char_indices()
        .find(|(_, c)| {
            used += c.len_utf16();
            used > budget
        })
        .map_or(text.len(), |(idx, _)| idx);
    text.truncate(end);
    text.push_str(CUT_MARK);
    text
}

fn local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

fn day(d: NaiveDate) -> String {
    d.format("%d.%m.%Y").to_string()
}

pub fn lead_line(lead: &Lead) -> String {
    let mut line = format!(
        "[{}] {} · {} · tries {} · {}",
        lead.id, lead.business_name, lead.lead_stage, lead.attempt_number, lead.outcome
    );
    if !lead.city.is_empty() {
        let _ = write!(line, " · {}", lead.city);
    }
    line
}

pub fn lead_card(lead: &Lead, link: Option<&str>) -> String {
    let mut out = format!("{}\nid: {}\n", lead.business_name, lead.id);
    let fields = [
        ("Contact", lead.contact_name.as_str()),
        ("Phone", lead.phone.as_str()),
        ("Profession", lead.profession.as_str()),
        ("City", lead.city.as_str()),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    let _ = writeln!(
        out,
        "Website: {} · Maps: {}",
        lead.website_status, lead.maps_visibility
    );
    let _ = writeln!(
        out,
        "Stage: {} · Tries: {} · Last outcome: {}",
        lead.lead_stage, lead.attempt_number, lead.outcome
    );
    let _ = writeln!(
        out,
        "Answered: {} · Interest: {} · WhatsApp sent: {}",
        lead.who_answered, lead.interest_level, lead.whatsapp_sent
    );
    if let Some(at) = lead.last_call_date {
        let _ = writeln!(out, "Last call: {}", local(at));
    }
    if let Some(d) = lead.follow_up_date {
        let _ = writeln!(out, "Follow up: {} {}", day(d), lead.follow_up_time);
    }
    if !lead.reminder_note.is_empty() {
        let _ = writeln!(out, "Reminder: {}", lead.reminder_note);
    }
    if !lead.next_action.is_empty() {
        let _ = writeln!(out, "Next: {}", lead.next_action);
    }
    if !lead.notes.is_empty() {
        let _ = writeln!(out, "Notes: {}", lead.notes);
    }
    if !lead.action_history.is_empty() {
        let _ = writeln!(out, "\nHistory:");
        for entry in lead.action_history.iter().take(10) {
            let _ = write!(out, "#{} {} {}", entry.attempt, local(entry.date), entry.outcome);
            if !entry.notes.is_empty() {
                let _ = write!(out, " - {}", entry.notes);
            }
            out.push('\n');
        }
    }
    if let Some(link) = link {
        let _ = writeln!(out, "\nWhatsApp: {link}");
    }
    out
}

pub fn lead_list(leads: &[&Lead]) -> String {
    if leads.is_empty() {
        return "No leads match.".to_string();
    }
    let mut out = format!("{} leads\n", leads.len());
    for lead in leads.iter().take(MAX_LINES) {
        let _ = writeln!(out, "{}", lead_line(lead));
    }
    if leads.len() > MAX_LINES {
        let _ = writeln!(out, "... and {} more", leads.len() - MAX_LINES);
    }
    out
}

fn queue_line(lead: &Lead, today: NaiveDate) -> String {
    let Some(date) = lead.follow_up_date else {
        return lead_line(lead);
    };
    let tag = match urgency(date, today) {
        Urgency::Overdue => "OVERDUE",
        Urgency::Today => "TODAY",
        Urgency::Upcoming => "",
    };
    let mut line = day(date);
    for part in [lead.follow_up_time.as_str(), tag] {
        if !part.is_empty() {
            line.push(' ');
            line.push_str(part);
        }
    }
    let _ = write!(line, " · [{}] {} · {}", lead.id, lead.business_name, lead.outcome);
    if !lead.reminder_note.is_empty() {
        let _ = write!(line, " · {}", lead.reminder_note);
    }
    line
}

pub fn queue(queue: &FollowUpQueue, today: NaiveDate) -> String {
    if queue.is_empty() {
        return "Follow-up queue is empty.".to_string();
    }
    let mut out = format!("Due now: {}\n", queue.due.len());
    for lead in queue.due.iter().take(MAX_LINES) {
        let _ = writeln!(out, "{}", queue_line(lead, today));
    }
    let _ = writeln!(out, "\nUpcoming: {}", queue.upcoming.len());
    for lead in queue.upcoming.iter().take(MAX_LINES) {
        let _ = writeln!(out, "{}", queue_line(lead, today));
    }
    out
}

/// Morning reminder, only the leads that need a call today.
pub fn digest(queue: &FollowUpQueue, today: NaiveDate) -> String {
    let mut out = format!(
        "Good morning! {} follow-ups due, {} upcoming.\n",
        queue.due.len(),
        queue.upcoming.len()
    );
    for lead in queue.due.iter().take(MAX_LINES) {
        let _ = writeln!(out, "{}", queue_line(lead, today));
    }
    out
}

pub fn metrics(m: &Metrics, window: Window, bounds: Option<(NaiveDate, NaiveDate)>) -> String {
    let mut out = match (bounds, window) {
        (Some((start, end)), _) => format!("Metrics, {} ({} - {})\n", window.name(), day(start), day(end)),
        (None, Window::Custom { start: Some(start), end: Some(end) }) => {
            format!("Metrics, custom ({} - {}, empty range)\n", day(start), day(end))
        }
        (None, _) => return "Custom window needs a start and end date: /metrics custom 2026-10-01 2026-10-15".to_string(),
    };
    let _ = writeln!(out, "Volume: {}", m.volume);
    let _ = writeln!(out, "Connect: {}% ({})", m.connection_rate, m.connected);
    let _ = writeln!(out, "Decision maker: {}% ({})", m.dm_reach_rate, m.decision_makers);
    let _ = writeln!(out, "Booking: {}% ({})", m.booking_rate, m.booked);
    let _ = writeln!(
        out,
        "WhatsApp: {} sent, {}% of connects",
        m.messages_sent, m.messaging_efficiency
    );
    let _ = writeln!(out, "\nOutcomes:");
    for (outcome, count) in m.outcomes.iter().filter(|(_, c)| *c > 0) {
        let _ = writeln!(out, "{outcome}: {count}");
    }
    if !m.hourly.is_empty() {
        let _ = writeln!(out, "\nBy hour:");
        for h in &m.hourly {
            let _ = writeln!(out, "{:02}:00 {}% of {}", h.hour, h.rate(), h.total);
        }
    }
    if let Some(peak) = m.peak_hour {
        let _ = writeln!(out, "Peak hour: {:02}:00 ({}%)", peak.hour, peak.rate());
    }
    out
}

pub fn import(summary: &ImportSummary) -> String {
    format!(
        "Imported {} leads, skipped {} duplicates. {} leads in total.",
        summary.imported, summary.skipped, summary.total
    )
}

pub fn session(session: &Session, now: DateTime<Utc>) -> String {
    format!(
        "Session: {} / {} calls ({}%)\nPace: {} calls/hr",
        session.calls(),
        session.goal(),
        session.progress(),
        session.pace(now)
    )
}
