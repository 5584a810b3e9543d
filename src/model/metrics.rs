use crate::model::lead::{CallOutcome, Choice, Lead, WhatsAppSent, WhoAnswered};
use chrono::{Days, NaiveDate, TimeZone, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Daily,
    Weekly,
    Monthly,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl Window {
    /// Inclusive calendar-day bounds, `None` when the window is empty.
    pub fn bounds(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            Window::Daily => Some((today, today)),
            Window::Weekly => Some((today.checked_sub_days(Days::new(7))?, today)),
            Window::Monthly => Some((today.checked_sub_days(Days::new(30))?, today)),
            Window::Custom {
                start: Some(start),
                end: Some(end),
            } if start <= end => Some((start, end)),
            Window::Custom { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Window::Daily => "daily",
            Window::Weekly => "weekly",
            Window::Monthly => "monthly",
            Window::Custom { .. } => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourStat {
    pub hour: u32,
    pub total: usize,
    pub connected: usize,
}

impl HourStat {
    pub fn rate(&self) -> u32 {
        percent(self.connected, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub volume: usize,
    pub connected: usize,
    pub decision_makers: usize,
    pub booked: usize,
    pub messages_sent: usize,
    pub connection_rate: u32,
    pub dm_reach_rate: u32,
    pub booking_rate: u32,
    pub messaging_efficiency: u32,
    /// Every outcome in declaration order, zeros included.
    pub outcomes: Vec<(CallOutcome, usize)>,
    /// Hours with at least one call, ascending.
    pub hourly: Vec<HourStat>,
    pub peak_hour: Option<HourStat>,
}

/// Rounded percentage, zero when there is nothing to divide by.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

pub fn in_window<Tz: TimeZone>(lead: &Lead, start: NaiveDate, end: NaiveDate, tz: &Tz) -> bool {
    match lead.last_call_date {
        None => false,
        Some(at) => {
            let day = at.with_timezone(tz).date_naive();
            start <= day && day <= end
        }
    }
}

pub fn compute<Tz: TimeZone>(leads: &[Lead], window: Window, today: NaiveDate, tz: &Tz) -> Metrics {
    let picked: Vec<&Lead> = match window.bounds(today) {
        Some((start, end)) => leads
            .iter()
            .filter(|l| in_window(l, start, end, tz))
            .collect(),
        None => Vec::new(),
    };
    aggregate(&picked, tz)
}

fn aggregate<Tz: TimeZone>(leads: &[&Lead], tz: &Tz) -> Metrics {
    let volume = leads.len();
    let connected = leads
        .iter()
        .filter(|l| l.who_answered != WhoAnswered::NoAnswer)
        .count();
    let decision_makers = leads
        .iter()
        .filter(|l| l.who_answered == WhoAnswered::Owner)
        .count();
    let booked = leads
        .iter()
        .filter(|l| l.outcome == CallOutcome::Booked)
        .count();
    let messages_sent = leads
        .iter()
        .filter(|l| l.whatsapp_sent == WhatsAppSent::Yes)
        .count();

    let outcomes = CallOutcome::ALL
        .iter()
        .map(|o| (*o, leads.iter().filter(|l| l.outcome == *o).count()))
        .collect();

    let mut hours = [(0usize, 0usize); 24];
    for lead in leads {
        if let Some(at) = lead.last_call_date {
            let hour = at.with_timezone(tz).hour() as usize;
            hours[hour].0 += 1;
            if lead.who_answered != WhoAnswered::NoAnswer {
                hours[hour].1 += 1;
            }
        }
    }
    let hourly: Vec<HourStat> = hours
        .iter()
        .enumerate()
        .filter(|(_, (total, _))| *total > 0)
        .map(|(hour, (total, connected))| HourStat {
            hour: hour as u32,
            total: *total,
            connected: *connected,
        })
        .collect();

    let mut peak_hour: Option<HourStat> = None;
    for stat in &hourly {
        let better = match peak_hour {
            None => true,
            Some(best) => stat.connected * best.total > best.connected * stat.total,
        };
        if better {
            peak_hour = Some(*stat);
        }
    }

    Metrics {
        volume,
        connected,
        decision_makers,
        booked,
        messages_sent,
        connection_rate: percent(connected, volume),
        dm_reach_rate: percent(decision_makers, connected),
        booking_rate: percent(booked, volume),
        messaging_efficiency: percent(messages_sent, connected),
        outcomes,
        hourly,
        peak_hour,
    }
}
