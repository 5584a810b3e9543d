use crate::model::lead::Lead;
use chrono::{NaiveDate, TimeZone};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFilter {
    /// Business name (case-insensitive) or phone substring.
    pub term: Option<String>,
    pub profession: Option<String>,
    pub city: Option<String>,
    pub hide_finished: bool,
    pub needs_help: bool,
}

impl Default for LeadFilter {
    fn default() -> Self {
        LeadFilter {
            term: None,
            profession: None,
            city: None,
            hide_finished: true,
            needs_help: false,
        }
    }
}

impl LeadFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(term) = &self.term {
            let name_hit = lead
                .business_name
                .to_lowercase()
                .contains(&term.to_lowercase());
            if !name_hit && !lead.phone.contains(term.as_str()) {
                return false;
            }
        }
        if let Some(profession) = &self.profession {
            if &lead.profession != profession {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !lead.city.to_lowercase().contains(&city.to_lowercase()) {
                return false;
            }
        }
        if self.hide_finished && lead.lead_stage.is_finished() {
            return false;
        }
        if self.needs_help && !lead.needs_help() {
            return false;
        }
        true
    }
}

/// Leads called today first, then never-called ones, then most recently called.
pub fn search<'a, Tz: TimeZone>(
    leads: &'a [Lead],
    filter: &LeadFilter,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Lead> {
    let called_today =
        |l: &Lead| l.last_call_date.is_some_and(|at| at.with_timezone(tz).date_naive() == today);

    let mut found: Vec<&Lead> = leads.iter().filter(|l| filter.matches(l)).collect();
    found.sort_by(|a, b| {
        match (called_today(a), called_today(b)) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        match (a.attempt_number == 0, b.attempt_number == 0) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        b.last_call_date.cmp(&a.last_call_date)
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::lead::{LeadStage, MapsVisibility, WebsiteStatus};
    use chrono::{DateTime, Utc};

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap()
    }

    fn lead(name: &str, last_call: Option<DateTime<Utc>>) -> Lead {
        let mut lead = Lead::blank(name, at(1, 8));
        lead.last_call_date = last_call;
        lead.attempt_number = u32::from(last_call.is_some());
        if last_call.is_some() {
            lead.lead_stage = LeadStage::InProgress;
        }
        lead
    }

    #[test]
    fn term_matches_name_or_phone() {
        let mut a = lead("Clinica Dental Sol", None);
        a.phone = "600 111 222".to_string();
        let filter = LeadFilter {
            term: Some("dental".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&a));
        let filter = LeadFilter {
            term: Some("111".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&a));
        let filter = LeadFilter {
            term: Some("fisio".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&a));
    }

    #[test]
    fn finished_leads_hidden_by_default() {
        let mut booked = lead("Booked", Some(at(18, 9)));
        booked.lead_stage = LeadStage::Booked;
        assert!(!LeadFilter::default().matches(&booked));
        let show_all = LeadFilter {
            hide_finished: false,
            ..Default::default()
        };
        assert!(show_all.matches(&booked));
    }

    #[test]
    fn city_profession_and_needs_help() {
        let mut a = lead("A", None);
        a.city = "Valencia".to_string();
        a.profession = "Dentista".to_string();
        a.website_status = WebsiteStatus::Good;
        a.maps_visibility = MapsVisibility::Top3;

        let by_city = LeadFilter {
            city: Some("valen".to_string()),
            profession: Some("Dentista".to_string()),
            ..Default::default()
        };
        assert!(by_city.matches(&a));

        let help = LeadFilter {
            needs_help: true,
            ..Default::default()
        };
        assert!(!help.matches(&a));
        a.website_status = WebsiteStatus::Broken;
        assert!(help.matches(&a));
    }

    #[test]
    fn ordering_puts_today_then_fresh_then_recent() {
        let leads = vec![
            lead("old", Some(at(10, 9))),
            lead("fresh", None),
            lead("today", Some(at(19, 9))),
            lead("recent", Some(at(17, 9))),
        ];
        let found = search(&leads, &LeadFilter::default(), at(19, 0).date_naive(), &Utc);
        let names: Vec<&str> = found.iter().map(|l| l.business_name.as_str()).collect();
        assert_eq!(names, vec!["today", "fresh", "recent", "old"]);
    }
}
