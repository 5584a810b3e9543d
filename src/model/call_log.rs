use crate::error::Error;
use crate::model::lead::{
    new_id, ActionHistoryEntry, CallOutcome, InterestLevel, Lead, LeadStage, MapsVisibility,
    WebsiteStatus, WhatsAppSent, WhoAnswered, CLOSED_NEXT_ACTION,
};
use crate::model::Db;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};

/// Field edits that never count as a call. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadEdit {
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub profession: Option<String>,
    pub city: Option<String>,
    pub website_status: Option<WebsiteStatus>,
    pub maps_visibility: Option<MapsVisibility>,
    /// `Some(None)` clears the date.
    pub follow_up_date: Option<Option<NaiveDate>>,
    pub follow_up_time: Option<String>,
    pub reminder_note: Option<String>,
    pub next_action: Option<String>,
    pub whatsapp_sent: Option<WhatsAppSent>,
    pub notes: Option<String>,
}

impl LeadEdit {
    fn apply(self, lead: &mut Lead) -> Result<()> {
        if let Some(v) = self.business_name {
            lead.business_name = v.trim().to_string();
        }
        if lead.business_name.is_empty() {
            return Err(Error::EmptyBusinessName);
        }
        if let Some(v) = self.contact_name {
            lead.contact_name = v;
        }
        if let Some(v) = self.phone {
            lead.phone = v;
        }
        if let Some(v) = self.profession {
            lead.profession = v;
        }
        if let Some(v) = self.city {
            lead.city = v;
        }
        if let Some(v) = self.website_status {
            lead.website_status = v;
        }
        if let Some(v) = self.maps_visibility {
            lead.maps_visibility = v;
        }
        if let Some(v) = self.follow_up_date {
            lead.follow_up_date = v;
        }
        if let Some(v) = self.follow_up_time {
            lead.follow_up_time = v;
        }
        if let Some(v) = self.reminder_note {
            lead.reminder_note = v;
        }
        if let Some(v) = self.next_action {
            lead.next_action = v;
        }
        if let Some(v) = self.whatsapp_sent {
            lead.whatsapp_sent = v;
        }
        if let Some(v) = self.notes {
            lead.notes = v;
        }
        Ok(())
    }
}

/// What the operator records for one call, plus any field corrections made
/// on the same form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallInput {
    pub who_answered: Option<WhoAnswered>,
    pub outcome: Option<CallOutcome>,
    pub interest_level: Option<InterestLevel>,
    pub edit: LeadEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogPolicy {
    /// A hard "no" drops the scheduled follow-up.
    pub close_clears_follow_up: bool,
}

impl Default for LogPolicy {
    fn default() -> Self {
        LogPolicy {
            close_clears_follow_up: true,
        }
    }
}

pub fn stage_for(outcome: CallOutcome) -> LeadStage {
    match outcome {
        CallOutcome::Booked => LeadStage::Booked,
        CallOutcome::NotInterestedHard | CallOutcome::AlreadyGotSomeone => LeadStage::Closed,
        CallOutcome::NoAnswer
        | CallOutcome::Gatekeeper
        | CallOutcome::Interested
        | CallOutcome::NotNow
        | CallOutcome::CallLater
        | CallOutcome::FuturePotential => LeadStage::InProgress,
    }
}

pub fn create(edit: LeadEdit, now: DateTime<Utc>) -> Result<Lead> {
    let mut lead = Lead::blank("", now);
    edit.apply(&mut lead)?;
    Ok(lead)
}

pub fn log_call(lead: &Lead, input: CallInput, policy: LogPolicy, now: DateTime<Utc>) -> Result<Lead> {
    let mut next = lead.clone();
    input.edit.apply(&mut next)?;
    if let Some(v) = input.who_answered {
        next.who_answered = v;
    }
    if let Some(v) = input.outcome {
        next.outcome = v;
    }
    if let Some(v) = input.interest_level {
        next.interest_level = v;
    }

    next.attempt_number = lead.attempt_number.saturating_add(1);
    next.last_call_date = Some(now);
    next.lead_stage = stage_for(next.outcome);

    if policy.close_clears_follow_up && next.outcome == CallOutcome::NotInterestedHard {
        next.follow_up_date = None;
        next.follow_up_time.clear();
        next.next_action = CLOSED_NEXT_ACTION.to_string();
    }

    next.action_history.insert(
        0,
        ActionHistoryEntry {
            date: now,
            outcome: next.outcome,
            notes: next.notes.clone(),
            attempt: next.attempt_number,
        },
    );
    Ok(next)
}

/// Corrects data without logging a call: attempts, last call and stage stay.
pub fn save_info(lead: &Lead, edit: LeadEdit) -> Result<Lead> {
    let mut next = lead.clone();
    edit.apply(&mut next)?;
    Ok(next)
}

/// Prepends `lead`, rerolling its id on a collision.
pub fn insert_new(leads: &mut Vec<Lead>, mut lead: Lead) -> Lead {
    while leads.iter().any(|l| l.id == lead.id) {
        lead.id = new_id();
    }
    leads.insert(0, lead.clone());
    lead
}

pub fn replace(leads: &mut [Lead], lead: Lead) -> Result<()> {
    match leads.iter_mut().find(|l| l.id == lead.id) {
        Some(slot) => {
            *slot = lead;
            Ok(())
        }
        None => Err(Error::LeadNotFound(lead.id)),
    }
}

pub fn remove(leads: &mut Vec<Lead>, id: &str) -> bool {
    let before = leads.len();
    leads.retain(|l| l.id != id);
    leads.len() != before
}

fn find<'a>(leads: &'a [Lead], id: &str) -> Result<&'a Lead> {
    leads
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| Error::LeadNotFound(id.to_string()))
}

impl Db {
    pub async fn create_lead(&self, edit: LeadEdit) -> Result<Lead> {
        let lead = create(edit, Utc::now())?;
        let mut leads = self.load_leads().await?;
        let lead = insert_new(&mut leads, lead);
        self.save_leads(&leads).await?;
        info!("created lead {} ({})", lead.id, lead.business_name);
        Ok(lead)
    }

    pub async fn log_call(&self, id: &str, input: CallInput, policy: LogPolicy) -> Result<Lead> {
        let mut leads = self.load_leads().await?;
        let next = log_call(find(&leads, id)?, input, policy, Utc::now())?;
        replace(&mut leads, next.clone())?;
        self.save_leads(&leads).await?;
        info!(
            "logged call #{} on {}: {}",
            next.attempt_number, next.id, next.outcome
        );
        Ok(next)
    }

    pub async fn save_info(&self, id: &str, edit: LeadEdit) -> Result<Lead> {
        let mut leads = self.load_leads().await?;
        let next = save_info(find(&leads, id)?, edit)?;
        replace(&mut leads, next.clone())?;
        self.save_leads(&leads).await?;
        debug!("saved info for {}", next.id);
        Ok(next)
    }

    pub async fn delete_lead(&self, id: &str) -> Result<bool> {
        let mut leads = self.load_leads().await?;
        let removed = remove(&mut leads, id);
        if removed {
            self.save_leads(&leads).await?;
            info!("deleted lead {id}");
        }
        Ok(removed)
    }

    pub async fn wipe(&self) -> Result<usize> {
        let count = self.load_leads().await?.len();
        self.save_leads(&[]).await?;
        info!("wiped {count} leads");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::memory_db;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn named(name: &str) -> LeadEdit {
        LeadEdit {
            business_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn call(outcome: CallOutcome) -> CallInput {
        CallInput {
            outcome: Some(outcome),
            ..Default::default()
        }
    }

    #[test]
    fn create_starts_fresh() {
        let lead = create(named("  Clinic X "), t0()).unwrap();
        assert_eq!(lead.business_name, "Clinic X");
        assert_eq!(lead.attempt_number, 0);
        assert_eq!(lead.lead_stage, LeadStage::New);
        assert_eq!(lead.who_answered, WhoAnswered::NoAnswer);
        assert_eq!(lead.interest_level, InterestLevel::Cold);
        assert_eq!(lead.whatsapp_sent, WhatsAppSent::No);
        assert_eq!(lead.last_call_date, None);
        assert_eq!(lead.created_at, t0());
        assert!(lead.action_history.is_empty());
    }

    #[test]
    fn create_rejects_blank_name() {
        assert!(matches!(create(named("   "), t0()), Err(Error::EmptyBusinessName)));
        assert!(matches!(create(LeadEdit::default(), t0()), Err(Error::EmptyBusinessName)));
    }

    #[test]
    fn booked_call_moves_to_booked() {
        let lead = create(named("Clinic X"), t0()).unwrap();
        let later = t0() + Duration::minutes(5);
        let next = log_call(&lead, call(CallOutcome::Booked), LogPolicy::default(), later).unwrap();
        assert_eq!(next.attempt_number, 1);
        assert_eq!(next.lead_stage, LeadStage::Booked);
        assert_eq!(next.last_call_date, Some(later));
        assert_eq!(next.id, lead.id);
    }

    #[test]
    fn attempt_counter_saturates() {
        let mut lead = create(named("Clinic X"), t0()).unwrap();
        lead.attempt_number = u32::MAX;
        let next = log_call(&lead, call(CallOutcome::NotNow), LogPolicy::default(), t0()).unwrap();
        assert_eq!(next.attempt_number, u32::MAX);
        assert_eq!(next.action_history[0].attempt, u32::MAX);
    }

    #[test]
    fn stage_depends_only_on_outcome() {
        use crate::model::lead::Choice;
        let base = create(named("Any"), t0()).unwrap();
        for prior in LeadStage::ALL {
            for outcome in CallOutcome::ALL {
                let mut lead = base.clone();
                lead.lead_stage = *prior;
                let next = log_call(&lead, call(*outcome), LogPolicy::default(), t0()).unwrap();
                assert_eq!(next.lead_stage, stage_for(*outcome));
            }
        }
        assert_eq!(stage_for(CallOutcome::AlreadyGotSomeone), LeadStage::Closed);
        assert_eq!(stage_for(CallOutcome::NotInterestedHard), LeadStage::Closed);
        assert_eq!(stage_for(CallOutcome::NoAnswer), LeadStage::InProgress);
    }

    #[test]
    fn every_call_adds_one_attempt_and_history() {
        let mut lead = create(named("Clinic X"), t0()).unwrap();
        for n in 1..=3u32 {
            let input = CallInput {
                outcome: Some(CallOutcome::CallLater),
                edit: LeadEdit {
                    notes: Some(format!("try {n}")),
                    ..Default::default()
                },
                ..Default::default()
            };
            lead = log_call(&lead, input, LogPolicy::default(), t0() + Duration::hours(n as i64))
                .unwrap();
            assert_eq!(lead.attempt_number, n);
        }
        assert_eq!(lead.notes, "try 3");
        let attempts: Vec<u32> = lead.action_history.iter().map(|h| h.attempt).collect();
        assert_eq!(attempts, vec![3, 2, 1]);
        assert_eq!(lead.action_history[0].notes, "try 3");
    }

    #[test]
    fn omitted_fields_keep_previous_values() {
        let mut lead = create(named("Clinic X"), t0()).unwrap();
        lead.interest_level = InterestLevel::Hot;
        lead.who_answered = WhoAnswered::Owner;
        let next = log_call(&lead, CallInput::default(), LogPolicy::default(), t0()).unwrap();
        assert_eq!(next.interest_level, InterestLevel::Hot);
        assert_eq!(next.who_answered, WhoAnswered::Owner);
        assert_eq!(next.outcome, CallOutcome::NoAnswer);
        assert_eq!(next.lead_stage, LeadStage::InProgress);
    }

    #[test]
    fn hard_no_clears_follow_up_under_policy() {
        let mut lead = create(named("Clinic X"), t0()).unwrap();
        lead.follow_up_date = NaiveDate::from_ymd_opt(2026, 10, 25);
        lead.follow_up_time = "10:00".to_string();

        let closed = log_call(
            &lead,
            call(CallOutcome::NotInterestedHard),
            LogPolicy::default(),
            t0(),
        )
        .unwrap();
        assert_eq!(closed.follow_up_date, None);
        assert_eq!(closed.follow_up_time, "");
        assert_eq!(closed.next_action, CLOSED_NEXT_ACTION);
        assert_eq!(closed.lead_stage, LeadStage::Closed);

        let kept = log_call(
            &lead,
            call(CallOutcome::NotInterestedHard),
            LogPolicy {
                close_clears_follow_up: false,
            },
            t0(),
        )
        .unwrap();
        assert_eq!(kept.follow_up_date, lead.follow_up_date);
    }

    #[test]
    fn save_info_is_not_a_call() {
        let lead = create(named("Clinic X"), t0()).unwrap();
        let called = log_call(&lead, call(CallOutcome::Interested), LogPolicy::default(), t0())
            .unwrap();
        let edited = save_info(
            &called,
            LeadEdit {
                phone: Some("600111222".to_string()),
                whatsapp_sent: Some(WhatsAppSent::Yes),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(edited.phone, "600111222");
        assert_eq!(edited.whatsapp_sent, WhatsAppSent::Yes);
        assert_eq!(edited.attempt_number, 1);
        assert_eq!(edited.last_call_date, called.last_call_date);
        assert_eq!(edited.lead_stage, LeadStage::InProgress);
        assert_eq!(edited.action_history.len(), 1);

        let blanked = save_info(&called, named(""));
        assert!(matches!(blanked, Err(Error::EmptyBusinessName)));
    }

    #[test]
    fn insert_new_keeps_ids_unique() {
        let first = create(named("A"), t0()).unwrap();
        let mut leads = vec![first.clone()];
        let mut clash = create(named("B"), t0()).unwrap();
        clash.id = first.id.clone();
        let stored = insert_new(&mut leads, clash);
        assert_ne!(stored.id, first.id);
        assert_eq!(leads[0].business_name, "B");
        assert_eq!(leads.len(), 2);
    }

    #[tokio::test]
    async fn store_round_trip_of_call_lifecycle() {
        let db = memory_db().await;
        let lead = db.create_lead(named("Clinic X")).await.unwrap();
        let next = db
            .log_call(&lead.id, call(CallOutcome::Interested), LogPolicy::default())
            .await
            .unwrap();
        assert_eq!(next.attempt_number, 1);

        let stored = db.read_lead(&lead.id).await.unwrap().unwrap();
        assert_eq!(stored.lead_stage, LeadStage::InProgress);
        assert_eq!(stored.action_history.len(), 1);

        assert!(db.delete_lead(&lead.id).await.unwrap());
        assert!(!db.delete_lead(&lead.id).await.unwrap());
        assert!(matches!(
            db.log_call(&lead.id, CallInput::default(), LogPolicy::default()).await,
            Err(Error::LeadNotFound(_))
        ));
    }

    #[tokio::test]
    async fn wipe_clears_everything() {
        let db = memory_db().await;
        db.create_lead(named("A")).await.unwrap();
        db.create_lead(named("B")).await.unwrap();
        assert_eq!(db.wipe().await.unwrap(), 2);
        assert!(db.load_leads().await.unwrap().is_empty());
    }
}
