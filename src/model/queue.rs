use crate::model::lead::{CallOutcome, Lead, LeadStage};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    /// Only leads where a real conversation happened on the last call.
    pub require_conversation: bool,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        QueuePolicy {
            require_conversation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue,
    Today,
    Upcoming,
}

#[derive(Debug, Default)]
pub struct FollowUpQueue<'a> {
    pub due: Vec<&'a Lead>,
    pub upcoming: Vec<&'a Lead>,
}

impl FollowUpQueue<'_> {
    pub fn len(&self) -> usize {
        self.due.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn qualifies(lead: &Lead, policy: QueuePolicy) -> bool {
    let stage_open = match lead.lead_stage {
        LeadStage::InProgress => true,
        LeadStage::New | LeadStage::Booked | LeadStage::Closed => false,
    };
    lead.attempt_number > 0
        && lead.follow_up_date.is_some()
        && stage_open
        && !(policy.require_conversation && lead.outcome == CallOutcome::NoAnswer)
}

pub fn urgency(date: NaiveDate, today: NaiveDate) -> Urgency {
    if date < today {
        Urgency::Overdue
    } else if date == today {
        Urgency::Today
    } else {
        Urgency::Upcoming
    }
}

/// Splits the qualifying leads into due (on or before `today`) and upcoming,
/// each earliest first. Equal dates keep collection order.
pub fn follow_up_queue(leads: &[Lead], today: NaiveDate, policy: QueuePolicy) -> FollowUpQueue<'_> {
    let mut queued: Vec<(&Lead, NaiveDate)> = leads
        .iter()
        .filter(|l| qualifies(l, policy))
        .filter_map(|l| l.follow_up_date.map(|d| (l, d)))
        .collect();
    queued.sort_by_key(|(_, d)| *d);

    let mut queue = FollowUpQueue::default();
    for (lead, date) in queued {
        if date <= today {
            queue.due.push(lead);
        } else {
            queue.upcoming.push(lead);
        }
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::call_log::{create, log_call, CallInput, LeadEdit, LogPolicy};
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn called(name: &str, outcome: CallOutcome, follow_up: Option<NaiveDate>) -> Lead {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let lead = create(
            LeadEdit {
                business_name: Some(name.to_string()),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        let input = CallInput {
            outcome: Some(outcome),
            edit: LeadEdit {
                follow_up_date: Some(follow_up),
                ..Default::default()
            },
            ..Default::default()
        };
        log_call(&lead, input, LogPolicy::default(), now).unwrap()
    }

    #[test]
    fn interested_tomorrow_is_upcoming() {
        let today = day(19);
        let leads = vec![called("B", CallOutcome::Interested, Some(day(20)))];
        let queue = follow_up_queue(&leads, today, QueuePolicy::default());
        assert!(queue.due.is_empty());
        assert_eq!(queue.upcoming.len(), 1);
        assert_eq!(leads[0].lead_stage, LeadStage::InProgress);
    }

    #[test]
    fn booked_and_closed_never_queue() {
        let today = day(19);
        let leads = vec![
            called("A", CallOutcome::Booked, Some(day(18))),
            called("B", CallOutcome::AlreadyGotSomeone, Some(day(18))),
        ];
        assert!(follow_up_queue(&leads, today, QueuePolicy::default()).is_empty());
    }

    #[test]
    fn uncalled_or_undated_leads_never_queue() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let mut fresh = Lead::blank("Fresh", now);
        fresh.follow_up_date = Some(day(19));
        let undated = called("Undated", CallOutcome::Interested, None);
        let leads = vec![fresh, undated];
        assert!(follow_up_queue(&leads, day(19), QueuePolicy::default()).is_empty());
    }

    #[test]
    fn no_answer_is_policy_driven() {
        let leads = vec![called("A", CallOutcome::NoAnswer, Some(day(19)))];
        assert!(follow_up_queue(&leads, day(19), QueuePolicy::default()).is_empty());
        let relaxed = QueuePolicy {
            require_conversation: false,
        };
        assert_eq!(follow_up_queue(&leads, day(19), relaxed).due.len(), 1);
    }

    #[test]
    fn buckets_partition_and_sort() {
        let leads = vec![
            called("late", CallOutcome::CallLater, Some(day(25))),
            called("today", CallOutcome::Interested, Some(day(19))),
            called("overdue", CallOutcome::NotNow, Some(day(12))),
            called("soon", CallOutcome::FuturePotential, Some(day(20))),
            called("today-2", CallOutcome::Gatekeeper, Some(day(19))),
        ];
        let queue = follow_up_queue(&leads, day(19), QueuePolicy::default());
        let names = |v: &[&Lead]| v.iter().map(|l| l.business_name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&queue.due), vec!["overdue", "today", "today-2"]);
        assert_eq!(names(&queue.upcoming), vec!["soon", "late"]);

        let qualifying = leads.iter().filter(|l| qualifies(l, QueuePolicy::default())).count();
        assert_eq!(queue.len(), qualifying);
        for lead in &queue.due {
            assert!(!queue.upcoming.iter().any(|u| u.id == lead.id));
        }
    }

    #[test]
    fn upcoming_becomes_due_on_its_date() {
        let leads = vec![called("A", CallOutcome::Interested, Some(day(23)))];
        let policy = QueuePolicy::default();
        assert_eq!(follow_up_queue(&leads, day(19), policy).upcoming.len(), 1);
        assert_eq!(follow_up_queue(&leads, day(23), policy).due.len(), 1);
        assert_eq!(follow_up_queue(&leads, day(30), policy).due.len(), 1);
    }

    #[test]
    fn urgency_classes() {
        assert_eq!(urgency(day(18), day(19)), Urgency::Overdue);
        assert_eq!(urgency(day(19), day(19)), Urgency::Today);
        assert_eq!(urgency(day(20), day(19)), Urgency::Upcoming);
    }
}
