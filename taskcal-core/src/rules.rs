//! The reconciliation rule pipeline.
//!
//! Five rules run in fixed order against each fetched record. Each rule
//! compares current fields against their `last*` shadows, may call the
//! calendar gateway, and appends to the record's update set. Rules read
//! only the fetched snapshot, never each other's pending writes, so a
//! record whose fields all match their shadows yields an empty update set
//! and re-running the engine is a no-op.

use std::fmt;

use chrono::{NaiveDate, Utc};

use crate::error::SyncError;
use crate::gateway::{CalendarGateway, EventPatch, GatewayError};
use crate::record::{RecordFields, TaskRecord, UpdateSet, field};
use crate::schedule::{effective_deadline, local_working_date, week_bucket_label, weekday_label};
use crate::sync::SyncReport;

pub const STATUS_DONE: &str = "Done";
pub const STATUS_ABANDONED: &str = "Abandoned";

/// Shadow value that retires a record from the active fetch filter. Every
/// terminal status converges on this one marker.
pub const TERMINAL_SHADOW: &str = "Done";

/// Group label for records due on the current working day.
pub const TODAY_GROUP: &str = "Today";

/// Event length used when a record carries no usable duration.
pub const DEFAULT_DURATION_HOURS: f64 = 1.0;

/// Calendar color applied when a record reaches the given status.
/// Extend here to mark further terminal statuses.
const COMPLETED_COLORS: &[(&str, &str)] = &[(STATUS_DONE, "5"), (STATUS_ABANDONED, "11")];

/// Color id for a terminal status, or `None` while the record is active.
pub fn completed_color(status: &str) -> Option<&'static str> {
    COMPLETED_COLORS
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, color)| *color)
}

/// What to do with a rule's shadow write after its calendar call settled.
enum ShadowWrite {
    /// Call succeeded or wasn't needed: mark the change as processed.
    Set,
    /// Transient failure: leave the shadow alone so the next run retries
    /// the calendar call.
    Withhold,
    /// The event is gone: clear the link and the shadow so the next run
    /// takes the new-record path and recreates it.
    ClearForRecreate,
}

/// Evaluates the rule pipeline for one record at a time.
///
/// The engine is stateless across records; per-run counters live in the
/// [`SyncReport`] threaded through [`RuleEngine::evaluate`].
pub struct RuleEngine<'a, C: CalendarGateway> {
    calendar: &'a C,
    today: NaiveDate,
}

impl<'a, C: CalendarGateway> RuleEngine<'a, C> {
    pub fn new(calendar: &'a C) -> Self {
        Self::with_today(calendar, local_working_date(Utc::now()))
    }

    /// Engine pinned to a specific working day. The default derives it
    /// from the wall clock.
    pub fn with_today(calendar: &'a C, today: NaiveDate) -> Self {
        RuleEngine { calendar, today }
    }

    /// Run all rules against `record`, returning its accumulated patch.
    ///
    /// An empty result means the record needs nothing this pass. A
    /// malformed record returns an error and must be skipped by the
    /// caller; gateway failures never escape here, they are recorded in
    /// the report and degrade to skipped writes.
    pub async fn evaluate(
        &self,
        record: &TaskRecord,
        report: &mut SyncReport,
    ) -> Result<UpdateSet, SyncError> {
        let fields = &record.fields;
        let deadline_raw = fields.deadline.as_deref().unwrap_or("");
        if deadline_raw.is_empty() {
            return Err(SyncError::MalformedRecord {
                id: record.id.clone(),
                reason: "deadline missing".to_string(),
            });
        }
        let deadline =
            NaiveDate::parse_from_str(deadline_raw, "%Y-%m-%d").map_err(|err| {
                SyncError::MalformedRecord {
                    id: record.id.clone(),
                    reason: format!("unparseable deadline {deadline_raw:?}: {err}"),
                }
            })?;

        let mut updates = UpdateSet::default();

        if !self.new_record(&mut updates, record, deadline_raw, deadline, report).await {
            // Event creation failed; nothing may be written for this
            // record or the deadline rule's shadow would mask the missing
            // event on every later run.
            return Ok(UpdateSet::default());
        }
        self.deadline_change(&mut updates, record, deadline_raw, deadline, report)
            .await;
        self.name_change(&mut updates, record, report).await;
        self.today_transition(&mut updates, fields, deadline);
        self.terminal_status(&mut updates, record, report).await;

        Ok(updates)
    }

    /// New-record rule: the first time a deadline appears, create the
    /// linked event. Records that already carry an event id were created
    /// from the calendar side and need no event.
    ///
    /// Returns false when creation failed and the record must be left
    /// untouched this pass.
    async fn new_record(
        &self,
        updates: &mut UpdateSet,
        record: &TaskRecord,
        deadline_raw: &str,
        deadline: NaiveDate,
        report: &mut SyncReport,
    ) -> bool {
        let fields = &record.fields;
        if !blank(&fields.last_deadline) || !blank(&fields.calendar_event_id) {
            return true;
        }

        let title = fields.name.as_deref().unwrap_or("");
        match self
            .calendar
            .create_event(
                title,
                effective_deadline(deadline),
                DEFAULT_DURATION_HOURS,
                &record.id,
            )
            .await
        {
            Ok(event_id) => {
                report.events_created += 1;
                updates.set(field::CALENDAR_EVENT_ID, event_id);
                updates.set(field::DURATION, DEFAULT_DURATION_HOURS);
                updates.set(field::LAST_DEADLINE, deadline_raw);
                true
            }
            Err(err) => {
                report.calendar_failure(&record.id, "create", &err);
                false
            }
        }
    }

    /// Deadline-change rule: reschedule the event and refresh the derived
    /// grouping columns.
    ///
    /// The event patch is suppressed when the first 10 characters of
    /// `lastCalendarDeadline` already equal the new deadline: the calendar
    /// itself was the most recent source of this change and re-patching it
    /// would bounce the edit back through the webhook.
    async fn deadline_change(
        &self,
        updates: &mut UpdateSet,
        record: &TaskRecord,
        deadline_raw: &str,
        deadline: NaiveDate,
        report: &mut SyncReport,
    ) {
        let fields = &record.fields;
        let last_deadline = fields.last_deadline.as_deref().unwrap_or("");
        if deadline_raw == last_deadline {
            return;
        }

        let duration = fields
            .duration
            .filter(|d| *d > 0.0)
            .unwrap_or(DEFAULT_DURATION_HOURS);
        let mut shadow = ShadowWrite::Set;

        if let Some(event_id) = non_blank(&fields.calendar_event_id) {
            let calendar_deadline = fields.last_calendar_deadline.as_deref().unwrap_or("");
            let calendar_date = calendar_deadline.get(..10).unwrap_or(calendar_deadline);
            if calendar_date != deadline_raw {
                let patch = EventPatch::reschedule(effective_deadline(deadline), duration);
                match self.calendar.patch_event(event_id, &patch).await {
                    Ok(()) => report.events_patched += 1,
                    Err(GatewayError::NotFound(_)) => {
                        report.stale_events += 1;
                        shadow = ShadowWrite::ClearForRecreate;
                    }
                    Err(err) => {
                        report.calendar_failure(&record.id, "reschedule", &err);
                        shadow = ShadowWrite::Withhold;
                    }
                }
            }
        }

        // The derived columns depend only on the deadline itself, so they
        // are written whether or not the calendar patch fired.
        updates.set(field::DEADLINE_GROUP, week_bucket_label(deadline));
        updates.set(field::DAY, weekday_label(deadline));
        match shadow {
            ShadowWrite::Set => updates.set(field::LAST_DEADLINE, deadline_raw),
            ShadowWrite::Withhold => {}
            ShadowWrite::ClearForRecreate => {
                updates.clear_field(field::CALENDAR_EVENT_ID);
                updates.clear_field(field::LAST_DEADLINE);
            }
        }
    }

    /// Name-change rule: keep the event title in step with the record.
    async fn name_change(
        &self,
        updates: &mut UpdateSet,
        record: &TaskRecord,
        report: &mut SyncReport,
    ) {
        let fields = &record.fields;
        let name = fields.name.as_deref().unwrap_or("");
        let last_name = fields.last_name.as_deref().unwrap_or("");
        if name == last_name {
            return;
        }

        if let Some(event_id) = non_blank(&fields.calendar_event_id) {
            match self
                .calendar
                .patch_event(event_id, &EventPatch::retitle(name))
                .await
            {
                Ok(()) => report.events_patched += 1,
                Err(GatewayError::NotFound(_)) => {
                    report.stale_events += 1;
                    updates.clear_field(field::CALENDAR_EVENT_ID);
                    updates.clear_field(field::LAST_DEADLINE);
                }
                Err(err) => {
                    report.calendar_failure(&record.id, "retitle", &err);
                    return;
                }
            }
        }
        updates.set(field::LAST_NAME, name);
    }

    /// Today-transition rule: bucket records due on the current working
    /// day. Overwrites the week bucket the deadline rule may have written
    /// in the same pass.
    fn today_transition(&self, updates: &mut UpdateSet, fields: &RecordFields, deadline: NaiveDate) {
        let group = fields.deadline_group.as_deref().unwrap_or("");
        if deadline == self.today && group != TODAY_GROUP {
            updates.set(field::DEADLINE_GROUP, TODAY_GROUP);
        }
    }

    /// Terminal-status rule: color the event as completed and retire the
    /// record. Both terminal statuses converge on the same shadow value,
    /// which is what drops the record from the active fetch filter.
    async fn terminal_status(
        &self,
        updates: &mut UpdateSet,
        record: &TaskRecord,
        report: &mut SyncReport,
    ) {
        let fields = &record.fields;
        let status = fields.status.as_deref().unwrap_or("");
        let Some(color) = completed_color(status) else {
            return;
        };

        if let Some(event_id) = non_blank(&fields.calendar_event_id) {
            match self
                .calendar
                .patch_event(event_id, &EventPatch::recolor(color))
                .await
            {
                Ok(()) => report.events_patched += 1,
                // A deleted event is no reason to keep a finished record
                // active; retire it anyway.
                Err(GatewayError::NotFound(_)) => report.stale_events += 1,
                Err(err) => {
                    report.calendar_failure(&record.id, "recolor", &err);
                    return;
                }
            }
        }
        updates.set(field::LAST_STATUS, TERMINAL_SHADOW);
    }
}

/// A reconciliation action a record currently calls for. Computed from
/// the snapshot alone; used by dry runs that must not touch the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    CreateEvent,
    DeadlineChanged,
    NameChanged,
    DueToday,
    Complete,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PendingAction::CreateEvent => "create event",
            PendingAction::DeadlineChanged => "reschedule",
            PendingAction::NameChanged => "retitle",
            PendingAction::DueToday => "due today",
            PendingAction::Complete => "retire",
        };
        write!(f, "{label}")
    }
}

/// Which triggers would fire for `record`, without side effects. An
/// unparseable deadline yields no actions; the real run reports it.
pub fn pending_actions(record: &TaskRecord, today: NaiveDate) -> Vec<PendingAction> {
    let fields = &record.fields;
    let mut actions = Vec::new();

    let deadline_raw = fields.deadline.as_deref().unwrap_or("");
    let Ok(deadline) = NaiveDate::parse_from_str(deadline_raw, "%Y-%m-%d") else {
        return actions;
    };

    if blank(&fields.last_deadline) && blank(&fields.calendar_event_id) {
        actions.push(PendingAction::CreateEvent);
    } else if deadline_raw != fields.last_deadline.as_deref().unwrap_or("") {
        actions.push(PendingAction::DeadlineChanged);
    }
    if fields.name.as_deref().unwrap_or("") != fields.last_name.as_deref().unwrap_or("") {
        actions.push(PendingAction::NameChanged);
    }
    if deadline == today && fields.deadline_group.as_deref().unwrap_or("") != TODAY_GROUP {
        actions.push(PendingAction::DueToday);
    }
    if completed_color(fields.status.as_deref().unwrap_or("")).is_some() {
        actions.push(PendingAction::Complete);
    }
    actions
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_color_table() {
        assert_eq!(completed_color("Done"), Some("5"));
        assert_eq!(completed_color("Abandoned"), Some("11"));
        assert_eq!(completed_color("In Progress"), None);
        assert_eq!(completed_color(""), None);
    }

    #[test]
    fn test_pending_actions_for_unchanged_record() {
        let mut record = TaskRecord {
            id: "rec1".to_string(),
            ..TaskRecord::default()
        };
        record.fields.name = Some("Task".to_string());
        record.fields.last_name = Some("Task".to_string());
        record.fields.deadline = Some("2024-03-06".to_string());
        record.fields.last_deadline = Some("2024-03-06".to_string());
        record.fields.calendar_event_id = Some("evt1".to_string());
        record.fields.deadline_group = Some("03/10".to_string());

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(pending_actions(&record, today).is_empty());
    }

    #[test]
    fn test_pending_actions_for_new_record() {
        let mut record = TaskRecord {
            id: "rec1".to_string(),
            ..TaskRecord::default()
        };
        record.fields.name = Some("Task".to_string());
        record.fields.deadline = Some("2024-03-06".to_string());

        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let actions = pending_actions(&record, today);
        assert!(actions.contains(&PendingAction::CreateEvent));
        assert!(actions.contains(&PendingAction::NameChanged));
        assert!(!actions.contains(&PendingAction::DeadlineChanged));
    }
}
