//! Sync drivers: fetch records, run the rules, batch the patches.

use chrono::{DateTime, Utc};

use crate::batch::BatchCoordinator;
use crate::error::SyncError;
use crate::gateway::{CalendarGateway, GatewayError, RecordQuery, RecordStore};
use crate::record::{UpdateSet, field};
use crate::rules::{DEFAULT_DURATION_HOURS, RuleEngine};
use crate::schedule::round_up_to_quarter_hour;

/// What a sync run did, and what it had to skip.
///
/// A run only fails outright when the initial fetch does; everything else
/// degrades to an entry in one of the failure lists so a single bad call
/// cannot halt the batch.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub records_seen: usize,
    /// Records that produced a non-empty update set.
    pub records_updated: usize,
    pub events_created: usize,
    pub events_patched: usize,
    /// Patches that hit an event deleted on the calendar side.
    pub stale_events: usize,
    pub batches_sent: usize,
    /// Records that reached the store across all batches.
    pub records_patched: usize,
    /// Malformed records skipped, with reasons.
    pub skipped_records: Vec<String>,
    /// Calendar calls that failed transiently; retried naturally next run.
    pub calendar_failures: Vec<String>,
    /// Batches dropped because the store rejected the send.
    pub batch_failures: Vec<String>,
}

impl SyncReport {
    pub(crate) fn calendar_failure(&mut self, record_id: &str, action: &str, err: &GatewayError) {
        self.calendar_failures
            .push(format!("record {record_id}: {action} failed: {err}"));
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_records.is_empty()
            && self.calendar_failures.is_empty()
            && self.batch_failures.is_empty()
    }

    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        format!(
            "{} records seen, {} updated | events +{} ~{} | {} batches ({} records) | {} skipped, {} failures",
            self.records_seen,
            self.records_updated,
            self.events_created,
            self.events_patched,
            self.batches_sent,
            self.records_patched,
            self.skipped_records.len(),
            self.calendar_failures.len() + self.batch_failures.len(),
        )
    }
}

/// Reconcile every active record against the calendar and patch the store
/// with whatever changed.
pub async fn run_deadline_sync<S, C>(store: &S, calendar: &C) -> Result<SyncReport, SyncError>
where
    S: RecordStore,
    C: CalendarGateway,
{
    run_deadline_sync_with(store, &RuleEngine::new(calendar)).await
}

/// Variant taking a preconfigured engine (e.g. pinned to a working day).
pub async fn run_deadline_sync_with<S, C>(
    store: &S,
    engine: &RuleEngine<'_, C>,
) -> Result<SyncReport, SyncError>
where
    S: RecordStore,
    C: CalendarGateway,
{
    let mut report = SyncReport::default();
    let records = store
        .fetch(&RecordQuery::active_deadlines())
        .await
        .map_err(SyncError::Fetch)?;
    let mut batch = BatchCoordinator::new(store);

    for record in &records {
        report.records_seen += 1;
        match engine.evaluate(record, &mut report).await {
            Ok(updates) if !updates.is_empty() => {
                report.records_updated += 1;
                batch.push(record.id.clone(), updates, &mut report).await;
            }
            Ok(_) => {}
            Err(err) => report.skipped_records.push(err.to_string()),
        }
    }
    batch.finish(&mut report).await;

    Ok(report)
}

/// Give every record newly pulled into the "Today" timeframe an ad-hoc
/// calendar slot at the next quarter-hour, and stamp it as scheduled so
/// it is fetched only once.
pub async fn run_today_sync<S, C>(store: &S, calendar: &C) -> Result<SyncReport, SyncError>
where
    S: RecordStore,
    C: CalendarGateway,
{
    run_today_sync_at(store, calendar, Utc::now()).await
}

/// Variant taking an explicit clock reading.
pub async fn run_today_sync_at<S, C>(
    store: &S,
    calendar: &C,
    now: DateTime<Utc>,
) -> Result<SyncReport, SyncError>
where
    S: RecordStore,
    C: CalendarGateway,
{
    let mut report = SyncReport::default();
    let records = store
        .fetch(&RecordQuery::today_unscheduled())
        .await
        .map_err(SyncError::Fetch)?;

    let start = round_up_to_quarter_hour(now).naive_utc();
    let stamp = start.format("%Y-%m-%dT%H:%M:%S").to_string();
    let mut batch = BatchCoordinator::new(store);

    for record in &records {
        report.records_seen += 1;
        let title = record.fields.name.as_deref().unwrap_or("");
        match calendar
            .create_event(title, start, DEFAULT_DURATION_HOURS, &record.id)
            .await
        {
            Ok(_event_id) => {
                report.events_created += 1;
                report.records_updated += 1;
                let mut updates = UpdateSet::default();
                updates.set(field::SET_TODAY_DATE, stamp.as_str());
                batch.push(record.id.clone(), updates, &mut report).await;
            }
            // Unstamped records are refetched next run; creation retries
            // then.
            Err(err) => report.calendar_failure(&record.id, "create", &err),
        }
    }
    batch.finish(&mut report).await;

    Ok(report)
}
