//! Gateway contracts the engine consumes.
//!
//! The record store and the calendar service are external collaborators;
//! the engine only needs the operations below. Implementations own all
//! transport concerns, including mapping raw errors into [`GatewayError`].

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::record::{RecordPatch, TaskRecord, field};

/// Page cap for a single fetch; one fetch is treated as the whole batch
/// for a run.
pub const MAX_FETCH_RECORDS: u32 = 100;

/// Errors surfaced by gateway implementations.
///
/// The engine distinguishes exactly these cases; everything else about a
/// failure is carried as text for the report.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Network failure, timeout, throttling or a 5xx. Safe to retry on a
    /// later run; never retried within one.
    #[error("transient gateway failure: {0}")]
    Transient(String),

    /// The referenced resource no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was understood and refused. Retrying won't help.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Which records a fetch should return. The store implementation owns the
/// translation into its own filter syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    /// Deadline set and `lastStatus` not yet terminal.
    ActiveDeadlines,
    /// Timeframe "Today", status not Done, no ad-hoc event stamped yet.
    TodayUnscheduled,
}

/// A fetch request: filter, columns to return, page cap.
#[derive(Debug, Clone)]
pub struct RecordQuery {
    pub filter: RecordFilter,
    pub fields: &'static [&'static str],
    pub max_records: u32,
}

impl RecordQuery {
    pub fn active_deadlines() -> Self {
        RecordQuery {
            filter: RecordFilter::ActiveDeadlines,
            fields: &[
                field::NAME,
                field::DEADLINE,
                field::STATUS,
                field::DEADLINE_GROUP,
                field::CALENDAR_EVENT_ID,
                field::DURATION,
                field::LAST_DEADLINE,
                field::LAST_CALENDAR_DEADLINE,
                field::LAST_NAME,
            ],
            max_records: MAX_FETCH_RECORDS,
        }
    }

    pub fn today_unscheduled() -> Self {
        RecordQuery {
            filter: RecordFilter::TodayUnscheduled,
            fields: &[
                field::NAME,
                field::DEADLINE,
                field::STATUS,
                field::SET_TODAY_DATE,
            ],
            max_records: MAX_FETCH_RECORDS,
        }
    }
}

/// Partial update to an existing calendar event. Omitted fields are left
/// unchanged by the calendar side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub start: Option<NaiveDateTime>,
    pub duration_hours: Option<f64>,
    pub title: Option<String>,
    pub color_id: Option<String>,
}

impl EventPatch {
    pub fn reschedule(start: NaiveDateTime, duration_hours: f64) -> Self {
        EventPatch {
            start: Some(start),
            duration_hours: Some(duration_hours),
            ..EventPatch::default()
        }
    }

    pub fn retitle(title: impl Into<String>) -> Self {
        EventPatch {
            title: Some(title.into()),
            ..EventPatch::default()
        }
    }

    pub fn recolor(color_id: impl Into<String>) -> Self {
        EventPatch {
            color_id: Some(color_id.into()),
            ..EventPatch::default()
        }
    }
}

/// Calendar service: create and patch events by id. Events are never
/// deleted by the engine.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Create a `duration_hours`-long event starting at `start`, tagged
    /// with the originating record id for traceability. Returns the
    /// stable event id.
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDateTime,
        duration_hours: f64,
        external_ref: &str,
    ) -> Result<String, GatewayError>;

    /// Apply a partial update. Fails with [`GatewayError::NotFound`] if
    /// the event no longer exists.
    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> Result<(), GatewayError>;
}

/// Tabular record store: filtered fetches and batched partial patches.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<TaskRecord>, GatewayError>;

    /// Apply partial field updates. Absent fields stay unchanged; writes
    /// must be type-coercing so labels can land in choice columns without
    /// pre-registration, and an explicit null clears a column.
    async fn patch_batch(&self, patches: &[RecordPatch]) -> Result<(), GatewayError>;
}
