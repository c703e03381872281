//! Typed task-record model and the per-record update accumulator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Store column names, exactly as they appear in fetch and patch payloads.
pub mod field {
    pub const NAME: &str = "Name";
    pub const DEADLINE: &str = "Deadline";
    pub const STATUS: &str = "Status";
    pub const DEADLINE_GROUP: &str = "Deadline Group";
    pub const DAY: &str = "Day";
    pub const CALENDAR_EVENT_ID: &str = "calendarEventId";
    pub const DURATION: &str = "duration";
    pub const LAST_DEADLINE: &str = "lastDeadline";
    pub const LAST_CALENDAR_DEADLINE: &str = "lastCalendarDeadline";
    pub const LAST_NAME: &str = "lastName";
    pub const LAST_STATUS: &str = "lastStatus";
    pub const SET_TODAY_DATE: &str = "setTodayDate";
}

/// A task record as returned by the record store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRecord {
    /// Opaque store-assigned id, stable for the record's lifetime.
    pub id: String,
    #[serde(default)]
    pub fields: RecordFields,
}

/// The record's field snapshot. Every field is optional; the store omits
/// columns that are empty.
///
/// The `last*` fields are shadow copies written only by the sync engine
/// (or, for `last_calendar_deadline`, by the calendar webhook). They exist
/// purely for change detection and must never be shown as current values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordFields {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    /// Date-only deadline, `YYYY-MM-DD`.
    #[serde(rename = "Deadline")]
    pub deadline: Option<String>,
    /// Open enumeration; anything other than "Done"/"Abandoned" is active.
    #[serde(rename = "Status")]
    pub status: Option<String>,
    /// Week bucket (`MM/DD` of the upcoming Sunday) or "Today".
    #[serde(rename = "Deadline Group")]
    pub deadline_group: Option<String>,
    /// Three-letter weekday label, "Mon".."Sun".
    #[serde(rename = "Day")]
    pub day: Option<String>,
    #[serde(rename = "calendarEventId")]
    pub calendar_event_id: Option<String>,
    /// Event length in hours; treated as 1 when absent or zero.
    pub duration: Option<f64>,
    #[serde(rename = "lastDeadline")]
    pub last_deadline: Option<String>,
    /// ISO-8601 timestamp whose first 10 characters are the `YYYY-MM-DD`
    /// the calendar side last wrote. Used for echo suppression.
    #[serde(rename = "lastCalendarDeadline")]
    pub last_calendar_deadline: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "lastStatus")]
    pub last_status: Option<String>,
    /// Timestamp of the ad-hoc event created when the record entered the
    /// "Today" timeframe; set once, never revisited.
    #[serde(rename = "setTodayDate")]
    pub set_today_date: Option<String>,
}

/// Accumulates the field patch for one record as the rules run.
///
/// Rules append or overwrite keys; nothing is ever removed. The fixed rule
/// order relies on that: a later rule may replace a value (the today
/// transition overwrites the week bucket) but can never undo another
/// rule's write.
#[derive(Debug, Clone, Default)]
pub struct UpdateSet(Map<String, Value>);

impl UpdateSet {
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// Write an explicit null, which the store's type-coercing patch
    /// treats as "clear this column".
    pub fn clear_field(&mut self, field: &str) {
        self.0.insert(field.to_string(), Value::Null);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// One record's partial update, in the shape the store's batch patch
/// endpoint expects.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPatch {
    pub id: String,
    pub fields: Map<String, Value>,
}
