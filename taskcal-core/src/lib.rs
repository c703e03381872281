//! Reconciliation engine for keeping task records and calendar events in step.
//!
//! Records live in an external tabular store; each active record may be
//! linked to one calendar event. A fixed pipeline of rules compares every
//! record's current fields against their `last*` shadow copies, mutates the
//! calendar where needed, and accumulates a minimal field patch that a
//! batch coordinator writes back to the store in capped requests.
//!
//! The store and the calendar are reached through the traits in [`gateway`];
//! this crate performs no I/O of its own.

pub mod batch;
pub mod error;
pub mod gateway;
pub mod record;
pub mod rules;
pub mod schedule;
pub mod sync;

pub use error::SyncError;
pub use gateway::{CalendarGateway, EventPatch, GatewayError, RecordFilter, RecordQuery, RecordStore};
pub use record::{RecordFields, RecordPatch, TaskRecord, UpdateSet};
pub use rules::RuleEngine;
pub use sync::{SyncReport, run_deadline_sync, run_today_sync};
