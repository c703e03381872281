//! Error types for taskcal sync runs.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can end a record's evaluation or a whole run.
///
/// A [`SyncError::MalformedRecord`] only ever skips the one record it names;
/// the run carries on. Fetch failures are fatal for the run since there is
/// nothing to process without records.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("record {id} skipped: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("record store fetch failed: {0}")]
    Fetch(#[source] GatewayError),
}
