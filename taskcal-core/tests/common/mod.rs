//! Shared mock gateways and record builders for the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use taskcal_core::gateway::{
    CalendarGateway, EventPatch, GatewayError, RecordQuery, RecordStore,
};
use taskcal_core::record::{RecordPatch, TaskRecord};

/// A calendar call observed by [`MockCalendar`].
#[derive(Debug, Clone)]
pub enum CalendarCall {
    Create {
        title: String,
        start: NaiveDateTime,
        duration_hours: f64,
        external_ref: String,
    },
    Patch {
        event_id: String,
        patch: EventPatch,
    },
}

/// Records every call; queued results are popped in order, otherwise
/// creation succeeds with ids "evt-1", "evt-2", ... and patches succeed.
#[derive(Default)]
pub struct MockCalendar {
    calls: Mutex<Vec<CalendarCall>>,
    create_results: Mutex<VecDeque<Result<String, GatewayError>>>,
    patch_results: Mutex<VecDeque<Result<(), GatewayError>>>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_create(&self, result: Result<String, GatewayError>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub fn queue_patch(&self, result: Result<(), GatewayError>) {
        self.patch_results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<CalendarCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, CalendarCall::Create { .. }))
            .collect()
    }

    pub fn patch_calls(&self) -> Vec<(String, EventPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CalendarCall::Patch { event_id, patch } => Some((event_id, patch)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl CalendarGateway for MockCalendar {
    async fn create_event(
        &self,
        title: &str,
        start: NaiveDateTime,
        duration_hours: f64,
        external_ref: &str,
    ) -> Result<String, GatewayError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(CalendarCall::Create {
            title: title.to_string(),
            start,
            duration_hours,
            external_ref: external_ref.to_string(),
        });
        let n = calls.len();
        drop(calls);

        match self.create_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(format!("evt-{n}")),
        }
    }

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(CalendarCall::Patch {
            event_id: event_id.to_string(),
            patch: patch.clone(),
        });
        match self.patch_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }
}

/// Serves a fixed record list and captures every patch batch.
#[derive(Default)]
pub struct MockStore {
    pub records: Vec<TaskRecord>,
    pub fail_fetch: bool,
    pub fail_patches: bool,
    pub queries: Mutex<Vec<RecordQuery>>,
    pub patches: Mutex<Vec<Vec<RecordPatch>>>,
}

impl MockStore {
    pub fn with_records(records: Vec<TaskRecord>) -> Self {
        MockStore {
            records,
            ..MockStore::default()
        }
    }

    pub fn queries(&self) -> Vec<RecordQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Patch batches in the order they were sent.
    pub fn batches(&self) -> Vec<Vec<RecordPatch>> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn fetch(&self, query: &RecordQuery) -> Result<Vec<TaskRecord>, GatewayError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_fetch {
            return Err(GatewayError::Transient("connection reset".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn patch_batch(&self, patches: &[RecordPatch]) -> Result<(), GatewayError> {
        if self.fail_patches {
            return Err(GatewayError::Transient("gateway timeout".to_string()));
        }
        self.patches.lock().unwrap().push(patches.to_vec());
        Ok(())
    }
}

/// Builder for test records; only the fields a test names are set.
pub struct RecordBuilder(TaskRecord);

pub fn record(id: &str) -> RecordBuilder {
    RecordBuilder(TaskRecord {
        id: id.to_string(),
        ..TaskRecord::default()
    })
}

impl RecordBuilder {
    pub fn name(mut self, v: &str) -> Self {
        self.0.fields.name = Some(v.to_string());
        self
    }

    pub fn deadline(mut self, v: &str) -> Self {
        self.0.fields.deadline = Some(v.to_string());
        self
    }

    pub fn status(mut self, v: &str) -> Self {
        self.0.fields.status = Some(v.to_string());
        self
    }

    pub fn deadline_group(mut self, v: &str) -> Self {
        self.0.fields.deadline_group = Some(v.to_string());
        self
    }

    pub fn calendar_event_id(mut self, v: &str) -> Self {
        self.0.fields.calendar_event_id = Some(v.to_string());
        self
    }

    pub fn duration(mut self, v: f64) -> Self {
        self.0.fields.duration = Some(v);
        self
    }

    pub fn last_deadline(mut self, v: &str) -> Self {
        self.0.fields.last_deadline = Some(v.to_string());
        self
    }

    pub fn last_calendar_deadline(mut self, v: &str) -> Self {
        self.0.fields.last_calendar_deadline = Some(v.to_string());
        self
    }

    pub fn last_name(mut self, v: &str) -> Self {
        self.0.fields.last_name = Some(v.to_string());
        self
    }

    pub fn build(self) -> TaskRecord {
        self.0
    }
}
