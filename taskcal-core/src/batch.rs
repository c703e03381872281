//! Capped batching of record patches.

use crate::gateway::RecordStore;
use crate::record::{RecordPatch, UpdateSet};
use crate::sync::SyncReport;

/// Most records the store accepts in one patch request.
pub const MAX_PATCH_RECORDS: usize = 10;

/// Folds per-record update sets into capped patch requests.
///
/// Full buffers flush eagerly, before the entry that would overflow them
/// is appended; whatever remains flushes once in [`BatchCoordinator::finish`].
/// An empty buffer is never sent. Batch order matches push order.
pub struct BatchCoordinator<'a, S: RecordStore> {
    store: &'a S,
    cap: usize,
    buf: Vec<RecordPatch>,
}

impl<'a, S: RecordStore> BatchCoordinator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_cap(store, MAX_PATCH_RECORDS)
    }

    pub fn with_cap(store: &'a S, cap: usize) -> Self {
        BatchCoordinator {
            store,
            cap,
            buf: Vec::new(),
        }
    }

    /// Queue one record's updates, flushing first if the buffer is full.
    pub async fn push(&mut self, id: String, updates: UpdateSet, report: &mut SyncReport) {
        if self.buf.len() >= self.cap {
            self.flush(report).await;
        }
        self.buf.push(RecordPatch {
            id,
            fields: updates.into_fields(),
        });
    }

    /// Send whatever is still buffered.
    pub async fn finish(mut self, report: &mut SyncReport) {
        self.flush(report).await;
    }

    async fn flush(&mut self, report: &mut SyncReport) {
        if self.buf.is_empty() {
            return;
        }
        let batch = std::mem::take(&mut self.buf);
        match self.store.patch_batch(&batch).await {
            Ok(()) => {
                report.batches_sent += 1;
                report.records_patched += batch.len();
            }
            // Every update in the batch is re-derivable from source
            // fields; drop it and let the next run rebuild it.
            Err(err) => report
                .batch_failures
                .push(format!("batch of {} records dropped: {err}", batch.len())),
        }
    }
}
