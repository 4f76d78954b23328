use std::sync::{Arc, PoisonError, RwLock};

use crate::sheet_rows::RowBatch;

/// Holds the session's current batch. `replace` is the only writer.
#[derive(Debug, Default)]
pub struct RowStore {
    current: RwLock<Arc<RowBatch>>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<RowBatch> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new batch and returns the one it displaced.
    pub fn replace(&self, batch: RowBatch) -> Arc<RowBatch> {
        let next = Arc::new(batch);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        tracing::info!(
            batch_id = %next.batch_id,
            rows = next.len(),
            previous_rows = guard.len(),
            "row batch replaced"
        );
        std::mem::replace(&mut *guard, next)
    }

    pub fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(RowBatch::empty());
    }

    pub fn row_count(&self) -> usize {
        self.snapshot().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_with_id(id: &str) -> RowBatch {
        RowBatch {
            batch_id: id.to_string(),
            ..RowBatch::empty()
        }
    }

    #[test]
    fn snapshots_survive_replacement() {
        let store = RowStore::new();
        assert!(store.snapshot().is_empty());

        store.replace(batch_with_id("first"));
        let held = store.snapshot();
        let previous = store.replace(batch_with_id("second"));

        assert_eq!(held.batch_id, "first");
        assert_eq!(previous.batch_id, "first");
        assert_eq!(store.snapshot().batch_id, "second");
    }

    #[test]
    fn clear_resets_to_empty_batch() {
        let store = RowStore::new();
        store.replace(batch_with_id("first"));
        store.clear();
        assert_eq!(store.snapshot().batch_id, "");
        assert_eq!(store.row_count(), 0);
    }
}
