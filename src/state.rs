use std::sync::{Arc, RwLock};

use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Process-wide dataset store
// ---------------------------------------------------------------------------

/// Holder of the most recently loaded dataset.
///
/// One dataset is live at a time. `replace` publishes a fully built
/// dataset in a single swap (last writer wins); `snapshot` hands readers a
/// cheap `Arc` clone. A query therefore sees either the old dataset or
/// the new one, never a partially loaded one. The lock is only ever held
/// for the swap or the clone, so it is safe to call from async handlers.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new dataset, replacing any previous one. Returns the row
    /// count of the published dataset.
    pub fn replace(&self, dataset: Dataset) -> usize {
        let rows = dataset.len();
        let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(dataset));
        rows
    }

    /// The currently published dataset, if any has been loaded.
    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
