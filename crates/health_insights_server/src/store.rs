//! Id-indexed storage for processed uploads.
//!
//! Records are immutable once stored. Every `put` allocates a fresh v4 UUID,
//! so concurrent uploads never overwrite each other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::processing::UploadRecord;

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Store `record` under a newly allocated id.
    async fn put(&self, record: UploadRecord) -> Uuid;

    /// Look up a record; `None` when the id is unknown.
    async fn get(&self, id: &Uuid) -> Option<Arc<UploadRecord>>;

    async fn len(&self) -> usize;
}

/// Process-lifetime store. No eviction.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<HashMap<Uuid, Arc<UploadRecord>>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put(&self, record: UploadRecord) -> Uuid {
        let id = Uuid::new_v4();
        self.records.lock().await.insert(id, Arc::new(record));
        id
    }

    async fn get(&self, id: &Uuid) -> Option<Arc<UploadRecord>> {
        self.records.lock().await.get(id).cloned()
    }

    async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}
