use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use analytics_types::StoredEvent;
use chrono::{DateTime, Utc};

use crate::{DedupeMarker, EventStore, Page, StoreError};

#[derive(Debug, Default)]
struct Inner {
    markers: HashMap<String, DateTime<Utc>>,
    events: Vec<StoredEvent>,
}

/// In-process store with the same insert-once semantics as [`crate::MongoStore`].
///
/// Reservation checks and inserts under a single lock, so concurrent reservations of one id
/// have exactly one winner. Nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.markers.len())
    }

    pub fn contains_marker(&self, event_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.markers.contains_key(event_id))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl EventStore for MemoryStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn reserve(&self, marker: &DedupeMarker) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.markers.contains_key(&marker.event_id) {
            return Err(StoreError::DuplicateKey);
        }
        inner
            .markers
            .insert(marker.event_id.clone(), marker.created_at);
        Ok(())
    }

    async fn insert_event(&self, event: &StoredEvent) -> Result<(), StoreError> {
        self.lock()?.events.push(event.clone());
        Ok(())
    }

    async fn events(&self, page: Page) -> Result<Vec<StoredEvent>, StoreError> {
        let inner = self.lock()?;
        let skip = usize::try_from(page.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = page.limit().map_or(usize::MAX, |l| l as usize);
        Ok(inner.events.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn prune_markers(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let len = inner.markers.len();
        inner.markers.retain(|_, created_at| *created_at >= before);
        Ok((len - inner.markers.len()) as u64)
    }
}
