//! Analytics Event Storage
//!
//! ## Current API
//!
//! - Reserve an event id in the dedupe collection
//! - Append events to the events collection
//! - Read back stored events
//! - Prune old dedupe markers
//!
use std::future::Future;

use analytics_types::StoredEvent;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod db;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod record;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use record::{Recorded, record};

pub const DEDUPE_COLLECTION: &str = "analytic-events-dedupe";
pub const EVENTS_COLLECTION: &str = "analytic-events";

/// Marker whose unique insert decides which submission of an event id wins.
#[derive(Clone, Debug, PartialEq)]
pub struct DedupeMarker {
    pub event_id: String,
    pub created_at: DateTime<Utc>,
}

/// Optional paging for the read path. Both unset returns everything.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub skip: Option<u64>,
}

impl Page {
    /// `limit=0` means no limit, matching MongoDB
    pub fn limit(&self) -> Option<u32> {
        self.limit.filter(|l| *l > 0)
    }
}

/// Storage the sink is written against.
///
/// `reserve` must be atomic with respect to concurrent calls sharing an event id:
/// exactly one succeeds, every other returns [`StoreError::DuplicateKey`].
pub trait EventStore: Clone + Send + Sync + 'static {
    fn ensure_indexes(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn reserve(
        &self,
        marker: &DedupeMarker,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn insert_event(
        &self,
        event: &StoredEvent,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Stored events in insertion order
    fn events(&self, page: Page) -> impl Future<Output = Result<Vec<StoredEvent>, StoreError>> + Send;

    /// Deletes markers created strictly before `before`, returning how many were removed
    fn prune_markers(
        &self,
        before: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
