use analytics_types::StoredEvent;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, doc},
    options::{FindOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};

use crate::{
    DEDUPE_COLLECTION, DedupeMarker, EVENTS_COLLECTION, EventStore, Page, StoreError,
    db::get_collection,
};

#[derive(Debug, Serialize, Deserialize)]
struct MarkerRecord {
    #[serde(rename = "eventId")]
    event_id: String,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl From<&DedupeMarker> for MarkerRecord {
    fn from(marker: &DedupeMarker) -> Self {
        MarkerRecord {
            event_id: marker.event_id.clone(),
            created_at: bson_date(marker.created_at),
        }
    }
}

fn bson_date(t: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(t.timestamp_millis())
}

/// Two collections: a dedupe collection with a unique index on `eventId`, and the events
/// collection holding event bodies without their id.
#[derive(Clone, Debug)]
pub struct MongoStore {
    dedupe: Collection<MarkerRecord>,
    events: Collection<StoredEvent>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        MongoStore {
            dedupe: get_collection(db, DEDUPE_COLLECTION),
            events: get_collection(db, EVENTS_COLLECTION),
        }
    }
}

impl EventStore for MongoStore {
    #[tracing::instrument(skip_all, err(Debug))]
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! {"eventId": 1})
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let res = self.dedupe.create_index(index).await?;
        tracing::debug!(index = %res.index_name, "dedupe index ensured");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(event_id = %marker.event_id))]
    async fn reserve(&self, marker: &DedupeMarker) -> Result<(), StoreError> {
        self.dedupe.insert_one(MarkerRecord::from(marker)).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, err(Debug))]
    async fn insert_event(&self, event: &StoredEvent) -> Result<(), StoreError> {
        self.events.insert_one(event).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(limit = ?page.limit, skip = ?page.skip), err(Debug))]
    async fn events(&self, page: Page) -> Result<Vec<StoredEvent>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! {"_id": 1})
            .limit(page.limit().map(i64::from))
            .skip(page.skip)
            .build();
        let events = self
            .events
            .find(doc! {})
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(events)
    }

    #[tracing::instrument(skip_all, fields(%before), err(Debug))]
    async fn prune_markers(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let res = self
            .dedupe
            .delete_many(doc! {
                "createdAt": {
                    "$lt": bson_date(before)
                }
            })
            .await?;
        Ok(res.deleted_count)
    }
}
