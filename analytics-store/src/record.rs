use analytics_types::EventDocument;
use tracing::{debug, instrument};

use crate::{DedupeMarker, EventStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recorded {
    Fresh,
    /// Another submission already reserved this event id. Nothing was written.
    Duplicate,
}

/// Inserts the document at most once per `eventId`.
///
/// 1. Reserve the id in the dedupe collection
/// 2. Only if that succeeds, append the body (without `eventId`) to the events collection
///
/// The marker's `createdAt` is the document's own timestamp. A crash between the two steps
/// leaves the marker without its body; later submissions of the same id are still treated
/// as duplicates.
#[instrument(skip_all, fields(event_id = %document.event_id, kind = document.event.kind()))]
pub async fn record<S: EventStore>(
    store: &S,
    document: EventDocument,
) -> Result<Recorded, StoreError> {
    let created_at = document.created_at()?;
    let (event_id, stored) = document.into_stored();
    let marker = DedupeMarker {
        event_id,
        created_at,
    };

    match store.reserve(&marker).await {
        Ok(()) => {}
        Err(StoreError::DuplicateKey) => {
            debug!("event already recorded");
            return Ok(Recorded::Duplicate);
        }
        Err(e) => return Err(e),
    }

    store.insert_event(&stored).await?;
    Ok(Recorded::Fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Page};
    use analytics_types::{Event, StoredEvent, ValidationError};
    use chrono::{DateTime, Utc};

    fn document(event_id: &str, event: Event) -> EventDocument {
        EventDocument {
            event_id: event_id.to_string(),
            device_id: "d1".to_string(),
            timestamp: "2024-10-17T09:30:00.000Z".to_string(),
            event,
        }
    }

    #[tokio::test]
    async fn duplicate_writes_nothing_to_events() {
        let store = MemoryStore::new();
        let doc = document(
            "d1:game_started:dice/7",
            Event::GameStarted {
                game_id: "dice".to_string(),
            },
        );
        assert_eq!(
            record(&store, doc.clone()).await.unwrap(),
            Recorded::Fresh
        );
        assert_eq!(
            record(&store, doc.clone()).await.unwrap(),
            Recorded::Duplicate
        );

        let events = store.events(Page::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], doc.into_stored().1);
    }

    #[tokio::test]
    async fn marker_is_stamped_with_document_timestamp() {
        let store = MemoryStore::new();
        let doc = document(
            "d1:lesson_closed:intro/5",
            Event::LessonClosed {
                lesson_id: "intro".to_string(),
            },
        );
        let timestamp = doc.created_at().unwrap();
        record(&store, doc).await.unwrap();

        // Pruning strictly before the timestamp keeps the marker, just after removes it
        assert_eq!(store.prune_markers(timestamp).await.unwrap(), 0);
        assert_eq!(
            store
                .prune_markers(timestamp + chrono::Duration::milliseconds(1))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn unparseable_timestamp_writes_nothing() {
        let store = MemoryStore::new();
        let mut doc = document(
            "d1:game_started:dice/7",
            Event::GameStarted {
                game_id: "dice".to_string(),
            },
        );
        doc.timestamp = "soon".to_string();

        let err = record(&store, doc).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidDocument(ValidationError::Timestamp(_))
        ));
        assert_eq!(store.marker_count().unwrap(), 0);
        assert!(store.events(Page::default()).await.unwrap().is_empty());
    }

    #[derive(Clone)]
    struct BrokenReserve;

    impl EventStore for BrokenReserve {
        async fn ensure_indexes(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn reserve(&self, _: &DedupeMarker) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn insert_event(&self, _: &StoredEvent) -> Result<(), StoreError> {
            panic!("body must not be written when the reservation fails");
        }
        async fn events(&self, _: Page) -> Result<Vec<StoredEvent>, StoreError> {
            Ok(vec![])
        }
        async fn prune_markers(&self, _: DateTime<Utc>) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn reservation_failure_is_an_error() {
        let doc = document(
            "d1:lesson_viewed:intro/5",
            Event::LessonViewed {
                lesson_id: "intro".to_string(),
            },
        );
        let err = record(&BrokenReserve, doc).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
