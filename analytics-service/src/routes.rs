use analytics_store::{EventStore, Page, Recorded, record};
use analytics_types::{EventDocument, StoredEvent};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{config::AppState, error::Error};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}

/// Records an event at most once per `eventId`. Duplicates are a success.
pub async fn post_analytic_event<S: EventStore>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<Message>, Error> {
    let document = parse_document(&body)?;

    match record(&state.store, document)
        .await
        .map_err(Error::Record)?
    {
        Recorded::Fresh => Ok(Json(Message::new("Event recorded"))),
        Recorded::Duplicate => Ok(Json(Message::new("Event already recorded"))),
    }
}

fn parse_document(body: &[u8]) -> Result<EventDocument, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::NoBody);
    }
    let document: Option<EventDocument> =
        serde_json::from_slice(body).map_err(|e| Error::InvalidBody(e.to_string()))?;
    let document = document.ok_or(Error::NoBody)?;
    document
        .validate()
        .map_err(|e| Error::InvalidBody(e.to_string()))?;
    Ok(document)
}

/// Every stored event, verbatim.
///
/// Unauthenticated on purpose: the data is neither personal nor personally identifiable.
/// `limit`/`skip` are optional; without them, or with `limit=0`, the whole collection is returned.
pub async fn get_analytic_events<S: EventStore>(
    State(state): State<AppState<S>>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<StoredEvent>>, Error> {
    let Query(page) = page.map_err(|e| Error::InvalidQuery(e.body_text()))?;
    let events = state.store.events(page).await.map_err(Error::Retrieve)?;
    Ok(Json(events))
}

pub async fn get_status_ping() -> impl IntoResponse {
    info!("Status");
    StatusCode::OK
}
