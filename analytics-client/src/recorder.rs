use analytics_types::{Event, EventDocument};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    device::DeviceId,
    key::{TimeBucket, event_id},
};

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

#[derive(Deserialize)]
struct Message {
    message: String,
}

/// Sends events to the analytics sink.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Recorder {
    client: reqwest::Client,
    endpoint: String,
    device_id: DeviceId,
    bucket: TimeBucket,
}

impl Recorder {
    /// `endpoint` is the full URL of `POST /api/analytic-events`
    pub fn new(endpoint: impl Into<String>, device_id: DeviceId) -> Self {
        Recorder {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            device_id,
            bucket: TimeBucket::default(),
        }
    }

    pub fn with_bucket(mut self, bucket: TimeBucket) -> Self {
        self.bucket = bucket;
        self
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn document(&self, event: Event, now: DateTime<Utc>, bucket: TimeBucket) -> EventDocument {
        EventDocument {
            event_id: event_id(&self.device_id, &event, now, bucket),
            device_id: self.device_id.to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
        }
    }

    /// Fire-and-forget with the recorder's default bucket. See [`Recorder::record_in_bucket`].
    pub fn record(&self, event: Event) -> Option<JoinHandle<()>> {
        self.record_in_bucket(event, self.bucket)
    }

    /// Spawns delivery onto the current tokio runtime and returns immediately.
    ///
    /// Failures are logged and dropped; nothing is retried. Outside a runtime the event is
    /// dropped with a warning and `None` is returned. The handle may be dropped.
    pub fn record_in_bucket(&self, event: Event, bucket: TimeBucket) -> Option<JoinHandle<()>> {
        let document = self.document(event, Utc::now(), bucket);
        let Ok(runtime) = Handle::try_current() else {
            warn!(event_id = %document.event_id, "no tokio runtime, dropping analytics event");
            return None;
        };
        let recorder = self.clone();
        Some(runtime.spawn(async move {
            match recorder.send(&document).await {
                Ok(outcome) => {
                    debug!(event_id = %document.event_id, ?outcome, "analytics event delivered");
                }
                Err(e) => {
                    warn!(event_id = %document.event_id, error = %e, "failed to record analytics event");
                }
            }
        }))
    }

    /// Delivers one document and waits for the sink's answer.
    pub async fn send(&self, document: &EventDocument) -> Result<RecordOutcome, ClientError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(document)
            .send()
            .await?;

        let status = resp.status();
        let message = match resp.json::<Message>().await {
            Ok(m) => m.message,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => String::new(),
        };

        if !status.is_success() {
            return Err(ClientError::Rejected { status, message });
        }

        match message.as_str() {
            "Event already recorded" => Ok(RecordOutcome::AlreadyRecorded),
            _ => Ok(RecordOutcome::Recorded),
        }
    }
}
