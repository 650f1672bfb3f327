//! Analytics Event Types
//!
//! Shared between the producer (`analytics-client`) and the sink
//! (`analytics-service`).
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "eventId": "d1:game_action:dice-1:roll/172938201",
//!   "deviceId": "d1",
//!   "timestamp": "2024-10-17T09:30:00.000Z",
//!   "event": { "type": "game_action", "gameId": "dice-1", "action": "roll" }
//! }
//! ```
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discrete user action. Closed set: any other `type` fails to deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    LessonViewed {
        lesson_id: String,
    },
    LessonClosed {
        lesson_id: String,
    },
    GameStarted {
        game_id: String,
    },
    GameCompleted {
        game_id: String,
    },
    GameAction {
        game_id: String,
        /// Arbitrary action, dependent on game
        action: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    QuestionAnswered {
        game_id: String,
        question_id: String,
        correct: bool,
    },
}

impl Event {
    /// Wire tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Event::LessonViewed { .. } => "lesson_viewed",
            Event::LessonClosed { .. } => "lesson_closed",
            Event::GameStarted { .. } => "game_started",
            Event::GameCompleted { .. } => "game_completed",
            Event::GameAction { .. } => "game_action",
            Event::QuestionAnswered { .. } => "question_answered",
        }
    }

    /// The variant-relevant fields that make two events of the same kind distinct.
    pub fn discriminator(&self) -> String {
        match self {
            Event::LessonViewed { lesson_id } | Event::LessonClosed { lesson_id } => {
                lesson_id.clone()
            }
            Event::GameStarted { game_id } | Event::GameCompleted { game_id } => game_id.clone(),
            Event::GameAction {
                game_id, action, ..
            } => format!("{game_id}:{action}"),
            Event::QuestionAnswered {
                game_id,
                question_id,
                ..
            } => format!("{game_id}:{question_id}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("eventId must not be empty")]
    EmptyEventId,
    #[error("deviceId must not be empty")]
    EmptyDeviceId,
    #[error("timestamp '{0}' is not ISO-8601")]
    Timestamp(String),
}

/// Envelope sent by the producer. `event_id` is the sole deduplication key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    pub event_id: String,
    pub device_id: String,
    pub timestamp: String,
    pub event: Event,
}

impl EventDocument {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_id.trim().is_empty() {
            return Err(ValidationError::EmptyEventId);
        }
        if self.device_id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        self.created_at()?;
        Ok(())
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>, ValidationError> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| ValidationError::Timestamp(self.timestamp.clone()))
    }

    /// Splits off the dedup key, leaving the body written to the events store.
    pub fn into_stored(self) -> (String, StoredEvent) {
        let EventDocument {
            event_id,
            device_id,
            timestamp,
            event,
        } = self;
        (
            event_id,
            StoredEvent {
                device_id,
                timestamp,
                event,
            },
        )
    }
}

/// Persisted event body: the envelope without `eventId`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub device_id: String,
    pub timestamp: String,
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(event: Event) -> EventDocument {
        EventDocument {
            event_id: "d1:lesson_viewed:intro/5".to_string(),
            device_id: "d1".to_string(),
            timestamp: "2024-10-17T09:30:00.000Z".to_string(),
            event,
        }
    }

    #[test]
    fn event_uses_type_tag_and_camel_case_fields() {
        let event = Event::QuestionAnswered {
            game_id: "quiz".to_string(),
            question_id: "q1".to_string(),
            correct: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "question_answered", "gameId": "quiz", "questionId": "q1", "correct": true})
        );
    }

    #[test]
    fn game_action_details_are_optional() {
        let event: Event =
            serde_json::from_value(json!({"type": "game_action", "gameId": "dice-1", "action": "roll"}))
                .unwrap();
        assert_eq!(
            event,
            Event::GameAction {
                game_id: "dice-1".to_string(),
                action: "roll".to_string(),
                details: None,
            }
        );
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "game_action", "gameId": "dice-1", "action": "roll"})
        );

        let event: Event = serde_json::from_value(
            json!({"type": "game_action", "gameId": "dice-1", "action": "guess", "details": {"value": 4}}),
        )
        .unwrap();
        let Event::GameAction { details, .. } = event else {
            panic!("expected game_action");
        };
        assert_eq!(details, Some(json!({"value": 4})));
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let res = serde_json::from_value::<Event>(json!({"type": "game_response", "gameId": "x"}));
        assert!(res.is_err());
    }

    #[test]
    fn missing_variant_field_is_rejected() {
        let res = serde_json::from_value::<Event>(json!({"type": "lesson_viewed"}));
        assert!(res.is_err());
    }

    #[test]
    fn discriminator_per_variant() {
        let cases = [
            (
                Event::LessonViewed {
                    lesson_id: "intro".to_string(),
                },
                "lesson_viewed",
                "intro",
            ),
            (
                Event::LessonClosed {
                    lesson_id: "intro".to_string(),
                },
                "lesson_closed",
                "intro",
            ),
            (
                Event::GameStarted {
                    game_id: "dice".to_string(),
                },
                "game_started",
                "dice",
            ),
            (
                Event::GameCompleted {
                    game_id: "dice".to_string(),
                },
                "game_completed",
                "dice",
            ),
            (
                Event::GameAction {
                    game_id: "dice-1".to_string(),
                    action: "roll".to_string(),
                    details: Some(json!(6)),
                },
                "game_action",
                "dice-1:roll",
            ),
            (
                Event::QuestionAnswered {
                    game_id: "quiz".to_string(),
                    question_id: "q2".to_string(),
                    correct: false,
                },
                "question_answered",
                "quiz:q2",
            ),
        ];

        for (event, kind, discriminator) in cases {
            assert_eq!(event.kind(), kind);
            assert_eq!(event.discriminator(), discriminator);
            // `kind` must agree with the serialized tag
            assert_eq!(serde_json::to_value(&event).unwrap()["type"], kind);
        }
    }

    #[test]
    fn validate_rejects_empty_ids_and_bad_timestamps() {
        let event = Event::LessonViewed {
            lesson_id: "intro".to_string(),
        };
        assert_eq!(document(event.clone()).validate(), Ok(()));

        let mut doc = document(event.clone());
        doc.event_id = " ".to_string();
        assert_eq!(doc.validate(), Err(ValidationError::EmptyEventId));

        let mut doc = document(event.clone());
        doc.device_id = String::new();
        assert_eq!(doc.validate(), Err(ValidationError::EmptyDeviceId));

        let mut doc = document(event);
        doc.timestamp = "yesterday".to_string();
        assert_eq!(
            doc.validate(),
            Err(ValidationError::Timestamp("yesterday".to_string()))
        );
    }

    #[test]
    fn into_stored_drops_event_id() {
        let doc = document(Event::GameStarted {
            game_id: "dice".to_string(),
        });
        let (event_id, stored) = doc.clone().into_stored();
        assert_eq!(event_id, doc.event_id);
        assert_eq!(stored.device_id, doc.device_id);
        assert_eq!(stored.timestamp, doc.timestamp);
        assert_eq!(stored.event, doc.event);

        let value = serde_json::to_value(&stored).unwrap();
        assert!(value.get("eventId").is_none());
        assert_eq!(value["deviceId"], "d1");
    }
}
