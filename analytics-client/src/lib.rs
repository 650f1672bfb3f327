//! Analytics Event Producer
//!
//! Derives a stable dedup key for each event and delivers it to the sink without ever
//! blocking or failing the caller.
//!
//! ```no_run
//! # async fn demo() -> std::io::Result<()> {
//! use analytics_client::{DeviceId, Recorder};
//! use analytics_types::Event;
//!
//! let device_id = DeviceId::load_or_create(std::path::Path::new(".analytics/device-id"))?;
//! let recorder = Recorder::new("http://localhost:3000/api/analytic-events", device_id);
//! recorder.record(Event::LessonViewed { lesson_id: "intro".to_string() });
//! # Ok(())
//! # }
//! ```
pub mod device;
pub mod key;
pub mod recorder;

pub use device::DeviceId;
pub use key::{TimeBucket, event_id};
pub use recorder::{ClientError, RecordOutcome, Recorder};
