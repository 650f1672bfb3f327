use std::time::Duration;

use analytics_types::Event;
use chrono::{DateTime, Utc};

use crate::device::DeviceId;

/// Window within which identical events collapse into one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeBucket {
    width_ms: u64,
}

impl TimeBucket {
    pub const DEFAULT_WIDTH_MS: u64 = 10_000;

    /// `None` for a zero width
    pub fn from_millis(width_ms: u64) -> Option<Self> {
        (width_ms > 0).then_some(TimeBucket { width_ms })
    }

    pub fn from_duration(width: Duration) -> Option<Self> {
        u64::try_from(width.as_millis())
            .ok()
            .and_then(Self::from_millis)
    }

    pub fn width_ms(&self) -> u64 {
        self.width_ms
    }

    /// `floor(now_ms / width)`, rounding towards negative infinity before the epoch
    pub fn index(&self, now: DateTime<Utc>) -> i64 {
        // Widths beyond i64::MAX put every instant in bucket 0 or -1
        let width = i64::try_from(self.width_ms).unwrap_or(i64::MAX);
        now.timestamp_millis().div_euclid(width)
    }
}

impl Default for TimeBucket {
    fn default() -> Self {
        TimeBucket {
            width_ms: Self::DEFAULT_WIDTH_MS,
        }
    }
}

/// `deviceId:type:discriminator/bucket`
///
/// Unique only within one bucket: repeats of the same logical event inside the window share
/// an id, anything crossing a bucket boundary does not.
pub fn event_id(device_id: &DeviceId, event: &Event, now: DateTime<Utc>, bucket: TimeBucket) -> String {
    format!(
        "{device_id}:{}:{}/{}",
        event.kind(),
        event.discriminator(),
        bucket.index(now)
    )
}
