//! Replay Pipeline
//!
//! Turns decoded log records into time-accurate sink publishes:
//! projection to sorted samples, timeline segment derivation, fixed-period
//! frame coalescing, and the playback scheduler that walks frames in step
//! with wall-clock time.

mod frames;
pub mod interchange;
mod project;
mod scheduler;
mod segments;
mod session;

pub use frames::{coalesce, Frame, FrameValue};
pub use project::project;
pub use scheduler::{PlaybackScheduler, PlaybackStatus};
pub use segments::{derive_segments, SegmentState, TimelineSegment, DS_PREFIX};
pub use session::{LoadSummary, ReplaySession};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::wpilog::ValueType;

/// One projected value change: the rectangular interchange tuple consumed
/// by everything downstream of the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since log start
    pub timestamp: f64,
    /// Entry name at the time the sample was recorded
    pub key: String,
    /// Resolved value type
    pub value_type: ValueType,
    /// String-encoded value (see [`crate::wpilog::LogValue::encode`])
    pub value: String,
    /// Entry metadata at the time the sample was recorded
    pub metadata: String,
}

/// Tunable replay policy shared by projection, interchange load, and the
/// scheduler.
#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// Frame width; one sink publish pass covers one period
    pub period: Duration,
    /// Samples beyond this many seconds are discarded at load time and
    /// seeks are clamped to it. A safety bound, not a format limit.
    pub max_timestamp: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20),
            max_timestamp: 1000.0,
        }
    }
}

/// Stable sort by timestamp; ties keep their original record order.
pub(crate) fn sort_samples(samples: &mut [Sample]) {
    samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}
