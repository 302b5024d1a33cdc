//! Frame coalescing
//!
//! Buckets the sorted sample stream into fixed-width time slots so the
//! playback loop can look up "the state at tick N" in O(1). Within a slot
//! the last sample per key wins; perfect timestamp fidelity is traded for
//! cheap per-tick lookup.

use std::collections::HashMap;
use std::time::Duration;

use super::Sample;
use crate::wpilog::ValueType;

/// The published value of one key within a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameValue {
    /// Value type
    pub value_type: ValueType,
    /// String-encoded value
    pub value: String,
    /// Entry metadata
    pub metadata: String,
}

/// Last known value per key within one period-wide interval.
///
/// Frame `i` covers `[i * period, (i + 1) * period)`.
pub type Frame = HashMap<String, FrameValue>;

/// Coalesce a sorted sample list into a frame array.
///
/// The array spans `floor(last_timestamp / period) + 1` frames; each
/// sample lands in frame `floor(timestamp / period)`, overwriting any
/// earlier value for the same key in that slot. Samples must already be
/// sorted (see [`super::project`]), so "last write" means latest
/// timestamp.
pub fn coalesce(samples: &[Sample], period: Duration) -> Vec<Frame> {
    let Some(last) = samples.last() else {
        return Vec::new();
    };
    let period_s = period.as_secs_f64();
    let frame_count = (last.timestamp / period_s) as usize + 1;
    let mut frames = vec![Frame::new(); frame_count];

    for sample in samples {
        // Float division can round the last sample just past the end slot
        let idx = ((sample.timestamp / period_s) as usize).min(frame_count - 1);
        frames[idx].insert(
            sample.key.clone(),
            FrameValue {
                value_type: sample.value_type,
                value: sample.value.clone(),
                metadata: sample.metadata.clone(),
            },
        );
    }

    frames
}
