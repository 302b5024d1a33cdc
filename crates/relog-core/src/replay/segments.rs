//! Timeline segments
//!
//! Derives the robot's operating-mode timeline from driver-station flag
//! samples. Flags arrive as boolean samples under `DS:`-prefixed keys;
//! the combined state follows the precedence EStop > Disabled >
//! Autonomous > Teleop.

use serde::{Deserialize, Serialize};

use super::Sample;

/// Key prefix for driver-station flag channels
pub const DS_PREFIX: &str = "DS:";

/// Combined operating mode over one stretch of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentState {
    /// Robot disabled
    Disabled,
    /// Enabled, operator control
    Teleop,
    /// Enabled, autonomous routine
    Autonomous,
    /// Emergency stop
    EStop,
}

/// A half-open stretch of the timeline in one [`SegmentState`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    /// Segment start in seconds
    pub start: f64,
    /// Segment end in seconds
    pub end: f64,
    /// Operating mode throughout the segment
    pub state: SegmentState,
}

#[derive(Default)]
struct DsFlags {
    enabled: bool,
    autonomous: bool,
    estop: bool,
}

impl DsFlags {
    fn state(&self) -> SegmentState {
        if self.estop {
            SegmentState::EStop
        } else if !self.enabled {
            SegmentState::Disabled
        } else if self.autonomous {
            SegmentState::Autonomous
        } else {
            SegmentState::Teleop
        }
    }

    /// Returns false for flag names this derivation does not track
    fn set(&mut self, flag: &str, value: bool) -> bool {
        match flag {
            "enabled" => self.enabled = value,
            "autonomous" => self.autonomous = value,
            "estop" => self.estop = value,
            _ => return false,
        }
        true
    }
}

/// Derive operating-mode segments from a sorted sample list.
///
/// The final segment is closed at the timestamp of the last sample in the
/// log (not the last flag change). An empty sample list yields no
/// segments.
pub fn derive_segments(samples: &[Sample]) -> Vec<TimelineSegment> {
    let Some(last) = samples.last() else {
        return Vec::new();
    };
    let duration = last.timestamp;

    let mut flags = DsFlags::default();
    let mut segments = Vec::new();
    let mut current = flags.state();
    let mut start = 0.0;

    for sample in samples {
        let Some(flag) = sample.key.strip_prefix(DS_PREFIX) else {
            continue;
        };
        if !flags.set(flag, parse_flag(&sample.value)) {
            continue;
        }
        let next = flags.state();
        if next != current {
            segments.push(TimelineSegment {
                start,
                end: sample.timestamp,
                state: current,
            });
            current = next;
            start = sample.timestamp;
        }
    }

    segments.push(TimelineSegment {
        start,
        end: duration,
        state: current,
    });
    segments
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "True" | "1")
}
