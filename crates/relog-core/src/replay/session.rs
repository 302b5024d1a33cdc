//! Replay session
//!
//! The per-process context object: owns the replay configuration, the
//! playback scheduler, and the derived timeline segments. Every control
//! protocol verb maps onto exactly one method here, and nothing in the
//! crate keeps ambient global state.

use std::io;
use std::path::Path;

use super::interchange::{self, InterchangeError};
use super::{coalesce, derive_segments, project, PlaybackScheduler, PlaybackStatus, ReplayConfig,
            Sample, TimelineSegment};
use crate::sink::{Sink, TcpSink};
use crate::wpilog::{FormatError, LogReader};

/// Result of loading a log or interchange file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSummary {
    /// Samples that survived projection and the cutoff
    pub samples: usize,
    /// Frames the samples coalesced into
    pub frames: usize,
    /// Timestamp of the last sample, in seconds
    pub duration: f64,
}

/// Owns one loaded log and the scheduler replaying it
pub struct ReplaySession {
    config: ReplayConfig,
    scheduler: PlaybackScheduler,
    segments: Vec<TimelineSegment>,
}

impl ReplaySession {
    /// Create a session and start its (idle) playback loop
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            scheduler: PlaybackScheduler::spawn(config),
            config,
            segments: Vec::new(),
        }
    }

    /// The session's replay policy
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// The playback scheduler
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    /// Timeline segments of the most recently loaded log
    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    /// Connect the publish sink to `host:port`, replacing any prior sink
    pub fn set_server(&mut self, host: &str, port: u16) -> io::Result<()> {
        let sink = TcpSink::connect(host, port)?;
        self.scheduler.set_sink(Box::new(sink));
        Ok(())
    }

    /// Install an arbitrary sink (testing, alternative transports)
    pub fn set_sink(&mut self, sink: Box<dyn Sink>) {
        self.scheduler.set_sink(sink);
    }

    /// Load samples from an interchange file
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary, InterchangeError> {
        let samples = interchange::read_samples(path, &self.config)?;
        Ok(self.load_samples(samples))
    }

    /// Decode and load a binary log file
    pub fn load_log<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadSummary, FormatError> {
        let reader = LogReader::from_file(path)?;
        Ok(self.load_samples(project(&reader, &self.config)))
    }

    /// Decode and load a binary log already in memory
    pub fn load_log_bytes(&mut self, bytes: Vec<u8>) -> Result<LoadSummary, FormatError> {
        let reader = LogReader::new(bytes)?;
        Ok(self.load_samples(project(&reader, &self.config)))
    }

    /// Load an already-projected sample list: derive segments, coalesce,
    /// and hand the frame array to the scheduler in one swap.
    pub fn load_samples(&mut self, samples: Vec<Sample>) -> LoadSummary {
        let duration = samples.last().map_or(0.0, |s| s.timestamp);
        self.segments = derive_segments(&samples);
        let frames = coalesce(&samples, self.config.period);
        let summary = LoadSummary {
            samples: samples.len(),
            frames: frames.len(),
            duration,
        };
        self.scheduler.load(frames);
        tracing::debug!(
            samples = summary.samples,
            frames = summary.frames,
            duration = summary.duration,
            "log loaded"
        );
        summary
    }

    /// Jump to a position in seconds (clamped to the replay window)
    pub fn seek(&self, seconds: f64) {
        self.scheduler.seek(seconds);
    }

    /// Start or resume playback
    pub fn play(&self) {
        self.scheduler.play();
    }

    /// Freeze playback position
    pub fn pause(&self) {
        self.scheduler.pause();
    }

    /// Halt playback and rewind to the start
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Toggle whether playback writes to the sink
    pub fn set_publishing(&self, on: bool) {
        self.scheduler.set_publishing(on);
    }

    /// Snapshot the playback state
    pub fn status(&self) -> PlaybackStatus {
        self.scheduler.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::SegmentState;
    use crate::sink::RecordingSink;
    use crate::wpilog::LogBuilder;
    use std::time::Duration;

    fn demo_log() -> Vec<u8> {
        let mut builder = LogBuilder::new();
        builder.start_entry(1, "DS:enabled", "boolean", "", 0);
        builder.start_entry(2, "DS:autonomous", "boolean", "", 0);
        builder.start_entry(3, "Drive:speed", "double", "", 0);
        builder.append_boolean(1, 1_000_000, true);
        builder.append_boolean(2, 1_000_000, true);
        builder.append_boolean(2, 16_000_000, false);
        builder.append_double(3, 30_000_000, 4.2);
        builder.into_bytes()
    }

    #[test]
    fn test_load_log_bytes_summary_and_segments() {
        let mut session = ReplaySession::new(ReplayConfig::default());
        let summary = session.load_log_bytes(demo_log()).unwrap();

        assert_eq!(summary.samples, 4);
        assert_eq!(summary.duration, 30.0);
        assert_eq!(summary.frames, 1501); // floor(30 / 0.02) + 1

        let states: Vec<SegmentState> = session.segments().iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![
                SegmentState::Disabled,
                SegmentState::Autonomous,
                SegmentState::Teleop
            ]
        );
    }

    #[test]
    fn test_load_resets_playback() {
        let mut session = ReplaySession::new(ReplayConfig::default());
        session.load_log_bytes(demo_log()).unwrap();
        session.seek(10.0);
        session.play();

        session.load_log_bytes(demo_log()).unwrap();
        let status = session.status();
        assert_eq!(status.frame_index, 0);
        assert!(!status.playing);
    }

    #[test]
    fn test_csv_round_trip_through_session() {
        let mut session = ReplaySession::new(ReplayConfig::default());
        let reader = LogReader::new(demo_log()).unwrap();
        let samples = project(&reader, session.config());

        let file = tempfile::NamedTempFile::new().unwrap();
        interchange::write_samples(file.path(), &samples).unwrap();

        let summary = session.load_csv(file.path()).unwrap();
        assert_eq!(summary.samples, samples.len());
        assert_eq!(session.segments().len(), 3);
    }

    #[test]
    fn test_missing_csv_is_error_and_keeps_prior_state() {
        let mut session = ReplaySession::new(ReplayConfig::default());
        session.load_log_bytes(demo_log()).unwrap();
        let frames_before = session.status().frame_count;

        assert!(session.load_csv("/no/such/file.csv").is_err());
        assert_eq!(session.status().frame_count, frames_before);
    }

    #[test]
    fn test_publish_through_session() {
        let config = ReplayConfig {
            period: Duration::from_millis(2),
            max_timestamp: 1000.0,
        };
        let mut session = ReplaySession::new(config);
        let sink = RecordingSink::new();
        session.set_sink(Box::new(sink.clone()));

        let mut builder = LogBuilder::new();
        builder.start_entry(1, "k", "int64", "", 0);
        builder.append_int64(1, 1_000, 1);
        builder.append_int64(1, 5_000, 2);
        session.load_log_bytes(builder.into_bytes()).unwrap();

        session.set_publishing(true);
        session.play();
        std::thread::sleep(Duration::from_millis(150));

        let values: Vec<String> = sink.records().into_iter().map(|p| p.value).collect();
        assert_eq!(values, vec!["1", "2"]);
        assert!(!session.status().playing);
    }
}
