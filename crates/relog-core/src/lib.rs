//! # relog Core Library
//!
//! Core functionality for the relog telemetry replay tools.
//!
//! This library provides:
//! - Binary telemetry log (`.wpilog`) decoding
//! - Projection of decoded records into timestamped samples
//! - Frame coalescing and real-time playback scheduling
//! - The line-oriented control protocol spoken by the playback daemon
//! - Sink abstractions for re-publishing replayed values
//!
//! ## Example
//!
//! ```rust,ignore
//! use relog_core::prelude::*;
//!
//! // Decode a log file into samples
//! let buf = std::fs::read("match.wpilog")?;
//! let reader = LogReader::new(buf)?;
//! let config = ReplayConfig::default();
//! let samples = project(&reader, &config);
//!
//! // Coalesce into frames and replay against a sink
//! let frames = coalesce(&samples, config.period);
//! let scheduler = PlaybackScheduler::spawn(config);
//! scheduler.set_sink(Box::new(TcpSink::connect("127.0.0.1", 5810)?));
//! scheduler.load(frames);
//! scheduler.set_publishing(true);
//! scheduler.play();
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod control;
pub mod demo;
pub mod replay;
pub mod sink;
pub mod wpilog;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::control::{Command, ControlChannel, ReplayClient, Response};
    pub use crate::replay::{
        coalesce, derive_segments, project, Frame, FrameValue, PlaybackScheduler, ReplayConfig,
        ReplaySession, Sample, TimelineSegment,
    };
    pub use crate::sink::{NullSink, RecordingSink, Sink, TcpSink};
    pub use crate::wpilog::{LogBuilder, LogReader, Record, ValueType};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
