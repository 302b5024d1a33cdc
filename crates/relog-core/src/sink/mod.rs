//! Publish Sinks
//!
//! Abstraction for the external key-value system that replayed values are
//! re-published to. The scheduler treats every sink as fire-and-forget:
//! a failing `put` is logged and swallowed, never surfaced to playback.

mod tcp;

pub use tcp::TcpSink;

use std::io;
use std::sync::{Arc, Mutex};

use crate::wpilog::ValueType;

/// Destination for replayed key/value updates.
///
/// Implementations must accept every [`ValueType`], including raw opaque
/// payloads. Errors returned from `put` are advisory; the caller logs and
/// continues.
pub trait Sink: Send {
    /// Publish one value under `key`
    fn put(
        &mut self,
        key: &str,
        value_type: ValueType,
        value: &str,
        metadata: &str,
    ) -> io::Result<()>;

    /// Flush any buffered writes; called once per published frame
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn put(&mut self, _: &str, _: ValueType, _: &str, _: &str) -> io::Result<()> {
        Ok(())
    }
}

/// One captured publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkPut {
    /// Published key
    pub key: String,
    /// Published value type
    pub value_type: ValueType,
    /// Published value encoding
    pub value: String,
    /// Published metadata
    pub metadata: String,
}

/// Sink that records every publish in memory.
///
/// Cloning yields a handle onto the same capture buffer, so a clone can
/// be handed to the scheduler while the test keeps another to inspect.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    puts: Arc<Mutex<Vec<SinkPut>>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far
    pub fn records(&self) -> Vec<SinkPut> {
        self.puts.lock().unwrap().clone()
    }

    /// Number of captured publishes
    pub fn len(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    /// Whether nothing has been published
    pub fn is_empty(&self) -> bool {
        self.puts.lock().unwrap().is_empty()
    }
}

impl Sink for RecordingSink {
    fn put(
        &mut self,
        key: &str,
        value_type: ValueType,
        value: &str,
        metadata: &str,
    ) -> io::Result<()> {
        self.puts.lock().unwrap().push(SinkPut {
            key: key.to_string(),
            value_type,
            value: value.to_string(),
            metadata: metadata.to_string(),
        });
        Ok(())
    }
}
