//! Binary Telemetry Log Format
//!
//! Implements decoding and encoding of the WPILib data log format
//! (length-prefixed records with variable-width headers).
//!
//! Decoding is pure and allocation-light: a [`LogReader`] borrows an
//! immutable byte buffer and hands out [`Record`]s that reference payload
//! slices inside it. Truncated input terminates the record stream rather
//! than raising an error; that is the format's normal end-of-data signal.

mod error;
mod reader;
mod record;
mod registry;
mod values;
mod writer;

pub use error::FormatError;
pub use reader::{LogReader, RecordIter};
pub use record::{Record, StartData};
pub use registry::{EntryRegistry, LogEntry};
pub use values::{LogValue, ValueType};
pub use writer::LogBuilder;

/// Magic bytes at the start of every log file
pub const MAGIC: &[u8; 6] = b"WPILOG";

/// Format version encoded in the prologue (minor byte, major byte)
pub const FORMAT_VERSION: [u8; 2] = [0x00, 0x01];

/// Length of the fixed prologue: magic, version, extra-header length
pub const PROLOGUE_LEN: usize = 12;

/// Entry id reserved for control records
pub const CONTROL_ENTRY: u32 = 0;

/// Control record subtype: register a new entry
pub const CONTROL_START: u8 = 0;

/// Control record subtype: retire an entry
pub const CONTROL_FINISH: u8 = 1;

/// Control record subtype: overwrite an entry's metadata
pub const CONTROL_SET_METADATA: u8 = 2;
