//! Log encoding
//!
//! [`LogBuilder`] assembles a valid log buffer record by record. It backs
//! the round-trip tests and the demo generator; it is not a general
//! archival writer (timestamps are limited to the 4-byte header widths the
//! reader consumes, which covers more than an hour of microseconds).

use super::{CONTROL_ENTRY, CONTROL_FINISH, CONTROL_SET_METADATA, CONTROL_START};
use super::reader::prologue;

/// Incremental builder for a binary log buffer
pub struct LogBuilder {
    buf: Vec<u8>,
}

impl LogBuilder {
    /// Start a log with an empty extra header
    pub fn new() -> Self {
        Self::with_extra_header("")
    }

    /// Start a log carrying the given extra header string
    pub fn with_extra_header(extra_header: &str) -> Self {
        Self {
            buf: prologue(extra_header.as_bytes()),
        }
    }

    /// Append a Start control record registering `id`
    pub fn start_entry(
        &mut self,
        id: u32,
        name: &str,
        type_name: &str,
        metadata: &str,
        timestamp_us: u64,
    ) -> &mut Self {
        let mut payload = vec![CONTROL_START];
        payload.extend_from_slice(&id.to_le_bytes());
        for s in [name, type_name, metadata] {
            payload.extend_from_slice(&(s.len() as u32).to_le_bytes());
            payload.extend_from_slice(s.as_bytes());
        }
        self.append_record(CONTROL_ENTRY, timestamp_us, &payload)
    }

    /// Append a Finish control record retiring `id`
    pub fn finish_entry(&mut self, id: u32, timestamp_us: u64) -> &mut Self {
        let mut payload = vec![CONTROL_FINISH];
        payload.extend_from_slice(&id.to_le_bytes());
        self.append_record(CONTROL_ENTRY, timestamp_us, &payload)
    }

    /// Append a SetMetadata control record for `id`
    pub fn set_metadata(&mut self, id: u32, metadata: &str, timestamp_us: u64) -> &mut Self {
        let mut payload = vec![CONTROL_SET_METADATA];
        payload.extend_from_slice(&id.to_le_bytes());
        payload.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
        payload.extend_from_slice(metadata.as_bytes());
        self.append_record(CONTROL_ENTRY, timestamp_us, &payload)
    }

    /// Append a raw data record with minimal variable-width header fields
    pub fn append_record(&mut self, entry: u32, timestamp_us: u64, data: &[u8]) -> &mut Self {
        let entry_len = field_width(entry as u64);
        let size_len = field_width(data.len() as u64);
        let ts_len = field_width(timestamp_us);

        let head = (entry_len - 1) | (size_len - 1) << 2 | (ts_len - 1) << 4;
        self.buf.push(head);
        self.buf
            .extend_from_slice(&(entry as u64).to_le_bytes()[..entry_len as usize]);
        self.buf
            .extend_from_slice(&(data.len() as u64).to_le_bytes()[..size_len as usize]);
        self.buf
            .extend_from_slice(&timestamp_us.to_le_bytes()[..ts_len as usize]);
        self.buf.extend_from_slice(data);
        self
    }

    /// Append a boolean data record
    pub fn append_boolean(&mut self, entry: u32, timestamp_us: u64, value: bool) -> &mut Self {
        self.append_record(entry, timestamp_us, &[value as u8])
    }

    /// Append an int64 data record
    pub fn append_int64(&mut self, entry: u32, timestamp_us: u64, value: i64) -> &mut Self {
        self.append_record(entry, timestamp_us, &value.to_le_bytes())
    }

    /// Append a float data record
    pub fn append_float(&mut self, entry: u32, timestamp_us: u64, value: f32) -> &mut Self {
        self.append_record(entry, timestamp_us, &value.to_le_bytes())
    }

    /// Append a double data record
    pub fn append_double(&mut self, entry: u32, timestamp_us: u64, value: f64) -> &mut Self {
        self.append_record(entry, timestamp_us, &value.to_le_bytes())
    }

    /// Append a string data record
    pub fn append_string(&mut self, entry: u32, timestamp_us: u64, value: &str) -> &mut Self {
        self.append_record(entry, timestamp_us, value.as_bytes())
    }

    /// Append a boolean[] data record
    pub fn append_boolean_array(
        &mut self,
        entry: u32,
        timestamp_us: u64,
        values: &[bool],
    ) -> &mut Self {
        let data: Vec<u8> = values.iter().map(|v| *v as u8).collect();
        self.append_record(entry, timestamp_us, &data)
    }

    /// Append an int64[] data record
    pub fn append_int64_array(
        &mut self,
        entry: u32,
        timestamp_us: u64,
        values: &[i64],
    ) -> &mut Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        self.append_record(entry, timestamp_us, &data)
    }

    /// Append a float[] data record
    pub fn append_float_array(
        &mut self,
        entry: u32,
        timestamp_us: u64,
        values: &[f32],
    ) -> &mut Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        self.append_record(entry, timestamp_us, &data)
    }

    /// Append a double[] data record
    pub fn append_double_array(
        &mut self,
        entry: u32,
        timestamp_us: u64,
        values: &[f64],
    ) -> &mut Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for v in values {
            data.extend_from_slice(&v.to_le_bytes());
        }
        self.append_record(entry, timestamp_us, &data)
    }

    /// Append a string[] data record
    pub fn append_string_array(
        &mut self,
        entry: u32,
        timestamp_us: u64,
        values: &[&str],
    ) -> &mut Self {
        let mut data = (values.len() as u32).to_le_bytes().to_vec();
        for s in values {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        self.append_record(entry, timestamp_us, &data)
    }

    /// Append an opaque data record
    pub fn append_raw(&mut self, entry: u32, timestamp_us: u64, data: &[u8]) -> &mut Self {
        self.append_record(entry, timestamp_us, data)
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the builder, yielding the finished buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for LogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal header field width for a value, clamped to the 4 bytes the
/// 2-bit width encoding can express.
fn field_width(value: u64) -> u8 {
    match value {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFF_FFFF => 3,
        _ => 4,
    }
}
