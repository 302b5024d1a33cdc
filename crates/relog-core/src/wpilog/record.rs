//! Decoded log records
//!
//! A [`Record`] is one decoded unit of the log: either a data record
//! carrying a typed payload for some entry, or a control record (entry id 0)
//! carrying entry-lifecycle information.

use byteorder::{ByteOrder, LittleEndian};

use super::{CONTROL_ENTRY, CONTROL_FINISH, CONTROL_SET_METADATA, CONTROL_START};

/// Payload of a Start control record: registers an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartData {
    /// Id of the entry being registered
    pub entry: u32,
    /// Entry name (the replay key)
    pub name: String,
    /// Declared type name, e.g. `"double"` or `"boolean[]"`
    pub type_name: String,
    /// Initial metadata string (often JSON, may be empty)
    pub metadata: String,
}

/// A single decoded record, borrowing its payload from the log buffer
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Entry id this record belongs to (0 for control records)
    pub entry: u32,
    /// Timestamp in microseconds since log start
    pub timestamp_us: u64,
    /// Raw payload bytes
    pub data: &'a [u8],
}

impl<'a> Record<'a> {
    /// Whether this is a control record (entry id 0)
    pub fn is_control(&self) -> bool {
        self.entry == CONTROL_ENTRY
    }

    /// Whether this is a well-formed Start control record
    pub fn is_start(&self) -> bool {
        self.is_control() && self.data.len() >= 17 && self.data[0] == CONTROL_START
    }

    /// Whether this is a well-formed Finish control record
    pub fn is_finish(&self) -> bool {
        self.is_control() && self.data.len() == 5 && self.data[0] == CONTROL_FINISH
    }

    /// Whether this is a well-formed SetMetadata control record
    pub fn is_set_metadata(&self) -> bool {
        self.is_control() && self.data.len() >= 9 && self.data[0] == CONTROL_SET_METADATA
    }

    /// Decode the payload of a Start record.
    ///
    /// Returns `None` if the payload is too short for its three
    /// length-prefixed strings; the caller treats that as an unrecognized
    /// control record and skips it.
    pub fn start_data(&self) -> Option<StartData> {
        if !self.is_start() {
            return None;
        }
        let entry = LittleEndian::read_u32(self.data.get(1..5)?);
        let (name, pos) = read_inner_string(self.data, 5)?;
        let (type_name, pos) = read_inner_string(self.data, pos)?;
        let (metadata, _) = read_inner_string(self.data, pos)?;
        Some(StartData {
            entry,
            name,
            type_name,
            metadata,
        })
    }

    /// Entry id retired by a Finish record
    pub fn finish_entry(&self) -> Option<u32> {
        if !self.is_finish() {
            return None;
        }
        Some(LittleEndian::read_u32(self.data.get(1..5)?))
    }

    /// Target entry id and new metadata of a SetMetadata record
    pub fn set_metadata_data(&self) -> Option<(u32, String)> {
        if !self.is_set_metadata() {
            return None;
        }
        let entry = LittleEndian::read_u32(self.data.get(1..5)?);
        let len = LittleEndian::read_u32(self.data.get(5..9)?) as usize;
        let bytes = self.data.get(9..9 + len)?;
        Some((entry, String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Read a 4-byte-length-prefixed UTF-8 string at `pos`, returning the string
/// and the offset just past it. Invalid UTF-8 is replaced, not rejected.
fn read_inner_string(data: &[u8], pos: usize) -> Option<(String, usize)> {
    let len = LittleEndian::read_u32(data.get(pos..pos + 4)?) as usize;
    let end = pos + 4 + len;
    let bytes = data.get(pos + 4..end)?;
    Some((String::from_utf8_lossy(bytes).into_owned(), end))
}
