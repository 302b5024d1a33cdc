//! Typed value decode
//!
//! Each log entry declares a type name at registration; data payloads are
//! decoded against that type. [`ValueType`] is a closed enumeration so
//! every decoder and publisher match is exhaustive at compile time.
//! Unknown type names fall through to [`ValueType::Raw`], which passes
//! the payload along hex-encoded.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// The closed set of value types a log entry can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Single boolean, first payload byte
    #[serde(rename = "boolean")]
    Boolean,
    /// Signed 64-bit integer, little-endian
    #[serde(rename = "int64")]
    Int64,
    /// 32-bit IEEE-754 float, little-endian
    #[serde(rename = "float")]
    Float,
    /// 64-bit IEEE-754 float, little-endian
    #[serde(rename = "double")]
    Double,
    /// UTF-8 string spanning the whole payload
    #[serde(rename = "string")]
    String,
    /// One byte per element
    #[serde(rename = "boolean[]")]
    BooleanArray,
    /// Packed little-endian i64 elements
    #[serde(rename = "int64[]")]
    Int64Array,
    /// Packed little-endian f32 elements
    #[serde(rename = "float[]")]
    FloatArray,
    /// Packed little-endian f64 elements
    #[serde(rename = "double[]")]
    DoubleArray,
    /// Length-prefixed count, then length-prefixed UTF-8 elements
    #[serde(rename = "string[]")]
    StringArray,
    /// Opaque payload, hex-encoded; covers every unrecognized type name
    #[serde(rename = "raw")]
    Raw,
}

impl ValueType {
    /// Map a declared type name onto the closed enumeration.
    ///
    /// Any name not listed (struct schemas, protobufs, `json`, …) maps to
    /// [`ValueType::Raw`]; the declared name can travel out-of-band in
    /// the entry metadata for sinks that understand it.
    pub fn from_name(name: &str) -> Self {
        match name {
            "boolean" => ValueType::Boolean,
            "int64" => ValueType::Int64,
            "float" => ValueType::Float,
            "double" => ValueType::Double,
            "string" => ValueType::String,
            "boolean[]" => ValueType::BooleanArray,
            "int64[]" => ValueType::Int64Array,
            "float[]" => ValueType::FloatArray,
            "double[]" => ValueType::DoubleArray,
            "string[]" => ValueType::StringArray,
            _ => ValueType::Raw,
        }
    }

    /// Canonical wire name of this type
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Int64 => "int64",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::BooleanArray => "boolean[]",
            ValueType::Int64Array => "int64[]",
            ValueType::FloatArray => "float[]",
            ValueType::DoubleArray => "double[]",
            ValueType::StringArray => "string[]",
            ValueType::Raw => "raw",
        }
    }

    /// Decode a data payload against this type.
    ///
    /// Returns `None` when the payload cannot satisfy the type (wrong
    /// length, truncated inner string). Callers substitute an empty value
    /// so one malformed sample never blocks the rest of the log.
    pub fn decode(&self, data: &[u8]) -> Option<LogValue> {
        match self {
            ValueType::Boolean => Some(LogValue::Boolean(*data.first()? != 0)),
            ValueType::Int64 => {
                if data.is_empty() || data.len() > 8 {
                    return None;
                }
                Some(LogValue::Int64(LittleEndian::read_int(data, data.len())))
            }
            ValueType::Float => {
                if data.len() != 4 {
                    return None;
                }
                Some(LogValue::Float(LittleEndian::read_f32(data)))
            }
            ValueType::Double => {
                if data.len() != 8 {
                    return None;
                }
                Some(LogValue::Double(LittleEndian::read_f64(data)))
            }
            ValueType::String => Some(LogValue::String(
                String::from_utf8_lossy(data).into_owned(),
            )),
            ValueType::BooleanArray => {
                Some(LogValue::BooleanArray(data.iter().map(|b| *b != 0).collect()))
            }
            ValueType::Int64Array => Some(LogValue::Int64Array(
                data.chunks_exact(8).map(LittleEndian::read_i64).collect(),
            )),
            ValueType::FloatArray => Some(LogValue::FloatArray(
                data.chunks_exact(4).map(LittleEndian::read_f32).collect(),
            )),
            ValueType::DoubleArray => Some(LogValue::DoubleArray(
                data.chunks_exact(8).map(LittleEndian::read_f64).collect(),
            )),
            ValueType::StringArray => {
                let count = LittleEndian::read_u32(data.get(0..4)?) as usize;
                let mut out = Vec::with_capacity(count.min(1024));
                let mut pos = 4;
                for _ in 0..count {
                    let len = LittleEndian::read_u32(data.get(pos..pos + 4)?) as usize;
                    pos += 4;
                    let bytes = data.get(pos..pos + len)?;
                    pos += len;
                    out.push(String::from_utf8_lossy(bytes).into_owned());
                }
                Some(LogValue::StringArray(out))
            }
            ValueType::Raw => Some(LogValue::Raw(data.to_vec())),
        }
    }
}

/// A decoded, typed value
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    /// Boolean scalar
    Boolean(bool),
    /// Integer scalar
    Int64(i64),
    /// Single-precision scalar
    Float(f32),
    /// Double-precision scalar
    Double(f64),
    /// String scalar
    String(String),
    /// Boolean array
    BooleanArray(Vec<bool>),
    /// Integer array
    Int64Array(Vec<i64>),
    /// Single-precision array
    FloatArray(Vec<f32>),
    /// Double-precision array
    DoubleArray(Vec<f64>),
    /// String array
    StringArray(Vec<String>),
    /// Opaque bytes
    Raw(Vec<u8>),
}

impl LogValue {
    /// The [`ValueType`] this value decodes as
    pub fn value_type(&self) -> ValueType {
        match self {
            LogValue::Boolean(_) => ValueType::Boolean,
            LogValue::Int64(_) => ValueType::Int64,
            LogValue::Float(_) => ValueType::Float,
            LogValue::Double(_) => ValueType::Double,
            LogValue::String(_) => ValueType::String,
            LogValue::BooleanArray(_) => ValueType::BooleanArray,
            LogValue::Int64Array(_) => ValueType::Int64Array,
            LogValue::FloatArray(_) => ValueType::FloatArray,
            LogValue::DoubleArray(_) => ValueType::DoubleArray,
            LogValue::StringArray(_) => ValueType::StringArray,
            LogValue::Raw(_) => ValueType::Raw,
        }
    }

    /// Interchange string encoding: `true`/`false` booleans, comma-joined
    /// arrays, lowercase hex for raw payloads.
    pub fn encode(&self) -> String {
        match self {
            LogValue::Boolean(v) => v.to_string(),
            LogValue::Int64(v) => v.to_string(),
            LogValue::Float(v) => v.to_string(),
            LogValue::Double(v) => v.to_string(),
            LogValue::String(v) => v.clone(),
            LogValue::BooleanArray(vs) => join(vs.iter()),
            LogValue::Int64Array(vs) => join(vs.iter()),
            LogValue::FloatArray(vs) => join(vs.iter()),
            LogValue::DoubleArray(vs) => join(vs.iter()),
            LogValue::StringArray(vs) => vs.join(","),
            LogValue::Raw(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    out.push_str(&format!("{b:02x}"));
                }
                out
            }
        }
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for ty in [
            ValueType::Boolean,
            ValueType::Int64,
            ValueType::Float,
            ValueType::Double,
            ValueType::String,
            ValueType::BooleanArray,
            ValueType::Int64Array,
            ValueType::FloatArray,
            ValueType::DoubleArray,
            ValueType::StringArray,
            ValueType::Raw,
        ] {
            assert_eq!(ValueType::from_name(ty.name()), ty);
        }
    }

    #[test]
    fn test_unknown_name_maps_to_raw() {
        assert_eq!(ValueType::from_name("struct:Pose2d"), ValueType::Raw);
        assert_eq!(ValueType::from_name("msgpack"), ValueType::Raw);
    }

    #[test]
    fn test_scalar_decode() {
        assert_eq!(
            ValueType::Boolean.decode(&[1]),
            Some(LogValue::Boolean(true))
        );
        assert_eq!(
            ValueType::Boolean.decode(&[0]),
            Some(LogValue::Boolean(false))
        );
        assert_eq!(
            ValueType::Int64.decode(&(-17i64).to_le_bytes()),
            Some(LogValue::Int64(-17))
        );
        // int64 payloads may be narrower than 8 bytes
        assert_eq!(ValueType::Int64.decode(&[0xFF]), Some(LogValue::Int64(-1)));
        assert_eq!(
            ValueType::Double.decode(&1.5f64.to_le_bytes()),
            Some(LogValue::Double(1.5))
        );
        assert_eq!(
            ValueType::String.decode(b"hello"),
            Some(LogValue::String("hello".into()))
        );
        assert_eq!(
            LogValue::Boolean(true).value_type(),
            ValueType::Boolean
        );
    }

    #[test]
    fn test_wrong_length_is_decode_failure() {
        assert_eq!(ValueType::Boolean.decode(&[]), None);
        assert_eq!(ValueType::Int64.decode(&[]), None);
        assert_eq!(ValueType::Float.decode(&[0, 0]), None);
        assert_eq!(ValueType::Double.decode(&[0; 7]), None);
    }

    #[test]
    fn test_array_decode_and_encode() {
        let mut data = Vec::new();
        for v in [1.0f64, -2.5, 0.25] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let value = ValueType::DoubleArray.decode(&data).unwrap();
        assert_eq!(
            value,
            LogValue::DoubleArray(vec![1.0, -2.5, 0.25])
        );
        assert_eq!(value.encode(), "1,-2.5,0.25");

        let value = ValueType::BooleanArray.decode(&[1, 0, 2]).unwrap();
        assert_eq!(value.encode(), "true,false,true");
    }

    #[test]
    fn test_string_array_decode() {
        let mut data = 2u32.to_le_bytes().to_vec();
        for s in ["red", "blue"] {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        let value = ValueType::StringArray.decode(&data).unwrap();
        assert_eq!(value.encode(), "red,blue");

        // Count overrunning the payload is a decode failure
        let mut short = 3u32.to_le_bytes().to_vec();
        short.extend_from_slice(&1u32.to_le_bytes());
        short.push(b'x');
        assert_eq!(ValueType::StringArray.decode(&short), None);
    }

    #[test]
    fn test_raw_hex_encode() {
        let value = ValueType::Raw.decode(&[0xDE, 0xAD, 0x01]).unwrap();
        assert_eq!(value.encode(), "dead01");
    }
}
