//! Interchange files
//!
//! Reads and writes the rectangular text table that carries projected
//! samples between the decoder and the playback daemon:
//! `timestamp,key,type,value,meta`. Fields are quoted RFC-4180 style so
//! string-array values and JSON metadata survive the round trip.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use super::{sort_samples, ReplayConfig, Sample};
use crate::wpilog::ValueType;

/// Required header line of an interchange file
pub const HEADER: &str = "timestamp,key,type,value,meta";

/// Errors raised while loading an interchange file.
///
/// Individual malformed rows are skipped, not errors; only a missing file
/// or a wrong header rejects the whole load.
#[derive(Error, Debug)]
pub enum InterchangeError {
    #[error("Missing or invalid header line")]
    BadHeader,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Write samples as an interchange file
pub fn write_samples<P: AsRef<Path>>(path: P, samples: &[Sample]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{HEADER}")?;
    for sample in samples {
        writeln!(
            writer,
            "{:.6},{},{},{},{}",
            sample.timestamp,
            quote(&sample.key),
            sample.value_type.name(),
            quote(&sample.value),
            quote(&sample.metadata),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Load samples from an interchange file.
///
/// Rows are sorted by timestamp after loading. Rows past
/// `config.max_timestamp`, rows with fewer than four fields, and rows
/// whose timestamp does not parse are skipped.
pub fn read_samples<P: AsRef<Path>>(
    path: P,
    config: &ReplayConfig,
) -> Result<Vec<Sample>, InterchangeError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    match lines.next() {
        Some(Ok(line)) if line.trim_end() == HEADER => {}
        Some(Ok(_)) | None => return Err(InterchangeError::BadHeader),
        Some(Err(e)) => return Err(e.into()),
    }

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for line in lines {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let fields = split_row(&line);
        if fields.len() < 4 {
            skipped += 1;
            continue;
        }
        let Ok(timestamp) = fields[0].trim().parse::<f64>() else {
            skipped += 1;
            continue;
        };
        if timestamp > config.max_timestamp {
            continue;
        }
        samples.push(Sample {
            timestamp,
            key: fields[1].clone(),
            value_type: ValueType::from_name(&fields[2]),
            value: fields[3].clone(),
            metadata: fields.get(4).cloned().unwrap_or_default(),
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped malformed interchange rows");
    }

    sort_samples(&mut samples);
    Ok(samples)
}

/// Quote a field if it contains a separator, quote, or line break
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        let mut out = String::with_capacity(field.len() + 2);
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
        out
    } else {
        field.to_string()
    }
}

/// Split one row into unquoted fields
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn sample(timestamp: f64, key: &str, value: &str, metadata: &str) -> Sample {
        Sample {
            timestamp,
            key: key.to_string(),
            value_type: ValueType::String,
            value: value.to_string(),
            metadata: metadata.to_string(),
        }
    }

    #[test]
    fn test_write_read_round_trip() {
        let samples = vec![
            sample(0.5, "plain", "value", ""),
            sample(1.25, "arr", "red,blue,green", "{\"type\":\"string[]\"}"),
            sample(2.0, "quoted", "say \"hi\"", "line\nbreak"),
        ];

        let file = NamedTempFile::new().unwrap();
        write_samples(file.path(), &samples).unwrap();
        let loaded = read_samples(file.path(), &ReplayConfig::default()).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1].value, "red,blue,green");
        assert_eq!(loaded[1].metadata, "{\"type\":\"string[]\"}");
        assert_eq!(loaded[2].value, "say \"hi\"");
    }

    #[test]
    fn test_rows_sorted_and_cut_off() {
        let file = NamedTempFile::new().unwrap();
        let samples = vec![
            sample(900.0, "late", "1", ""),
            sample(5.0, "early", "2", ""),
            sample(1500.0, "beyond", "3", ""),
        ];
        write_samples(file.path(), &samples).unwrap();

        let loaded = read_samples(file.path(), &ReplayConfig::default()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].key, "early");
        assert_eq!(loaded[1].key, "late");
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "timestamp,key,type,value,meta\n\
             not-a-number,k,boolean,true,\n\
             shortrow\n\
             0.5,k,boolean,true,\n",
        )
        .unwrap();

        let loaded = read_samples(file.path(), &ReplayConfig::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].timestamp, 0.5);
    }

    #[test]
    fn test_missing_meta_defaults_empty() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "timestamp,key,type,value,meta\n0.1,k,int64,7\n",
        )
        .unwrap();

        let loaded = read_samples(file.path(), &ReplayConfig::default()).unwrap();
        assert_eq!(loaded[0].metadata, "");
        assert_eq!(loaded[0].value, "7");
    }

    #[test]
    fn test_bad_header_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "time,name,kind\n0.1,k,int64,7,\n").unwrap();
        assert!(matches!(
            read_samples(file.path(), &ReplayConfig::default()),
            Err(InterchangeError::BadHeader)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_samples("/definitely/not/here.csv", &ReplayConfig::default()),
            Err(InterchangeError::Io(_))
        ));
    }
}
