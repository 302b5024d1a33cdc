//! Record projection
//!
//! One forward pass over the decoded record stream: control records feed
//! the entry registry, data records resolve to their live entry and become
//! [`Sample`]s. Control records, unresolvable data records, and samples
//! past the configured cutoff never reach the output.

use super::{sort_samples, ReplayConfig, Sample};
use crate::wpilog::{EntryRegistry, LogReader};

/// Project a decoded log into a sorted sample list.
///
/// A data record referencing an entry before its Start record or after its
/// Finish record is silently dropped. A payload that fails its type's
/// decode yields a sample with an empty value rather than aborting the
/// pass.
pub fn project(reader: &LogReader, config: &ReplayConfig) -> Vec<Sample> {
    let mut registry = EntryRegistry::new();
    let mut samples = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        if registry.apply(&record) {
            continue;
        }
        let Some(entry) = registry.resolve(record.entry) else {
            dropped += 1;
            continue;
        };

        let timestamp = record.timestamp_us as f64 / 1e6;
        if timestamp > config.max_timestamp {
            continue;
        }

        let value = match entry.value_type.decode(record.data) {
            Some(value) => value.encode(),
            None => String::new(),
        };

        samples.push(Sample {
            timestamp,
            key: entry.name.clone(),
            value_type: entry.value_type,
            value,
            metadata: entry.metadata.clone(),
        });
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped data records with no live entry");
    }

    sort_samples(&mut samples);
    samples
}
