//! TCP sink
//!
//! Publishes values as newline-delimited JSON objects over a TCP
//! connection: `{"key":…,"type":…,"value":…,"meta":…}`. For raw values
//! the declared type is recovered from the metadata JSON's `"type"` tag
//! when present, so downstream consumers keep the declared schema name.

use std::io::{self, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde_json::json;

use super::Sink;
use crate::wpilog::ValueType;

/// Write timeout; a stalled peer must not hold the timing loop for long
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Sink publishing JSON lines over a TCP connection
pub struct TcpSink {
    writer: BufWriter<TcpStream>,
}

impl TcpSink {
    /// Connect to `host:port`
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host resolved to no address"))?;
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(3))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;
        tracing::debug!(%addr, "sink connected");
        Ok(Self {
            writer: BufWriter::new(stream),
        })
    }

    /// The declared type to publish: raw values may carry a schema name
    /// out-of-band in the metadata JSON.
    fn published_type(value_type: ValueType, metadata: &str) -> String {
        if value_type == ValueType::Raw && !metadata.is_empty() {
            if let Ok(meta) = serde_json::from_str::<serde_json::Value>(metadata) {
                if let Some(tag) = meta.get("type").and_then(|t| t.as_str()) {
                    return tag.to_string();
                }
            }
        }
        value_type.name().to_string()
    }
}

impl Sink for TcpSink {
    fn put(
        &mut self,
        key: &str,
        value_type: ValueType,
        value: &str,
        metadata: &str,
    ) -> io::Result<()> {
        let line = json!({
            "key": key,
            "type": Self::published_type(value_type, metadata),
            "value": value,
            "meta": metadata,
        });
        writeln!(self.writer, "{line}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
