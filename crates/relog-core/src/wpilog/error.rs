//! Log format errors

use thiserror::Error;

/// Errors raised while opening a binary log buffer.
///
/// Only the prologue is validated eagerly; malformed records further into
/// the buffer terminate iteration instead of producing an error.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Log buffer too short for prologue: {0} bytes")]
    TruncatedPrologue(usize),

    #[error("Bad magic bytes at start of log")]
    BadMagic,

    #[error("Declared extra header overruns the buffer")]
    TruncatedExtraHeader,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
