//! Error types for the link-transfer protocol.
//!
//! This module defines all possible errors that can occur while framing,
//! sequencing, or driving a phase of the protocol.

use std::fmt;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Buffer passed to encode/decode is too small.
    BufferTooSmall,

    /// Declared payload size exceeds `MAX_DATA_SIZE`.
    PayloadTooLarge,

    /// Filename exceeds `FILENAME_SIZE`.
    FilenameTooLarge,

    /// Transport I/O error occurred (send or recv failed).
    IoError,

    /// Local file could not be opened before the phase began.
    FileNotFound,

    /// Maximum retransmission attempts exceeded; the phase failed.
    MaxRetriesExceeded,

    /// Peer replied with `ERROR`; the phase is aborted.
    PeerError,

    /// An integrity check failed: a frame's parity byte didn't match
    /// its contents, or a VERIFY/OKCHECKSUM digest didn't match.
    ChecksumMismatch,

    /// Frame carries an operation code this peer does not recognize.
    UnknownOperation,

    /// A frame failed to decode: wrong length or bad marker byte.
    InvalidFrame,
}

impl Error {
    /// Returns a human-readable description of the error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::BufferTooSmall => "buffer too small",
            Error::PayloadTooLarge => "payload exceeds MAX_DATA_SIZE",
            Error::FilenameTooLarge => "filename exceeds FILENAME_SIZE",
            Error::IoError => "transport I/O error",
            Error::FileNotFound => "local file not found",
            Error::MaxRetriesExceeded => "maximum retransmission attempts exceeded",
            Error::PeerError => "peer reported an error",
            Error::ChecksumMismatch => "checksum mismatch",
            Error::UnknownOperation => "unknown operation code",
            Error::InvalidFrame => "invalid frame",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for Error {}
