//! Filename carrier for BACKUP / RESTORE / VERIFY handshakes.
//!
//! The filename crosses the wire across as many frames as needed, 63
//! bytes per frame. The encoder always terminates with a frame whose
//! `size < MAX_DATA_SIZE`, including an explicit empty terminator frame
//! when the name's length is an exact multiple of 63, so the
//! receiver's `size < MAX_DATA_SIZE` end-of-name rule is never
//! ambiguous.

use crate::config::{FILENAME_SIZE, MAX_DATA_SIZE};
use crate::error::{Error, Result};

/// Splits a filename into successive `MAX_DATA_SIZE`-byte chunks for
/// transmission.
#[derive(Debug, Clone)]
pub struct FilenameEncoder<'a> {
    name: &'a [u8],
    offset: usize,
    /// Set once the empty terminator frame (if any) has been emitted.
    terminated: bool,
}

impl<'a> FilenameEncoder<'a> {
    /// Creates an encoder for `name`.
    pub fn new(name: &'a [u8]) -> Self {
        Self {
            name,
            offset: 0,
            terminated: false,
        }
    }

    /// Produces the next chunk, if any.
    ///
    /// Returns `None` once the name (and, if needed, the empty
    /// terminator) has been fully emitted.
    pub fn next_chunk(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.name.len() {
            if self.name.len().is_multiple_of(MAX_DATA_SIZE) && !self.terminated {
                self.terminated = true;
                return Some(&self.name[0..0]);
            }
            return None;
        }

        let end = (self.offset + MAX_DATA_SIZE).min(self.name.len());
        let chunk = &self.name[self.offset..end];
        self.offset = end;
        Some(chunk)
    }
}

/// Accumulates filename chunks into a bounded buffer on the receiver
/// side.
#[derive(Debug, Clone)]
pub struct FilenameReceiver {
    buf: [u8; FILENAME_SIZE],
    len: usize,
}

impl FilenameReceiver {
    /// Creates an empty receiver buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0u8; FILENAME_SIZE],
            len: 0,
        }
    }

    /// Appends a chunk of filename bytes.
    pub fn accept(&mut self, chunk: &[u8]) -> Result<()> {
        if self.len + chunk.len() > FILENAME_SIZE {
            return Err(Error::FilenameTooLarge);
        }
        self.buf[self.len..self.len + chunk.len()].copy_from_slice(chunk);
        self.len += chunk.len();
        Ok(())
    }

    /// Returns the accumulated filename bytes, with path components
    /// stripped down to the base name (see [`strip_path`]).
    pub fn finish(&self) -> &[u8] {
        strip_path(&self.buf[..self.len])
    }
}

impl Default for FilenameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Strips any leading path components, returning only the base name.
/// Guards against a peer smuggling `../` segments into the output path.
pub fn strip_path(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b'/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}
