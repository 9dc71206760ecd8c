//! DATA payload shaper: file-chunk carrier.

use crate::config::MAX_DATA_SIZE;
use std::io::{self, Read, Write};

/// Reads up to [`MAX_DATA_SIZE`] bytes from `file` into `buf`.
///
/// Returns the number of bytes actually read. A short read (fewer than
/// `MAX_DATA_SIZE` bytes) signals end-of-file to the caller, which must
/// treat this as the final DATA frame of the phase.
pub fn encode_chunk(file: &mut impl Read, buf: &mut [u8; MAX_DATA_SIZE]) -> io::Result<usize> {
    let mut total = 0;
    while total < MAX_DATA_SIZE {
        match file.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Appends the meaningful bytes of a DATA frame's payload to the open
/// output file.
pub fn decode_chunk(file: &mut impl Write, data: &[u8]) -> io::Result<()> {
    file.write_all(data)
}
