//! Frame definition and wire codec for the protocol.
//!
//! A frame is the atomic, fixed-length unit of transmission.
//!
//! # Frame format
//!
//! ```text
//! offset 0   : MI         = 0x7E                        (8 bits)
//! offset 1-2 : Header     = [ size:6 | seq:5 | type:5 ]  (16 bits, LE)
//! offset 3-65: Data       = 63 bytes opaque payload
//! offset 66  : Parity     = XOR of bytes 1..65
//! ```
//!
//! The header is bit-packed explicitly with shifts and masks rather than
//! relying on native struct layout, so the wire format is portable.

use crate::config::{FRAME_SIZE, INIT_MARKER, MAX_DATA_SIZE};
use crate::error::{Error, Result};
use crate::operation::Operation;

const SIZE_BITS: u16 = 6;
const SEQ_BITS: u16 = 5;
const TYPE_BITS: u16 = 5;

const SIZE_MASK: u16 = (1 << SIZE_BITS) - 1;
const SEQ_MASK: u16 = (1 << SEQ_BITS) - 1;
const TYPE_MASK: u16 = (1 << TYPE_BITS) - 1;

const SEQ_SHIFT: u16 = SIZE_BITS;
const TYPE_SHIFT: u16 = SIZE_BITS + SEQ_BITS;

/// A decoded frame: the three header subfields plus payload length.
///
/// Frames are ephemeral: built, transmitted, acknowledged or
/// retransmitted, then discarded. This type borrows its payload from
/// the caller-provided buffer to avoid a copy on the decode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Sequence number (0..31).
    pub seq: u8,
    /// Operation / frame-type code (0..31, may be unrecognized).
    pub type_code: u8,
    /// Number of meaningful bytes in `data`.
    pub size: u8,
    /// The meaningful payload bytes (`data.len() == size`).
    pub data: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Builds a frame's header+marker+parity and serializes it into
    /// `buf`, which must be at least [`crate::config::FRAME_SIZE`]
    /// bytes. Returns the number of bytes written (always `FRAME_SIZE`).
    ///
    /// `data.len()` must not exceed [`MAX_DATA_SIZE`]; the remainder of
    /// the 63-byte data region is zero-filled.
    pub fn encode(seq: u8, type_code: u8, data: &[u8], buf: &mut [u8]) -> Result<usize> {
        if data.len() > MAX_DATA_SIZE {
            return Err(Error::PayloadTooLarge);
        }
        if buf.len() < FRAME_SIZE {
            return Err(Error::BufferTooSmall);
        }

        buf[0] = INIT_MARKER;

        let header = (data.len() as u16 & SIZE_MASK)
            | ((seq as u16 & SEQ_MASK) << SEQ_SHIFT)
            | ((type_code as u16 & TYPE_MASK) << TYPE_SHIFT);
        buf[1..3].copy_from_slice(&header.to_le_bytes());

        buf[3..3 + MAX_DATA_SIZE].fill(0);
        buf[3..3 + data.len()].copy_from_slice(data);

        let parity = xor_parity(&buf[1..66]);
        buf[66] = parity;

        Ok(FRAME_SIZE)
    }

    /// Convenience wrapper over [`Frame::encode`] taking an [`Operation`].
    pub fn encode_op(seq: u8, op: Operation, data: &[u8], buf: &mut [u8]) -> Result<usize> {
        Self::encode(seq, op as u8, data, buf)
    }

    /// Decodes a frame from `buf`.
    ///
    /// Rejects (returns `Err`) when `buf` is shorter than `FRAME_SIZE`,
    /// the marker byte is wrong, the declared size exceeds
    /// `MAX_DATA_SIZE`, or the parity byte doesn't match. A reject here
    /// means "silently drop" to the receiver engine, since the frame may
    /// be foreign traffic sharing the raw socket.
    pub fn decode(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < FRAME_SIZE {
            return Err(Error::BufferTooSmall);
        }
        if buf[0] != INIT_MARKER {
            return Err(Error::InvalidFrame);
        }

        let header = u16::from_le_bytes([buf[1], buf[2]]);
        let size = (header & SIZE_MASK) as u8;
        let seq = ((header >> SEQ_SHIFT) & SEQ_MASK) as u8;
        let type_code = ((header >> TYPE_SHIFT) & TYPE_MASK) as u8;

        if size as usize > MAX_DATA_SIZE {
            return Err(Error::PayloadTooLarge);
        }

        let expected_parity = xor_parity(&buf[1..66]);
        if buf[66] != expected_parity {
            return Err(Error::ChecksumMismatch);
        }

        Ok(Self {
            seq,
            type_code,
            size,
            data: &buf[3..3 + size as usize],
        })
    }

    /// Returns the frame's operation code, if recognized.
    pub fn operation(&self) -> Option<Operation> {
        Operation::from_u8(self.type_code)
    }
}

fn xor_parity(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}
