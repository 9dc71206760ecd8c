//! Operation-type codes (the 5-bit `type` subfield of the frame header).

/// Operation / frame-type code. Values 0..31 are available; the ones
/// below match the layout a faithful reimplementation of the source
/// `message.h` must preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
    /// Data-plane file-chunk carrier.
    Data = 0,
    /// Handshake: push a file to the peer.
    Backup = 1,
    /// Handshake: pull a file from the peer.
    Restore = 2,
    /// Handshake: confirm the peer holds a matching file.
    Verify = 3,
    /// Metadata: 8-byte little-endian file size.
    Size = 4,
    /// Metadata: 16-byte MD5 checksum.
    OkChecksum = 5,
    /// Control: positive acknowledgment.
    Ack = 6,
    /// Control: negative acknowledgment (out-of-sequence).
    Nack = 7,
    /// Control: handshake/metadata success.
    Ok = 8,
    /// Control: semantic failure, aborts the phase.
    Error = 9,
    /// Control: phase termination marker.
    End = 10,
    /// Diagnostic: local file could not be found. Never sent on the
    /// wire, a local precondition failure surfaced before the phase
    /// starts.
    ErrorCantFindFile = 11,
}

impl Operation {
    /// Converts a 5-bit wire value to an `Operation`, if recognized.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Data),
            1 => Some(Self::Backup),
            2 => Some(Self::Restore),
            3 => Some(Self::Verify),
            4 => Some(Self::Size),
            5 => Some(Self::OkChecksum),
            6 => Some(Self::Ack),
            7 => Some(Self::Nack),
            8 => Some(Self::Ok),
            9 => Some(Self::Error),
            10 => Some(Self::End),
            11 => Some(Self::ErrorCantFindFile),
            _ => None,
        }
    }

    /// Returns true for the handshake/filename-carrier operations.
    pub const fn is_filename_carrier(&self) -> bool {
        matches!(self, Self::Backup | Self::Restore | Self::Verify)
    }

    /// Returns true for the zero-length control operations.
    pub const fn is_control(&self) -> bool {
        matches!(
            self,
            Self::Ack | Self::Nack | Self::Ok | Self::Error | Self::End
        )
    }
}
