//! SIZE payload shaper: 8-byte little-endian file size.

use crate::error::{Error, Result};

/// Encodes a file size as an 8-byte little-endian payload.
pub fn encode_size(size: u64) -> [u8; 8] {
    size.to_le_bytes()
}

/// Decodes an 8-byte little-endian file size payload.
pub fn decode_size(data: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = data.try_into().map_err(|_| Error::BufferTooSmall)?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for size in [0u64, 1, 63, 4096, u64::MAX] {
            let encoded = encode_size(size);
            assert_eq!(decode_size(&encoded).unwrap(), size);
        }
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(decode_size(&[0u8; 7]), Err(Error::BufferTooSmall));
    }
}
