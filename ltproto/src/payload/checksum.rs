//! OKCHECKSUM payload shaper: 16-byte MD5 carrier.

use crate::error::{Error, Result};
use md5::{Digest, Md5};
use std::io::{self, Read};

/// Computes the MD5 digest of `file`'s full contents as a 16-byte
/// payload.
pub fn encode_checksum(file: &mut impl Read) -> io::Result<[u8; 16]> {
    let mut hasher = Md5::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().into())
}

/// Compares a peer-supplied 16-byte MD5 payload against the locally
/// computed digest of the just-received file.
pub fn verify_checksum(data: &[u8], local: &mut impl Read) -> Result<bool> {
    let peer: [u8; 16] = data.try_into().map_err(|_| Error::BufferTooSmall)?;
    let local_digest = encode_checksum(local).map_err(|_| Error::BufferTooSmall)?;
    Ok(peer == local_digest)
}
