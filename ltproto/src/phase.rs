//! Phase orchestration: sequences the handshake, data-transfer and END
//! phases that make up one BACKUP / RESTORE / VERIFY session, and
//! assigns the driver/follower role each side plays in each phase.
//!
//! BACKUP and VERIFY run the driver as sender throughout; RESTORE flips
//! the data-transfer phase so the driver receives while the follower
//! sends, since the roles a peer plays at the frame level are per-phase,
//! not per-session.

use crate::config::{Config, MAX_DATA_SIZE};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::payload::{
    decode_chunk, encode_chunk, encode_checksum, encode_size, verify_checksum, FilenameEncoder,
    FilenameReceiver,
};
use crate::receiver;
use crate::sender::{self, PayloadSource};
use crate::transport::Transport;
use std::io::{Read, Write};

struct FilenameSource<'a> {
    inner: FilenameEncoder<'a>,
}

impl<'a> PayloadSource for FilenameSource<'a> {
    fn next_chunk(&mut self, buf: &mut [u8; MAX_DATA_SIZE]) -> std::io::Result<(usize, bool)> {
        match self.inner.next_chunk() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok((chunk.len(), chunk.len() < MAX_DATA_SIZE))
            }
            None => Ok((0, true)),
        }
    }
}

struct FileSource<'a, R: Read> {
    file: &'a mut R,
}

impl<'a, R: Read> PayloadSource for FileSource<'a, R> {
    fn next_chunk(&mut self, buf: &mut [u8; MAX_DATA_SIZE]) -> std::io::Result<(usize, bool)> {
        let n = encode_chunk(self.file, buf)?;
        Ok((n, n < MAX_DATA_SIZE))
    }
}

/// A payload source that emits exactly one chunk, then an empty
/// terminator if the chunk itself wasn't already short.
struct OneShotSource {
    chunk: Vec<u8>,
    emitted: bool,
}

impl OneShotSource {
    fn new(chunk: Vec<u8>) -> Self {
        Self {
            chunk,
            emitted: false,
        }
    }
}

impl PayloadSource for OneShotSource {
    fn next_chunk(&mut self, buf: &mut [u8; MAX_DATA_SIZE]) -> std::io::Result<(usize, bool)> {
        assert!(!self.emitted, "one-shot source polled past its single chunk");
        self.emitted = true;
        buf[..self.chunk.len()].copy_from_slice(&self.chunk);
        Ok((self.chunk.len(), true))
    }
}

/// Runs the driver side of a BACKUP: sends the filename, then the file
/// contents, then closes with an END phase.
pub fn run_backup_driver<T: Transport>(
    transport: &mut T,
    config: &Config,
    filename: &[u8],
    file: &mut impl Read,
) -> Result<bool> {
    let mut name_source = FilenameSource {
        inner: FilenameEncoder::new(filename),
    };
    if !sender::run_phase(transport, config, Operation::Backup, &mut name_source)? {
        return Ok(false);
    }

    let mut data_source = FileSource { file };
    if !sender::run_phase(transport, config, Operation::Data, &mut data_source)? {
        return Ok(false);
    }

    let mut end_source = OneShotSource::new(Vec::new());
    sender::run_phase(transport, config, Operation::End, &mut end_source)
}

/// Runs the follower side of a BACKUP: receives the filename, then the
/// file contents into `sink`, then the closing END.
pub fn run_backup_follower<T: Transport>(
    transport: &mut T,
    config: &Config,
    sink: &mut impl Write,
) -> Result<Vec<u8>> {
    let mut name_receiver = FilenameReceiver::new();
    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Backup {
            return Ok(false);
        }
        name_receiver.accept(data).map(|_| true)
    })?;
    let filename = name_receiver.finish().to_vec();

    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Data {
            return Ok(false);
        }
        decode_chunk(sink, data).map(|_| true).map_err(|_| Error::IoError)
    })?;

    receiver::run_phase(transport, config, &mut |op: Operation, _data: &[u8]| {
        Ok(op == Operation::End)
    })?;

    Ok(filename)
}

/// Runs the driver side of a RESTORE: sends the filename, then receives
/// the file contents into `sink` (the data-transfer roles flip relative
/// to BACKUP), then closes with an END phase.
pub fn run_restore_driver<T: Transport>(
    transport: &mut T,
    config: &Config,
    filename: &[u8],
    sink: &mut impl Write,
) -> Result<bool> {
    let mut name_source = FilenameSource {
        inner: FilenameEncoder::new(filename),
    };
    if !sender::run_phase(transport, config, Operation::Restore, &mut name_source)? {
        return Ok(false);
    }

    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Data {
            return Ok(false);
        }
        decode_chunk(sink, data).map(|_| true).map_err(|_| Error::IoError)
    })?;

    let mut end_source = OneShotSource::new(Vec::new());
    sender::run_phase(transport, config, Operation::End, &mut end_source)
}

/// Runs the follower side of a RESTORE: receives the filename, then
/// sends `file`'s contents back to the driver, then the closing END.
pub fn run_restore_follower<T: Transport>(
    transport: &mut T,
    config: &Config,
    file: &mut impl Read,
) -> Result<Vec<u8>> {
    let mut name_receiver = FilenameReceiver::new();
    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Restore {
            return Ok(false);
        }
        name_receiver.accept(data).map(|_| true)
    })?;
    let filename = name_receiver.finish().to_vec();

    let mut data_source = FileSource { file };
    sender::run_phase(transport, config, Operation::Data, &mut data_source)?;

    receiver::run_phase(transport, config, &mut |op: Operation, _data: &[u8]| {
        Ok(op == Operation::End)
    })?;

    Ok(filename)
}

/// Runs the driver side of a VERIFY: sends the filename, then its local
/// MD5 checksum, and reports whether the follower confirmed a match.
pub fn run_verify_driver<T: Transport>(
    transport: &mut T,
    config: &Config,
    filename: &[u8],
    file: &mut impl Read,
) -> Result<bool> {
    let mut name_source = FilenameSource {
        inner: FilenameEncoder::new(filename),
    };
    if !sender::run_phase(transport, config, Operation::Verify, &mut name_source)? {
        return Ok(false);
    }

    let digest = encode_checksum(file).map_err(|_| Error::IoError)?;
    let mut checksum_source = OneShotSource::new(digest.to_vec());
    let matched = sender::run_phase(transport, config, Operation::OkChecksum, &mut checksum_source)?;
    if !matched {
        // The follower treats a checksum mismatch as a hard error and
        // ends its side of the session there; don't chase it with an
        // END phase it's no longer listening for.
        return Ok(false);
    }

    let mut end_source = OneShotSource::new(Vec::new());
    sender::run_phase(transport, config, Operation::End, &mut end_source)?;
    Ok(matched)
}

/// Runs the follower side of a VERIFY: receives the filename, then
/// compares the driver's checksum against `local`'s contents.
pub fn run_verify_follower<T: Transport>(
    transport: &mut T,
    config: &Config,
    local: &mut impl Read,
) -> Result<Vec<u8>> {
    let mut name_receiver = FilenameReceiver::new();
    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Verify {
            return Ok(false);
        }
        name_receiver.accept(data).map(|_| true)
    })?;
    let filename = name_receiver.finish().to_vec();

    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::OkChecksum {
            return Ok(false);
        }
        verify_checksum(data, local)
    })?;

    receiver::run_phase(transport, config, &mut |op: Operation, _data: &[u8]| {
        Ok(op == Operation::End)
    })?;

    Ok(filename)
}

/// Runs the driver side of a SIZE precondition check: declares the
/// local file's size to the follower ahead of a BACKUP, and reports
/// whether the follower accepted it (e.g. had enough free space).
pub fn run_size_driver<T: Transport>(transport: &mut T, config: &Config, size: u64) -> Result<bool> {
    let mut source = OneShotSource::new(encode_size(size).to_vec());
    sender::run_phase(transport, config, Operation::Size, &mut source)
}

/// Runs the follower side of a SIZE exchange: decodes the driver's
/// declared size and hands it to `check`, which decides OK or ERROR.
pub fn run_size_follower<T: Transport>(
    transport: &mut T,
    config: &Config,
    check: &mut impl FnMut(u64) -> bool,
) -> Result<()> {
    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if op != Operation::Size {
            return Ok(false);
        }
        let size = crate::payload::decode_size(data)?;
        Ok(check(size))
    })
}

/// What a follower session turned out to be, once the handshake phase
/// revealed the driver's requested operation.
pub enum SessionOutcome {
    /// The driver pushed a file; holds the name it was saved under.
    Backup(Vec<u8>),
    /// The driver pulled a file; holds the name it asked for.
    Restore(Vec<u8>),
    /// The driver asked for a checksum comparison; holds the name and
    /// whether the local copy matched.
    Verify(Vec<u8>, bool),
}

/// Runs one full follower session without knowing in advance which of
/// BACKUP / RESTORE / VERIFY the driver will request: the handshake
/// phase's operation code decides, exactly as the receiver engine
/// dispatches frame-by-frame in the original implementation.
pub fn run_follower_session<T: Transport>(
    transport: &mut T,
    config: &Config,
    open_for_write: impl FnOnce(&[u8]) -> std::io::Result<std::fs::File>,
    open_for_read: impl FnOnce(&[u8]) -> std::io::Result<std::fs::File>,
) -> Result<SessionOutcome> {
    let mut name_receiver = FilenameReceiver::new();
    let mut discovered: Option<Operation> = None;
    receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
        if !op.is_filename_carrier() {
            return Ok(false);
        }
        discovered = Some(op);
        name_receiver.accept(data).map(|_| true)
    })?;
    let filename = name_receiver.finish().to_vec();
    let op = discovered.ok_or(Error::UnknownOperation)?;

    let outcome = match op {
        Operation::Backup => {
            let mut file = open_for_write(&filename).map_err(|_| Error::FileNotFound)?;
            receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
                if op != Operation::Data {
                    return Ok(false);
                }
                decode_chunk(&mut file, data).map(|_| true).map_err(|_| Error::IoError)
            })?;
            SessionOutcome::Backup(filename)
        }
        Operation::Restore => {
            let mut file = open_for_read(&filename).map_err(|_| Error::FileNotFound)?;
            let mut data_source = FileSource { file: &mut file };
            sender::run_phase(transport, config, Operation::Data, &mut data_source)?;
            SessionOutcome::Restore(filename)
        }
        Operation::Verify => {
            let mut file = open_for_read(&filename).map_err(|_| Error::FileNotFound)?;
            let mut matched = false;
            receiver::run_phase(transport, config, &mut |op: Operation, data: &[u8]| {
                if op != Operation::OkChecksum {
                    return Ok(false);
                }
                matched = verify_checksum(data, &mut file)?;
                Ok(matched)
            })?;
            SessionOutcome::Verify(filename, matched)
        }
        _ => return Err(Error::UnknownOperation),
    };

    receiver::run_phase(transport, config, &mut |op: Operation, _data: &[u8]| {
        Ok(op == Operation::End)
    })?;

    Ok(outcome)
}
