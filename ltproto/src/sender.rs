//! Sender engine (driver): drives a stream of logical payload units
//! through stop-and-wait, one frame outstanding at a time.

use crate::config::{Config, MAX_DATA_SIZE};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::operation::Operation;
use crate::sequence;
use crate::transport::Transport;
use std::io;
use std::time::{Duration, Instant};

/// Source of logical payload units for one phase.
///
/// Each call produces the next chunk to place in a frame's `Data`
/// region, and reports whether this is the terminal chunk of the phase
/// (the frame the receiver will recognize as end-of-transfer, per its
/// `size < MAX_DATA_SIZE` rule).
pub trait PayloadSource {
    /// Writes the next chunk into `buf`, returning `(len, is_last)`.
    fn next_chunk(&mut self, buf: &mut [u8; MAX_DATA_SIZE]) -> io::Result<(usize, bool)>;
}

/// What to do with one received response frame.
enum Outcome {
    Advance,
    Retransmit,
    Fail,
    Ignore,
}

fn classify_response(resp: &Frame<'_>, seq: u8) -> Outcome {
    if resp.seq == seq {
        match resp.operation() {
            Some(Operation::Ack) | Some(Operation::Ok) => Outcome::Advance,
            Some(Operation::Nack) => Outcome::Retransmit,
            Some(Operation::Error) => Outcome::Fail,
            _ => Outcome::Ignore,
        }
    } else if resp.seq == sequence::next(seq) {
        // Follower acknowledged one sequence ahead: both sides wrap
        // independently, so treat this as the expected ack and advance.
        Outcome::Advance
    } else {
        Outcome::Ignore
    }
}

/// Drives one phase to completion as the driver role.
///
/// Returns `Ok(true)` if the phase's logical payload was fully
/// delivered and acknowledged, `Ok(false)` if the peer rejected it with
/// `ERROR`. Returns `Err(Error::MaxRetriesExceeded)` if the retry budget
/// is exhausted on some frame without a usable response.
pub fn run_phase<T: Transport, S: PayloadSource>(
    transport: &mut T,
    config: &Config,
    op: Operation,
    source: &mut S,
) -> Result<bool> {
    let mut seq: u8 = 0;
    let mut data_buf = [0u8; MAX_DATA_SIZE];
    let mut frame_buf = [0u8; crate::config::FRAME_SIZE];
    let mut resp_buf = [0u8; crate::config::FRAME_SIZE];
    let mut bytes_in_flight: Option<usize> = None;
    let mut eof = false;
    let mut retries: u8 = 0;

    'send_frame: loop {
        if bytes_in_flight.is_none() {
            let (len, is_last) = source
                .next_chunk(&mut data_buf)
                .map_err(|_| Error::IoError)?;
            Frame::encode_op(seq, op, &data_buf[..len], &mut frame_buf)?;
            bytes_in_flight = Some(len);
            if is_last {
                eof = true;
            }
        }

        transport
            .send(&frame_buf[..crate::config::FRAME_SIZE])
            .map_err(|_| Error::IoError)?;

        let deadline = Instant::now() + Duration::from_millis(config.timeout_millis);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                retries += 1;
                log::warn!("timeout waiting for ack of seq {seq}, retry {retries}");
                if retries > config.retry_budget {
                    return Err(Error::MaxRetriesExceeded);
                }
                continue 'send_frame;
            }

            match transport
                .recv_timeout(&mut resp_buf, remaining)
                .map_err(|_| Error::IoError)?
            {
                None => {
                    retries += 1;
                    log::warn!("timeout waiting for ack of seq {seq}, retry {retries}");
                    if retries > config.retry_budget {
                        return Err(Error::MaxRetriesExceeded);
                    }
                    continue 'send_frame;
                }
                Some(n) => {
                    let resp = match Frame::decode(&resp_buf[..n]) {
                        Ok(resp) => resp,
                        Err(_) => continue, // foreign/corrupt traffic, keep waiting
                    };

                    match classify_response(&resp, seq) {
                        Outcome::Advance => {
                            seq = sequence::next(seq);
                            bytes_in_flight = None;
                            retries = 0;
                            if eof {
                                return Ok(true);
                            }
                            continue 'send_frame;
                        }
                        Outcome::Retransmit => {
                            retries += 1;
                            log::debug!("NACK for seq {seq}, retry {retries}");
                            if retries > config.retry_budget {
                                return Err(Error::MaxRetriesExceeded);
                            }
                            continue 'send_frame;
                        }
                        Outcome::Fail => {
                            log::error!("peer returned ERROR for seq {seq}");
                            return Ok(false);
                        }
                        Outcome::Ignore => continue,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// A scripted transport: `send` is recorded, `recv_timeout` plays
    /// back a pre-programmed script of responses (or `None` for a
    /// simulated timeout) one call at a time.
    #[derive(Default)]
    struct ScriptedTransport {
        sent: Vec<Vec<u8>>,
        script: VecDeque<Option<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn with_script(script: Vec<Option<Vec<u8>>>) -> Self {
            Self {
                sent: Vec::new(),
                script: script.into(),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, buf: &[u8]) -> Result<()> {
            self.sent.push(buf.to_vec());
            Ok(())
        }

        fn recv_timeout(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<Option<usize>> {
            match self.script.pop_front() {
                Some(Some(frame)) => {
                    let n = frame.len().min(buf.len());
                    buf[..n].copy_from_slice(&frame[..n]);
                    Ok(Some(n))
                }
                Some(None) | None => Ok(None),
            }
        }
    }

    struct OneShotSource {
        chunk: Vec<u8>,
        emitted: bool,
    }

    impl PayloadSource for OneShotSource {
        fn next_chunk(&mut self, buf: &mut [u8; MAX_DATA_SIZE]) -> io::Result<(usize, bool)> {
            assert!(!self.emitted, "source exhausted but polled again");
            self.emitted = true;
            buf[..self.chunk.len()].copy_from_slice(&self.chunk);
            Ok((self.chunk.len(), true))
        }
    }

    fn ack_frame(seq: u8) -> Vec<u8> {
        let mut buf = [0u8; crate::config::FRAME_SIZE];
        Frame::encode_op(seq, Operation::Ack, &[], &mut buf).unwrap();
        buf.to_vec()
    }

    fn config() -> Config {
        Config::new().with_timeout_millis(5)
    }

    #[test]
    fn s2_timeout_then_success_retransmits_and_completes() {
        let mut transport = ScriptedTransport::with_script(vec![None, Some(ack_frame(0))]);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let ok = run_phase(&mut transport, &config(), Operation::Data, &mut source).unwrap();
        assert!(ok);
        assert_eq!(transport.sent.len(), 2, "one retransmit after the timeout");
        assert_eq!(transport.sent[0], transport.sent[1]);
    }

    #[test]
    fn s4_retry_exhaustion_fails_the_phase() {
        let script = std::iter::repeat_n(None, 10).collect();
        let mut transport = ScriptedTransport::with_script(script);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let result = run_phase(&mut transport, &config(), Operation::Data, &mut source);
        assert_eq!(result, Err(Error::MaxRetriesExceeded));
        // 1 initial send + 5 retries = 6 transmissions, never more.
        assert_eq!(transport.sent.len(), 6);
    }

    #[test]
    fn nack_triggers_bounded_retransmission() {
        let mut nack_buf = [0u8; crate::config::FRAME_SIZE];
        Frame::encode_op(0, Operation::Nack, &[], &mut nack_buf).unwrap();
        let mut transport = ScriptedTransport::with_script(vec![
            Some(nack_buf.to_vec()),
            Some(ack_frame(0)),
        ]);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let ok = run_phase(&mut transport, &config(), Operation::Data, &mut source).unwrap();
        assert!(ok);
        assert_eq!(transport.sent.len(), 2);
    }

    #[test]
    fn error_response_fails_the_phase_immediately() {
        let mut err_buf = [0u8; crate::config::FRAME_SIZE];
        Frame::encode_op(0, Operation::Error, &[], &mut err_buf).unwrap();
        let mut transport = ScriptedTransport::with_script(vec![Some(err_buf.to_vec())]);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let ok = run_phase(&mut transport, &config(), Operation::Data, &mut source).unwrap();
        assert!(!ok);
        assert_eq!(transport.sent.len(), 1, "no retry after a hard ERROR");
    }

    #[test]
    fn ack_one_sequence_ahead_is_treated_as_duplicate_ack() {
        // Both endpoints wrap independently; an ack for seq+1 is still
        // accepted as advancing this frame.
        let mut transport = ScriptedTransport::with_script(vec![Some(ack_frame(1))]);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let ok = run_phase(&mut transport, &config(), Operation::Data, &mut source).unwrap();
        assert!(ok);
    }

    #[test]
    fn unrelated_response_is_ignored_until_deadline() {
        let mut transport =
            ScriptedTransport::with_script(vec![Some(ack_frame(9)), Some(ack_frame(0))]);
        let mut source = OneShotSource {
            chunk: b"hi".to_vec(),
            emitted: false,
        };
        let ok = run_phase(&mut transport, &config(), Operation::Data, &mut source).unwrap();
        assert!(ok);
        assert_eq!(transport.sent.len(), 1, "no retransmit while still within the deadline");
    }
}
