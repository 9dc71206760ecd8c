//! Sequence arithmetic: a 5-bit modular counter with wraparound.
//!
//! Stop-and-wait only needs a 1-bit sequence number, but the wire format
//! is over-provisioned at 5 bits (modulus 32) to match the source
//! protocol; the duplicate-detection window is therefore exactly 1
//! (`prev(expected)`).

/// The sequence number modulus: 5 bits gives 0..31.
pub const MODULUS: u8 = 32;

/// Advances a sequence number by one, wrapping modulo 32.
pub const fn next(seq: u8) -> u8 {
    (seq + 1) % MODULUS
}

/// Steps a sequence number back by one, wrapping modulo 32.
pub const fn prev(seq: u8) -> u8 {
    (seq + MODULUS - 1) % MODULUS
}

/// Outcome of comparing an observed sequence number against the
/// receiver's expected counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// `observed == expected`: process and advance.
    Expected,

    /// `observed == prev(expected)`: re-acknowledge without reprocessing.
    Duplicate,

    /// Anything else: reply NACK, do not advance.
    OutOfSequence,
}

/// Classifies an observed sequence number `r` against the receiver's
/// expected value `e`. The three cases are mutually exclusive and
/// exhaustive for every `(e, r)` pair in `0..32`.
pub const fn classify(expected: u8, observed: u8) -> Classification {
    if observed == expected {
        Classification::Expected
    } else if observed == prev(expected) {
        Classification::Duplicate
    } else {
        Classification::OutOfSequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_wraps_at_modulus() {
        assert_eq!(next(31), 0);
        assert_eq!(next(0), 1);
    }

    #[test]
    fn prev_wraps_at_zero() {
        assert_eq!(prev(0), 31);
        assert_eq!(prev(5), 4);
    }

    #[test]
    fn next_and_prev_are_inverses() {
        for seq in 0..MODULUS {
            assert_eq!(prev(next(seq)), seq);
        }
    }

    #[test]
    fn classifier_totality_and_exclusivity() {
        for e in 0..MODULUS {
            for r in 0..MODULUS {
                let c = classify(e, r);
                let matches = [
                    c == Classification::Expected,
                    c == Classification::Duplicate,
                    c == Classification::OutOfSequence,
                ];
                assert_eq!(matches.iter().filter(|&&m| m).count(), 1);
            }
        }
    }

    #[test]
    fn classify_expected() {
        assert_eq!(classify(5, 5), Classification::Expected);
    }

    #[test]
    fn classify_duplicate() {
        assert_eq!(classify(5, 4), Classification::Duplicate);
        assert_eq!(classify(0, 31), Classification::Duplicate);
    }

    #[test]
    fn classify_out_of_sequence() {
        assert_eq!(classify(5, 6), Classification::OutOfSequence);
        assert_eq!(classify(5, 20), Classification::OutOfSequence);
    }
}
