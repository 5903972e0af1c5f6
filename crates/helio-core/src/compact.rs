//! Compact ("nBits") difficulty target encoding.
//!
//! The compact form packs a 256-bit target into 32 bits: one byte of base-256
//! exponent and a 23-bit mantissa, with bit 24 of the mantissa word acting as
//! a sign bit. Sign and overflow are reported to the caller rather than
//! rejected here: a malformed encoding decodes to a flagged value that the
//! work calculator maps to the zero-work sentinel.

use primitive_types::U256;

/// Decode a compact target. Returns `(target, negative, overflow)`.
///
/// `negative` is set when the mantissa is non-zero and the sign bit is set;
/// `overflow` when the exponent would shift non-zero mantissa bits above
/// 2^256. Callers that need a usable target must check both flags.
pub fn decode_compact(bits: u32) -> (U256, bool, bool) {
    let size = (bits >> 24) as usize;
    let mut word = bits & 0x007f_ffff;

    let target = if size <= 3 {
        word >>= 8 * (3 - size);
        U256::from(word)
    } else {
        U256::from(word) << (8 * (size - 3))
    };

    let negative = word != 0 && (bits & 0x0080_0000) != 0;
    let overflow = word != 0
        && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

    (target, negative, overflow)
}

/// Encode a target into compact form (non-negative encoding).
///
/// Inverse of [`decode_compact`] for targets that fit the 23-bit mantissa;
/// low-order bits beyond the mantissa precision are truncated.
pub fn encode_compact(target: U256) -> u32 {
    let mut size = (target.bits() + 7) / 8;
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3))).low_u64() as u32
    };

    // The mantissa sign bit must stay clear; borrow one exponent step instead.
    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size as u32) << 24
}

/// Floating-point difficulty implied by a compact target, relative to the
/// canonical `0x1d00ffff` limit (difficulty 1.0).
///
/// Used by the kernel trial-rate estimator, which works in doubles. A zero
/// mantissa yields 0.0.
pub fn difficulty(bits: u32) -> f64 {
    let mantissa = bits & 0x00ff_ffff;
    if mantissa == 0 {
        return 0.0;
    }
    let mut shift = (bits >> 24) & 0xff;
    let mut diff = 65535.0 / mantissa as f64;
    while shift < 29 {
        diff *= 256.0;
        shift += 1;
    }
    while shift > 29 {
        diff /= 256.0;
        shift -= 1;
    }
    diff
}
