//! Chain-work arithmetic: proof values and work-to-time equivalence.
//!
//! Work is the expected number of hash attempts to meet a target, integrated
//! over a chain to pick the best of competing tips. The equivalence helper
//! converts a work difference into seconds at the current tip's difficulty,
//! which drives chain-selection and alerting heuristics.

use primitive_types::U256;

use helio_core::compact::decode_compact;
use helio_core::params::ConsensusParams;

use crate::block_index::BlockIndexEntry;

/// Expected work for one block at the given compact target.
///
/// Negative, overflowing, or zero targets yield zero work, the caller-facing
/// sentinel for a malformed encoding. Otherwise this is
/// `floor(2^256 / (target + 1))`, computed as `(!target / (target + 1)) + 1`
/// since `2^256` itself does not fit in 256 bits.
pub fn block_proof(bits: u32) -> U256 {
    let (target, negative, overflow) = decode_compact(bits);
    if negative || overflow || target.is_zero() {
        return U256::zero();
    }
    (!target / (target + U256::one())) + U256::one()
}

/// Seconds of work at the tip's difficulty separating `to` from `from`.
///
/// Positive when `to` has more cumulative work, negative otherwise. A
/// magnitude that does not fit in 63 bits saturates to `i64::MAX` with the
/// sign applied rather than wrapping; a zero-work tip saturates the same way
/// instead of dividing by zero.
pub fn block_proof_equivalent_time(
    to: &BlockIndexEntry,
    from: &BlockIndexEntry,
    tip: &BlockIndexEntry,
    params: &ConsensusParams,
) -> i64 {
    let (delta, sign) = if to.chain_work > from.chain_work {
        (to.chain_work - from.chain_work, 1i64)
    } else {
        (from.chain_work - to.chain_work, -1i64)
    };

    let tip_proof = block_proof(tip.bits);
    if tip_proof.is_zero() {
        return sign * i64::MAX;
    }

    let spacing = U256::from(params.target_spacing as u64);
    let scaled = match delta.checked_mul(spacing) {
        Some(product) => product / tip_proof,
        None => return sign * i64::MAX,
    };
    if scaled.bits() > 63 {
        return sign * i64::MAX;
    }
    sign * scaled.low_u64() as i64
}
