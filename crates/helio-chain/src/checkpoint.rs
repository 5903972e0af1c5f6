//! Checkpoint verification against the per-network pin list.
//!
//! Checkpoints pin known-good blocks so that a deep reorganization below
//! the last pinned height is rejected outright, bounding how much history
//! an attacker with majority stake could rewrite. The pin lists live in
//! [`ConsensusParams`]; the `_with` variants take an explicit list and are
//! the testable core.

use helio_core::error::ChainIndexError;
use helio_core::params::ConsensusParams;
use helio_core::types::Hash256;

/// Verify that a block at `height` matches the network's checkpoint, if any.
///
/// Heights without a checkpoint pass unconditionally.
///
/// # Errors
///
/// Returns [`ChainIndexError::CheckpointMismatch`] when the hash differs
/// from the pin at that height.
pub fn check_checkpoint(
    params: &ConsensusParams,
    height: u64,
    hash: &Hash256,
) -> Result<(), ChainIndexError> {
    check_checkpoint_with(params.checkpoints, height, hash)
}

/// Like [`check_checkpoint`] but against an explicit pin list.
pub fn check_checkpoint_with(
    checkpoints: &[(u64, [u8; 32])],
    height: u64,
    hash: &Hash256,
) -> Result<(), ChainIndexError> {
    for &(pin_height, pin_hash) in checkpoints {
        if pin_height == height {
            if hash.0 != pin_hash {
                return Err(ChainIndexError::CheckpointMismatch { height });
            }
            return Ok(());
        }
    }
    Ok(())
}

/// Height of the most recent pin for the network, or 0 with no pins.
pub fn last_checkpoint_height(params: &ConsensusParams) -> u64 {
    last_checkpoint_height_with(params.checkpoints)
}

/// Like [`last_checkpoint_height`] but against an explicit pin list.
pub fn last_checkpoint_height_with(checkpoints: &[(u64, [u8; 32])]) -> u64 {
    checkpoints.iter().map(|(h, _)| *h).max().unwrap_or(0)
}

/// Whether `height` is at or below the last pinned height.
///
/// Reorganizations that would disconnect blocks in this range must be
/// rejected by the caller.
pub fn is_below_checkpoint(params: &ConsensusParams, height: u64) -> bool {
    is_below_checkpoint_with(params.checkpoints, height)
}

/// Like [`is_below_checkpoint`] but against an explicit pin list.
pub fn is_below_checkpoint_with(checkpoints: &[(u64, [u8; 32])], height: u64) -> bool {
    let last = last_checkpoint_height_with(checkpoints);
    last > 0 && height <= last
}
