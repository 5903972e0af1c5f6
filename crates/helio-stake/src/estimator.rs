//! Trailing-window stake-weight statistics.
//!
//! The estimator derives the network's stake participation from chain-index
//! reads alone: the kernel trial rate implied by recent proof-of-stake solve
//! times, and a memoized trailing average of that rate which the reward
//! engine layers its formulas on.
//!
//! The memo holds a single `(height, value)` pair owned by the estimator
//! instance; there is deliberately no process-wide cache. It is valid only
//! for the exact height it was computed at, and callers rely on two calls at
//! the same height returning the identical value.

use parking_lot::Mutex;

use helio_chain::active_chain::ActiveChain;
use helio_chain::block_index::{BlockIndex, BlockIndexEntry};
use helio_core::compact;
use helio_core::constants::{
    KERNEL_SAMPLE_WINDOW, KERNEL_TRIALS_PER_DIFFICULTY, STAKE_WEIGHT_OFFSET, STAKE_WEIGHT_WINDOW,
    WEIGHT_SATURATION_FRACTION,
};
use helio_core::params::ConsensusParams;

/// Last computed trailing average, keyed by the height it was computed at.
#[derive(Clone, Copy, Debug)]
struct WeightCache {
    height: u64,
    weight: f64,
}

/// Stake-weight statistics over the recent chain.
#[derive(Debug)]
pub struct StakeWeightEstimator {
    params: ConsensusParams,
    cache: Mutex<Option<WeightCache>>,
}

impl StakeWeightEstimator {
    /// Create an estimator with an empty memo.
    pub fn new(params: ConsensusParams) -> Self {
        Self {
            params,
            cache: Mutex::new(None),
        }
    }

    /// The consensus parameters this estimator was built with.
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Estimated stake kernel trials per second near `tip`.
    ///
    /// Samples up to the [`KERNEL_SAMPLE_WINDOW`] most recent proof-of-stake
    /// entries reachable from `tip` via `prev`, accumulating
    /// `difficulty * 2^32` per entry and the elapsed time between
    /// consecutive sampled entries. Returns 0 when no time accumulated.
    ///
    /// At and above the stake-time fork height a negative elapsed delta
    /// (out-of-order timestamps) is clamped to zero; below it the negative
    /// value is accumulated as-is. The asymmetry reproduces the historical
    /// chain and is consensus-relevant; do not "fix" it.
    pub fn kernel_trial_rate(&self, index: &BlockIndex, tip: &BlockIndexEntry) -> f64 {
        let mut trial_sum = 0.0;
        let mut stakes_handled = 0usize;
        let mut stakes_time: i64 = 0;
        let mut prev_stake: Option<&BlockIndexEntry> = None;

        let mut walk = Some(tip);
        while let Some(entry) = walk {
            if stakes_handled >= KERNEL_SAMPLE_WINDOW {
                break;
            }
            if entry.is_proof_of_stake() {
                trial_sum += compact::difficulty(entry.bits) * KERNEL_TRIALS_PER_DIFFICULTY;
                let delta = prev_stake.map_or(0, |stake| stake.time - entry.time);
                if entry.height >= self.params.stake_time_fork_height {
                    stakes_time += delta.max(0);
                } else {
                    stakes_time += delta;
                }
                prev_stake = Some(entry);
                stakes_handled += 1;
            }
            walk = index.prev_of(entry);
        }

        if stakes_time != 0 {
            trial_sum / stakes_time as f64
        } else {
            0.0
        }
    }

    /// Trailing average of the kernel trial rate over the most recent
    /// [`STAKE_WEIGHT_WINDOW`] ancestors of `prev`, plus a constant offset.
    ///
    /// Returns 0 while the active chain has no block past genesis. The
    /// result is memoized per `prev.height`: a second call at the same
    /// height returns the cached value without recomputation, which callers
    /// depend on for stability within a height.
    pub fn average_stake_weight(
        &self,
        index: &BlockIndex,
        active: &ActiveChain,
        prev: &BlockIndexEntry,
    ) -> f64 {
        match active.height() {
            Some(height) if height >= 1 => {}
            _ => return 0.0,
        }

        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.height == prev.height {
                return cached.weight;
            }
        }

        let mut weight_sum = 0.0;
        let mut sampled = 0usize;
        let mut walk = Some(prev);
        while let Some(entry) = walk {
            if sampled >= STAKE_WEIGHT_WINDOW {
                break;
            }
            weight_sum += self.kernel_trial_rate(index, entry);
            sampled += 1;
            walk = index.prev_of(entry);
        }

        let average = weight_sum / sampled as f64 + STAKE_WEIGHT_OFFSET;
        *cache = Some(WeightCache {
            height: prev.height,
            weight: average,
        });
        average
    }

    /// Stake-time weight factored by current network stake participation.
    ///
    /// `fraction = (coin_day_weight + 1) / average_stake_weight`. Above
    /// [`WEIGHT_SATURATION_FRACTION`] the result saturates to the minimum
    /// stake age plus one; below it the weight follows a cosine-squared
    /// decay that equals `time_weight` at fraction 0 and reaches zero at
    /// fraction 0.5.
    pub fn stake_time_factored_weight(
        &self,
        index: &BlockIndex,
        active: &ActiveChain,
        time_weight: i64,
        coin_day_weight: i64,
        prev: &BlockIndexEntry,
    ) -> i64 {
        let average = self.average_stake_weight(index, active, prev);
        let fraction = (coin_day_weight + 1) as f64 / average;
        if fraction > WEIGHT_SATURATION_FRACTION {
            self.params.stake_min_age + 1
        } else {
            let factor = (std::f64::consts::PI * fraction).cos().powi(2);
            (factor * time_weight as f64) as i64
        }
    }
}
