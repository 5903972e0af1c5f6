//! Monetary policy: inflation, interest, coin supply, and the stake reward.
//!
//! Pure functions of already-validated ancestor chain state plus consensus
//! parameters, layered on the stake-weight estimator. Block-subsidy
//! validation calls these to decide whether a proposed coinstake pays the
//! right amount.
//!
//! Two branches preserve documented historical defects (the stale-supply
//! interest formula and the overflowed supply snapshot correction). They are
//! consensus-relevant for any chain sharing history with the original
//! network; see DESIGN.md before touching them.

use helio_chain::active_chain::ActiveChain;
use helio_chain::block_index::{BlockIndex, BlockIndexEntry};
use helio_core::constants::{
    CENT, COIN, INTEREST_RATE_CAP_PCT, REWARD_SCALE_DENOMINATOR, REWARD_SCALE_NUMERATOR,
};
use helio_core::params::ConsensusParams;

use crate::estimator::StakeWeightEstimator;

/// The reward engine: interest, supply, and subsidy calculations.
///
/// Holds the stake-weight estimator (and with it the single memoized
/// average) plus an injectable clock for the block-rate diagnostic. Shares
/// the single-writer discipline of the chain index: construct one engine per
/// chain state and guard it with the same lock as the active tip.
pub struct RewardEngine {
    params: ConsensusParams,
    estimator: StakeWeightEstimator,
    clock: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl std::fmt::Debug for RewardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardEngine").finish_non_exhaustive()
    }
}

impl RewardEngine {
    /// Create an engine using the system clock.
    pub fn new(params: ConsensusParams) -> Self {
        Self::with_clock(params, || {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64
        })
    }

    /// Create an engine with a custom clock for testing.
    pub fn with_clock(
        params: ConsensusParams,
        clock: impl Fn() -> i64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            estimator: StakeWeightEstimator::new(params.clone()),
            params,
            clock: Box::new(clock),
        }
    }

    /// The underlying stake-weight estimator.
    pub fn estimator(&self) -> &StakeWeightEstimator {
        &self.estimator
    }

    /// Current inflation rate in percent, derived from the average stake
    /// weight: `17 * ln(weight / 20) / 100`.
    ///
    /// Goes negative below a weight of 20 and non-finite at 0; both are
    /// passed through unclamped, and callers must tolerate them.
    pub fn inflation_rate(&self, average_weight: f64) -> f64 {
        17.0 * (average_weight / 20.0).ln() / 100.0
    }

    /// Current interest rate in percent.
    ///
    /// Pinned to the fixed rate once `prev` is past the fixed-interest
    /// height. The branch below the threshold targets the stake-dependent
    /// inflation rate; it multiplies by the raw coin supply where the
    /// corrected formula would use `supply * COIN`. That defect is
    /// permanently dead on the live network past the threshold and is kept
    /// as-is for historical validation. Capped at 10.0.
    pub fn interest_rate(
        &self,
        index: &BlockIndex,
        active: &ActiveChain,
        prev: &BlockIndexEntry,
    ) -> f64 {
        if prev.height > self.params.fixed_interest_height {
            return self.params.fixed_interest_rate_pct;
        }

        let average_weight = self.estimator.average_stake_weight(index, active, prev);
        let inflation = self.inflation_rate(average_weight) / 100.0;
        let mut rate = inflation * self.coin_supply(prev) as f64 / average_weight * 100.0;
        if rate > INTEREST_RATE_CAP_PCT {
            rate = INTEREST_RATE_CAP_PCT;
        }
        rate
    }

    /// Current coin supply in whole coins, derived from `prev`'s snapshot.
    ///
    /// Three height ranges:
    /// - past the stake-time fork, the stored snapshot (which overflowed a
    ///   signed 64-bit field on the historical chain) is corrected by
    ///   subtracting the fixed offset (wrapping arithmetic, reproduced
    ///   bit-for-bit) plus the expected grant growth since the threshold;
    /// - between the fixed-interest height and the fork, a flat initial
    ///   supply;
    /// - below the fixed-interest height, initial supply plus per-block
    ///   growth since the last proof-of-work block.
    pub fn coin_supply(&self, prev: &BlockIndexEntry) -> i64 {
        let params = &self.params;
        if prev.height > params.fixed_interest_height {
            if prev.height >= params.stake_time_fork_height {
                let corrected =
                    prev.money_supply.wrapping_sub(params.supply_overflow_offset) / COIN;
                let growth = (prev.height - params.fixed_interest_height) as f64
                    * params.coin_supply_growth_rate;
                corrected + growth as i64
            } else {
                params.initial_coin_supply
            }
        } else {
            let blocks_past_pow = prev.height as i64 - params.last_pow_height as i64;
            (params.initial_coin_supply as f64
                + blocks_past_pow as f64 * params.coin_supply_growth_rate) as i64
        }
    }

    /// Number of active-chain blocks in the trailing hour.
    ///
    /// Walks back from the tip while timestamps stay inside the window.
    /// A rate below half the target spacing is logged as a warning, not an
    /// error; stalls here feed alerting, never validation.
    pub fn block_rate_per_hour(&self, index: &BlockIndex, active: &ActiveChain) -> u32 {
        let mut rate = 0u32;
        let target_time = (self.clock)() - 3600;

        let mut walk = active.tip(index);
        while let Some(entry) = walk {
            if entry.prev.is_none() || entry.time <= target_time {
                break;
            }
            rate += 1;
            walk = index.prev_of(entry);
        }

        if (rate as i64) < self.params.target_spacing / 2 {
            tracing::warn!(
                rate,
                target_spacing = self.params.target_spacing,
                "block rate is less than half of the target spacing"
            );
        }
        rate
    }

    /// Coinstake reward for `stake_time` factored seconds at the current
    /// interest rate, plus fees.
    ///
    /// `stake_time * (rate * CENT) * 33 / (365*33 + 8)`. The scale turns a
    /// percent-per-year rate into per-second interest over a tropical year.
    pub fn proof_of_stake_time_reward(
        &self,
        index: &BlockIndex,
        active: &ActiveChain,
        prev: &BlockIndexEntry,
        stake_time: i64,
        fees: i64,
    ) -> i64 {
        let interest_rate = (self.interest_rate(index, active, prev) * CENT as f64) as i64;
        let subsidy =
            stake_time * interest_rate * REWARD_SCALE_NUMERATOR / REWARD_SCALE_DENOMINATOR;
        tracing::debug!(subsidy, stake_time, "computed proof-of-stake time reward");
        subsidy + fees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_chain::block_index::BlockMetadata;
    use helio_core::params::Network;
    use helio_core::types::{BlockKind, Hash256};
    use proptest::prelude::*;

    const UNIT_BITS: u32 = 0x1d00ffff;

    fn h(n: u64) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        bytes[31] = 0x42;
        Hash256(bytes)
    }

    fn test_params() -> ConsensusParams {
        ConsensusParams {
            last_pow_height: 10,
            fixed_interest_height: 20,
            stake_time_fork_height: 40,
            ..ConsensusParams::for_network(Network::Regtest)
        }
    }

    fn insert_block(
        index: &mut BlockIndex,
        n: u64,
        prev: Option<u64>,
        time: i64,
        kind: BlockKind,
        money_supply: i64,
    ) {
        index
            .insert(BlockMetadata {
                hash: h(n),
                prev: prev.map(h),
                bits: UNIT_BITS,
                time,
                kind,
                money_supply,
            })
            .unwrap();
    }

    /// Linear chain of `len` blocks at 60-second spacing starting at
    /// `start_time`; PoW up to the test last-PoW height, PoS after.
    fn chain_of(len: u64, start_time: i64) -> (BlockIndex, ActiveChain) {
        let mut index = BlockIndex::new();
        for i in 0..len {
            let prev = if i == 0 { None } else { Some(i) };
            let kind = if i <= 10 {
                BlockKind::ProofOfWork
            } else {
                BlockKind::ProofOfStake
            };
            insert_block(&mut index, i + 1, prev, start_time + i as i64 * 60, kind, 0);
        }
        let mut active = ActiveChain::new();
        let tip = index.get(&h(len)).cloned().unwrap();
        active.set_tip(&index, Some(&tip));
        (index, active)
    }

    fn entry_at(index: &BlockIndex, active: &ActiveChain, height: u64) -> BlockIndexEntry {
        active.get(index, height).unwrap().clone()
    }

    // ------------------------------------------------------------------
    // inflation_rate
    // ------------------------------------------------------------------

    #[test]
    fn inflation_zero_at_weight_twenty() {
        let engine = RewardEngine::with_clock(test_params(), || 0);
        assert_eq!(engine.inflation_rate(20.0), 0.0);
    }

    #[test]
    fn inflation_positive_above_twenty() {
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let rate = engine.inflation_rate(40.0);
        // 17 * ln(2) / 100 ≈ 0.1178
        assert!((rate - 0.117_837).abs() < 1e-5);
    }

    #[test]
    fn inflation_out_of_domain_passes_through() {
        let engine = RewardEngine::with_clock(test_params(), || 0);
        assert!(engine.inflation_rate(10.0) < 0.0);
        assert_eq!(engine.inflation_rate(0.0), f64::NEG_INFINITY);
    }

    // ------------------------------------------------------------------
    // interest_rate
    // ------------------------------------------------------------------

    #[test]
    fn interest_fixed_above_threshold() {
        let (index, active) = chain_of(30, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        // prev at height 25 > fixed_interest_height (20).
        let prev = entry_at(&index, &active, 25);
        assert_eq!(engine.interest_rate(&index, &active, &prev), 2.0);
    }

    #[test]
    fn interest_capped_below_threshold() {
        let (index, active) = chain_of(15, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        // prev at height 14 is below the threshold; the historical formula
        // multiplies by the full coin supply and blows far past the cap.
        let prev = entry_at(&index, &active, 14);
        let rate = engine.interest_rate(&index, &active, &prev);
        assert_eq!(rate, INTEREST_RATE_CAP_PCT);
    }

    #[test]
    fn interest_never_exceeds_cap() {
        let (index, active) = chain_of(30, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        for height in [5u64, 14, 19, 20, 21, 25, 29] {
            let prev = entry_at(&index, &active, height);
            let rate = engine.interest_rate(&index, &active, &prev);
            assert!(rate <= INTEREST_RATE_CAP_PCT, "height {height}: {rate}");
        }
    }

    // ------------------------------------------------------------------
    // coin_supply
    // ------------------------------------------------------------------

    #[test]
    fn supply_below_threshold_grows_from_last_pow() {
        let (index, active) = chain_of(15, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let params = test_params();

        let prev = entry_at(&index, &active, 14);
        let expected = (params.initial_coin_supply as f64
            + (14.0 - params.last_pow_height as f64) * params.coin_supply_growth_rate)
            as i64;
        assert_eq!(engine.coin_supply(&prev), expected);
    }

    #[test]
    fn supply_flat_between_threshold_and_fork() {
        let (index, active) = chain_of(31, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let prev = entry_at(&index, &active, 30);
        assert_eq!(engine.coin_supply(&prev), test_params().initial_coin_supply);
    }

    #[test]
    fn supply_overflow_correction_bit_for_bit() {
        let params = test_params();
        // Simulate the historical snapshot: the true supply in helios
        // exceeds i64::MAX and was stored wrapped.
        let true_supply_coins: i128 = 98_000_000_100;
        let stored = (true_supply_coins * COIN as i128) as i64;
        assert!(stored < 0, "snapshot must simulate the overflow");

        let mut index = BlockIndex::new();
        insert_block(&mut index, 1, None, 1_000, BlockKind::ProofOfWork, 0);
        let mut prev_n = 1u64;
        // Extend to height 50, past the test fork height of 40.
        for i in 1..=50u64 {
            insert_block(
                &mut index,
                i + 1,
                Some(prev_n),
                1_000 + i as i64 * 60,
                BlockKind::ProofOfStake,
                stored,
            );
            prev_n = i + 1;
        }
        let prev = index.get(&h(51)).unwrap();
        assert_eq!(prev.height, 50);

        let engine = RewardEngine::with_clock(params.clone(), || 0);
        // (true - 98e9) coins survive the wrapped subtraction exactly.
        let corrected = (true_supply_coins - 98_000_000_000) as i64;
        let growth =
            ((50 - params.fixed_interest_height) as f64 * params.coin_supply_growth_rate) as i64;
        assert_eq!(engine.coin_supply(prev), corrected + growth);
    }

    #[test]
    fn supply_before_any_stake_blocks() {
        // prev.height below last_pow_height: growth term goes negative.
        let (index, active) = chain_of(6, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let params = test_params();
        let prev = entry_at(&index, &active, 5);
        let expected = (params.initial_coin_supply as f64
            + (5.0 - 10.0) * params.coin_supply_growth_rate) as i64;
        assert_eq!(engine.coin_supply(&prev), expected);
        assert!(engine.coin_supply(&prev) < params.initial_coin_supply);
    }

    // ------------------------------------------------------------------
    // block_rate_per_hour
    // ------------------------------------------------------------------

    #[test]
    fn block_rate_counts_trailing_hour() {
        // 61 blocks at 60-second spacing; the clock sits exactly one hour
        // past the first block's timestamp.
        let start = 1_500_000_000i64;
        let (index, active) = chain_of(61, start);
        let engine = RewardEngine::with_clock(test_params(), move || start + 3600);
        let rate = engine.block_rate_per_hour(&index, &active);
        assert_eq!(rate, 60);
    }

    #[test]
    fn block_rate_zero_on_stale_chain() {
        let start = 1_500_000_000i64;
        let (index, active) = chain_of(10, start);
        // Clock far in the future: every block is outside the window.
        let engine = RewardEngine::with_clock(test_params(), move || start + 1_000_000);
        assert_eq!(engine.block_rate_per_hour(&index, &active), 0);
    }

    #[test]
    fn block_rate_empty_chain() {
        let index = BlockIndex::new();
        let active = ActiveChain::new();
        let engine = RewardEngine::with_clock(test_params(), || 1_500_000_000);
        assert_eq!(engine.block_rate_per_hour(&index, &active), 0);
    }

    // ------------------------------------------------------------------
    // proof_of_stake_time_reward
    // ------------------------------------------------------------------

    #[test]
    fn stake_reward_at_fixed_rate() {
        let (index, active) = chain_of(30, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let prev = entry_at(&index, &active, 25);

        // rate = 2.0 → 2_000_000 hundredths; with stake_time equal to the
        // scale denominator the subsidy is exactly 33 * 2_000_000.
        let stake_time = REWARD_SCALE_DENOMINATOR;
        let reward = engine.proof_of_stake_time_reward(&index, &active, &prev, stake_time, 0);
        assert_eq!(reward, REWARD_SCALE_NUMERATOR * 2 * CENT);
    }

    #[test]
    fn stake_reward_adds_fees() {
        let (index, active) = chain_of(30, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let prev = entry_at(&index, &active, 25);

        let base = engine.proof_of_stake_time_reward(&index, &active, &prev, 10_000, 0);
        let with_fees = engine.proof_of_stake_time_reward(&index, &active, &prev, 10_000, 777);
        assert_eq!(with_fees, base + 777);
    }

    #[test]
    fn stake_reward_zero_stake_time() {
        let (index, active) = chain_of(30, 1_500_000_000);
        let engine = RewardEngine::with_clock(test_params(), || 0);
        let prev = entry_at(&index, &active, 25);
        assert_eq!(
            engine.proof_of_stake_time_reward(&index, &active, &prev, 0, 0),
            0
        );
    }

    proptest! {
        #[test]
        fn interest_rate_capped_everywhere(height in 1u64..30) {
            let (index, active) = chain_of(30, 1_500_000_000);
            let engine = RewardEngine::with_clock(test_params(), || 0);
            let prev = entry_at(&index, &active, height);
            let rate = engine.interest_rate(&index, &active, &prev);
            prop_assert!(rate <= INTEREST_RATE_CAP_PCT);
        }
    }
}
