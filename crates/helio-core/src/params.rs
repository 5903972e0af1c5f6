//! Consensus parameters per network.
//!
//! A read-only parameter table selected once at node startup. Everything the
//! chain index and the economic layer consume (target spacing, stake age,
//! fork-activation heights, difficulty limits, checkpoint pins) lives here;
//! nothing in this module is mutated after selection.

use primitive_types::U256;

use crate::constants::COIN;

/// Network selector: Mainnet, Testnet, or Regtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network with a trivial difficulty floor.
    Regtest,
}

impl Network {
    /// Four-byte message-start string for the P2P layer.
    pub fn magic_bytes(&self) -> [u8; 4] {
        match self {
            Self::Mainnet => [0x04, 0xf1, 0x04, 0xfd],
            Self::Testnet => [0xfd, 0xd2, 0xc8, 0xf1],
            Self::Regtest => [0xfa, 0xbf, 0xb5, 0xda],
        }
    }

    /// Default TCP port for P2P connections.
    pub fn default_p2p_port(&self) -> u16 {
        match self {
            Self::Mainnet => 18181,
            Self::Testnet => 19335,
            Self::Regtest => 19444,
        }
    }

    /// Subdirectory name appended to the base data directory path.
    pub fn data_dir_suffix(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }
}

/// Hard-coded mainnet checkpoints: `(height, block_hash)` pins.
///
/// Representative subset of the historical chain; reorgs at or below the
/// last entry are rejected by the checkpoint module.
pub const MAINNET_CHECKPOINTS: &[(u64, [u8; 32])] = &[
    (1, [0xe8, 0x66, 0x6c, 0x87, 0x15, 0xfa, 0xfb, 0xfb, 0x09, 0x51, 0x32, 0xde, 0xb1, 0xdd, 0x2a, 0xf6, 0x3f, 0xe1, 0x4d, 0x3d, 0x71, 0x63, 0x71, 0x53, 0x41, 0xd4, 0x8f, 0xef, 0xfa, 0xb4, 0x58, 0xcc]),
    (100_000, [0x68, 0xd5, 0x02, 0x7a, 0x57, 0x0c, 0x60, 0x5f, 0x6a, 0x0d, 0x24, 0xf8, 0xba, 0xd5, 0xc4, 0x54, 0x76, 0x94, 0x38, 0xeb, 0x4a, 0x23, 0x7e, 0x93, 0xb4, 0xee, 0x7a, 0x63, 0x8e, 0xaa, 0x01, 0xb0]),
    (543_210, [0x46, 0x98, 0x0e, 0x38, 0xcf, 0x57, 0x45, 0x16, 0xa2, 0x99, 0xc1, 0xf6, 0x2a, 0x7b, 0xfd, 0xac, 0x13, 0xe8, 0x64, 0x4b, 0x4a, 0xf9, 0x21, 0x57, 0x8d, 0x24, 0x6f, 0xce, 0xa4, 0xfa, 0xf3, 0xbf]),
    (1_000_000, [0x96, 0xd4, 0x4e, 0xce, 0xba, 0xf3, 0x7b, 0xc1, 0x70, 0x44, 0xa5, 0x2e, 0xca, 0xf7, 0xba, 0x9d, 0xa1, 0x6e, 0xcb, 0xb4, 0x29, 0x36, 0x40, 0x2d, 0xe3, 0xe2, 0x3c, 0x38, 0x56, 0x1a, 0x6b, 0x20]),
    (1_456_000, [0xd7, 0xc1, 0x31, 0x04, 0x53, 0x0a, 0x97, 0x94, 0xdc, 0x67, 0xa6, 0x23, 0x11, 0x1e, 0x66, 0x44, 0xb3, 0x11, 0x0f, 0x7b, 0x18, 0xb6, 0xf8, 0xaa, 0x3a, 0x92, 0xaa, 0xe8, 0x16, 0x2d, 0x99, 0x96]),
];

/// Testnet checkpoints.
pub const TESTNET_CHECKPOINTS: &[(u64, [u8; 32])] = &[
    (2_056, [0x17, 0x74, 0x8a, 0x31, 0xba, 0x97, 0xaf, 0xdc, 0x9a, 0x4f, 0x86, 0x83, 0x7a, 0x39, 0xd2, 0x87, 0xe3, 0xe7, 0xc7, 0x29, 0x0a, 0x08, 0xa1, 0xd8, 0x16, 0xc5, 0x96, 0x9c, 0x78, 0xa8, 0x32, 0x89]),
];

/// Consensus parameters consumed by the chain index and the reward engine.
///
/// Heights gate behavior changes that shipped as soft forks on the
/// historical chain; they are part of consensus and must not be adjusted
/// for a network that shares history with it.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
    pub network: Network,
    /// Target seconds between blocks.
    pub target_spacing: i64,
    /// Minimum coin age before an output may stake, in seconds.
    pub stake_min_age: i64,
    /// Stake modifier re-selection interval, in seconds.
    pub stake_modifier_interval: i64,
    /// Blocks between subsidy halvings (proof-of-work era schedule).
    pub subsidy_halving_interval: u64,
    /// Easiest admissible proof-of-work target.
    pub pow_limit: U256,
    /// Easiest admissible proof-of-stake target.
    pub pos_limit: U256,
    /// Height of the final proof-of-work block.
    pub last_pow_height: u64,
    /// Height above which the interest rate is pinned to
    /// [`fixed_interest_rate_pct`](Self::fixed_interest_rate_pct).
    pub fixed_interest_height: u64,
    /// Second fork height: activates the non-negative stake-time clamp and
    /// the money-supply overflow correction.
    pub stake_time_fork_height: u64,
    /// Interest rate in percent once past the fixed-interest height.
    pub fixed_interest_rate_pct: f64,
    /// Coin supply at the end of the proof-of-work era, in whole coins.
    pub initial_coin_supply: i64,
    /// Expected grant-driven supply growth per block, in whole coins.
    pub coin_supply_growth_rate: f64,
    /// Correction subtracted from the stored (overflowed) supply snapshot,
    /// in helios. Must match the historical chain bit-for-bit.
    pub supply_overflow_offset: i64,
    /// Checkpoint pins for this network.
    pub checkpoints: &'static [(u64, [u8; 32])],
}

impl ConsensusParams {
    /// Parameters for the given network. Called once at startup; the result
    /// is shared read-only for the process lifetime.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            target_spacing: 60,
            stake_min_age: 8 * 60 * 60,
            stake_modifier_interval: 10 * 50,
            subsidy_halving_interval: 525_600,
            pow_limit: U256::MAX >> 20,
            pos_limit: U256::MAX >> 20,
            last_pow_height: 835_000,
            fixed_interest_height: 835_000 + 1_000,
            stake_time_fork_height: 1_177_000,
            fixed_interest_rate_pct: 2.0,
            initial_coin_supply: 98_000_000_000,
            coin_supply_growth_rate: 1.35,
            supply_overflow_offset: 98_000_000_000i64.wrapping_mul(COIN),
            checkpoints: MAINNET_CHECKPOINTS,
        }
    }

    fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            target_spacing: 150,
            checkpoints: TESTNET_CHECKPOINTS,
            ..Self::mainnet()
        }
    }

    fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            pow_limit: U256::MAX >> 1,
            pos_limit: U256::MAX >> 1,
            checkpoints: &[],
            ..Self::mainnet()
        }
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}
