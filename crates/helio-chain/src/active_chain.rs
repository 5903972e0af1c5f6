//! The height-addressable view over the currently-best chain.
//!
//! [`ActiveChain`] keeps one hash slot per height, resolved through the
//! [`BlockIndex`] arena, so membership ("is this entry on the best chain,
//! and where") is O(1). The vector is rebuilt on every tip change, reusing
//! the shared suffix when the new tip descends from a block already in
//! place: a reorg costs the length of the divergent branch, not the whole
//! chain.
//!
//! Tip updates and all other writes to "current best chain" state must be
//! serialized by the caller; queries only traverse published immutable
//! entries and are safe under a shared lock.

use serde::{Deserialize, Serialize};

use helio_core::types::Hash256;

use crate::block_index::{BlockIndex, BlockIndexEntry};

/// A sparse, most-recent-first list of block hashes describing a chain to a
/// peer. Dense over recent history, exponentially sparser with age, always
/// terminated by the genesis hash — peers rely on that exact shape to find
/// the common prefix of two chains.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockLocator(pub Vec<Hash256>);

/// The active best chain: one entry hash per height from genesis to tip.
#[derive(Clone, Debug, Default)]
pub struct ActiveChain {
    chain: Vec<Hash256>,
}

impl ActiveChain {
    /// Create an empty chain view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tip, rebuilding the height vector.
    ///
    /// Walks backward from the new tip overwriting slots and stops as soon
    /// as a slot already holds the correct hash for its height, so switching
    /// to a descendant or a nearby fork touches only the divergent suffix.
    /// `None` clears the view entirely.
    pub fn set_tip(&mut self, index: &BlockIndex, tip: Option<&BlockIndexEntry>) {
        let Some(tip) = tip else {
            self.chain.clear();
            return;
        };

        self.chain.resize((tip.height + 1) as usize, Hash256::ZERO);
        let mut walk = Some(tip);
        while let Some(entry) = walk {
            let slot = &mut self.chain[entry.height as usize];
            if *slot == entry.hash {
                break;
            }
            *slot = entry.hash;
            walk = index.prev_of(entry);
        }
        tracing::debug!(height = tip.height, tip = %tip.hash, "active chain tip updated");
    }

    /// O(1) membership: the entry is active iff it occupies its height slot.
    pub fn contains(&self, entry: &BlockIndexEntry) -> bool {
        self.hash_at(entry.height) == Some(&entry.hash)
    }

    /// Hash at `height`, or `None` outside `[0, height()]`.
    pub fn hash_at(&self, height: u64) -> Option<&Hash256> {
        self.chain.get(height as usize)
    }

    /// Entry at `height`, resolved through the arena.
    pub fn get<'a>(&self, index: &'a BlockIndex, height: u64) -> Option<&'a BlockIndexEntry> {
        self.hash_at(height).and_then(|hash| index.get(hash))
    }

    /// The tip hash, if the chain is non-empty.
    pub fn tip_hash(&self) -> Option<&Hash256> {
        self.chain.last()
    }

    /// The tip entry, if the chain is non-empty.
    pub fn tip<'a>(&self, index: &'a BlockIndex) -> Option<&'a BlockIndexEntry> {
        self.tip_hash().and_then(|hash| index.get(hash))
    }

    /// The genesis entry, if the chain is non-empty.
    pub fn genesis<'a>(&self, index: &'a BlockIndex) -> Option<&'a BlockIndexEntry> {
        self.get(index, 0)
    }

    /// Height of the tip, or `None` for an empty chain.
    pub fn height(&self) -> Option<u64> {
        self.chain.len().checked_sub(1).map(|h| h as u64)
    }

    /// Number of occupied height slots.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether no tip has been set.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Build a locator starting at `from` (the tip when absent).
    ///
    /// Steps back 1 block at a time for the first 10 entries, doubling the
    /// stride afterwards. On-chain cursors jump through the height vector in
    /// O(1); off-chain cursors fall back to the skip-list ancestor query.
    pub fn locator(&self, index: &BlockIndex, from: Option<&BlockIndexEntry>) -> BlockLocator {
        let mut step = 1u64;
        let mut have = Vec::with_capacity(32);

        let mut current = from.or_else(|| self.tip(index));
        while let Some(entry) = current {
            have.push(entry.hash);
            // Stop once the genesis block is included.
            if entry.height == 0 {
                break;
            }
            let next_height = entry.height.saturating_sub(step);
            current = if self.contains(entry) {
                self.get(index, next_height)
            } else {
                index.ancestor(entry, next_height)
            };
            if have.len() > 10 {
                step *= 2;
            }
        }

        BlockLocator(have)
    }

    /// The last common ancestor of `entry` and the active chain, or `None`
    /// when the chains do not connect (or the view is empty).
    ///
    /// An entry that is already active is its own fork point.
    pub fn find_fork<'a>(
        &self,
        index: &'a BlockIndex,
        entry: &'a BlockIndexEntry,
    ) -> Option<&'a BlockIndexEntry> {
        let tip_height = self.height()?;
        // Drop straight down to tip height first so a long excess tail is
        // crossed with the skip list instead of block by block.
        let mut walk = if entry.height > tip_height {
            index.ancestor(entry, tip_height)
        } else {
            Some(entry)
        };
        while let Some(e) = walk {
            if self.contains(e) {
                return Some(e);
            }
            walk = index.prev_of(e);
        }
        None
    }

    /// The earliest active entry whose running-maximum timestamp is at least
    /// `time`, or `None` when no such entry exists.
    ///
    /// Binary search; correct because `time_max` is non-decreasing by height
    /// (maintained at insertion, not re-checked here).
    pub fn find_earliest_at_least<'a>(
        &self,
        index: &'a BlockIndex,
        time: i64,
    ) -> Option<&'a BlockIndexEntry> {
        let position = self
            .chain
            .partition_point(|hash| index.get(hash).is_some_and(|e| e.time_max < time));
        self.chain.get(position).and_then(|hash| index.get(hash))
    }
}
