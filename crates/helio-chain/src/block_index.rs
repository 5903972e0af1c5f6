//! The block-metadata graph and its logarithmic ancestor queries.
//!
//! Every connected block gets a [`BlockIndexEntry`] in a hash-keyed arena
//! ([`BlockIndex`]). Entries reference their predecessor and a skip ancestor
//! by hash rather than by pointer, so the graph is a plain DAG with genesis
//! as its unique root and no ownership cycles. Entries are immutable once
//! inserted and are never removed (pruning happens at the storage layer, not
//! here).
//!
//! The skip pointer is computed exactly once, when the entry is inserted,
//! and turns `ancestor` from a linear `prev` walk into an O(log n) query.

use std::collections::HashMap;

use primitive_types::U256;

use helio_core::error::ChainIndexError;
use helio_core::types::{BlockKind, Hash256};

use crate::work;

/// Already-validated metadata for a block being connected to the index.
#[derive(Clone, Debug)]
pub struct BlockMetadata {
    /// Block identity hash.
    pub hash: Hash256,
    /// Predecessor hash; `None` only for genesis.
    pub prev: Option<Hash256>,
    /// Compact difficulty target.
    pub bits: u32,
    /// Block timestamp, Unix seconds.
    pub time: i64,
    /// Proof kind of the block.
    pub kind: BlockKind,
    /// Money-supply snapshot after this block, in helios. Carries the
    /// historical signed overflow on the live chain; stored verbatim.
    pub money_supply: i64,
}

/// A node in the block-metadata graph.
///
/// Invariant: `height == prev.height + 1` whenever `prev` is present, and
/// `time_max` is non-decreasing along any chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub hash: Hash256,
    /// Height in the chain; genesis is 0.
    pub height: u64,
    /// Predecessor hash; `None` only for genesis.
    pub prev: Option<Hash256>,
    /// Skip ancestor, computed once at insertion and immutable after.
    skip: Option<Hash256>,
    /// Compact difficulty target.
    pub bits: u32,
    /// Cumulative chain work from genesis through this block.
    pub chain_work: U256,
    /// Block timestamp, Unix seconds.
    pub time: i64,
    /// Running maximum of own and all ancestor timestamps.
    pub time_max: i64,
    pub kind: BlockKind,
    /// Money-supply snapshot after this block, in helios.
    pub money_supply: i64,
}

impl BlockIndexEntry {
    pub fn is_proof_of_stake(&self) -> bool {
        self.kind == BlockKind::ProofOfStake
    }

    /// The skip ancestor's hash, if this entry has one.
    pub fn skip(&self) -> Option<&Hash256> {
        self.skip.as_ref()
    }
}

/// Turn the lowest set bit of `n` into a zero.
fn invert_lowest_one(n: u64) -> u64 {
    n & n.wrapping_sub(1)
}

/// The height the skip pointer at `height` jumps back to.
///
/// Any value strictly below `height` would be correct; this particular bit
/// pattern keeps the worst-case ancestor walk near 110 steps for chains up
/// to 2^18 blocks and is relied on by the step-bound tests.
pub fn skip_height(height: u64) -> u64 {
    if height < 2 {
        return 0;
    }
    if height & 1 == 1 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}

/// The node-wide arena of block entries, keyed by hash.
///
/// Single-writer: `insert` requires `&mut self` and must be serialized with
/// the tip-update lock; all queries take `&self` and traverse only
/// already-published immutable entries.
#[derive(Clone, Debug, Default)]
pub struct BlockIndex {
    entries: HashMap<Hash256, BlockIndexEntry>,
}

impl BlockIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a block to the index.
    ///
    /// Derives height, running-maximum timestamp, cumulative work, and the
    /// one-time skip pointer from the predecessor entry.
    ///
    /// # Errors
    ///
    /// - [`ChainIndexError::DuplicateBlock`] if the hash is already indexed
    /// - [`ChainIndexError::UnknownParent`] if `prev` names an unindexed block
    pub fn insert(&mut self, meta: BlockMetadata) -> Result<&BlockIndexEntry, ChainIndexError> {
        if self.entries.contains_key(&meta.hash) {
            return Err(ChainIndexError::DuplicateBlock(meta.hash.to_string()));
        }

        let proof = work::block_proof(meta.bits);
        let (height, time_max, chain_work, skip) = match &meta.prev {
            None => (0, meta.time, proof, None),
            Some(prev_hash) => {
                let prev = self.entries.get(prev_hash).ok_or_else(|| {
                    ChainIndexError::UnknownParent {
                        block: meta.hash.to_string(),
                        parent: prev_hash.to_string(),
                    }
                })?;
                let height = prev.height + 1;
                let time_max = prev.time_max.max(meta.time);
                let chain_work = prev.chain_work.checked_add(proof).unwrap_or(U256::MAX);
                let skip = self
                    .ancestor(prev, skip_height(height))
                    .map(|ancestor| ancestor.hash);
                (height, time_max, chain_work, skip)
            }
        };

        let entry = BlockIndexEntry {
            hash: meta.hash,
            height,
            prev: meta.prev,
            skip,
            bits: meta.bits,
            chain_work,
            time: meta.time,
            time_max,
            kind: meta.kind,
            money_supply: meta.money_supply,
        };
        let hash = entry.hash;
        self.entries.insert(hash, entry);
        Ok(&self.entries[&hash])
    }

    /// Look up an entry by hash.
    pub fn get(&self, hash: &Hash256) -> Option<&BlockIndexEntry> {
        self.entries.get(hash)
    }

    /// Whether the hash is indexed.
    pub fn contains(&self, hash: &Hash256) -> bool {
        self.entries.contains_key(hash)
    }

    /// Number of indexed entries (all branches, not just the active chain).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve an entry's predecessor, if any.
    pub fn prev_of<'a>(&'a self, entry: &BlockIndexEntry) -> Option<&'a BlockIndexEntry> {
        entry.prev.as_ref().and_then(|hash| self.entries.get(hash))
    }

    /// The ancestor of `entry` at exactly `height`, or `None` when `height`
    /// exceeds the entry's own height.
    ///
    /// Walks backward choosing between the skip pointer and the plain
    /// predecessor at each step; the skip is taken unless routing through the
    /// predecessor's own skip would land strictly closer to the target
    /// without overshooting. That choice is what keeps the walk logarithmic.
    ///
    /// # Panics
    ///
    /// Panics if a predecessor link is missing above height 0 — the index
    /// graph is corrupt and no recovery is possible.
    pub fn ancestor<'a>(
        &'a self,
        entry: &'a BlockIndexEntry,
        height: u64,
    ) -> Option<&'a BlockIndexEntry> {
        self.ancestor_with_steps(entry, height).map(|(e, _)| e)
    }

    /// [`ancestor`](Self::ancestor) plus the number of link traversals
    /// taken; the step count backs the performance-bound tests.
    fn ancestor_with_steps<'a>(
        &'a self,
        entry: &'a BlockIndexEntry,
        height: u64,
    ) -> Option<(&'a BlockIndexEntry, usize)> {
        if height > entry.height {
            return None;
        }

        let mut walk = entry;
        let mut height_walk = entry.height;
        let mut steps = 0usize;
        while height_walk > height {
            let height_skip = skip_height(height_walk);
            let height_skip_prev = skip_height(height_walk - 1);
            let skip_entry = walk.skip.as_ref().and_then(|hash| self.entries.get(hash));
            let take_skip = skip_entry.is_some()
                && (height_skip == height
                    || (height_skip > height
                        && !(height_skip_prev < height_skip.saturating_sub(2)
                            && height_skip_prev >= height)));
            if take_skip {
                walk = skip_entry.expect("checked above");
                height_walk = height_skip;
            } else {
                let prev_hash = walk
                    .prev
                    .as_ref()
                    .expect("block index corrupted: missing predecessor above genesis");
                walk = self
                    .entries
                    .get(prev_hash)
                    .expect("block index corrupted: unresolved predecessor hash");
                height_walk -= 1;
            }
            steps += 1;
        }
        Some((walk, steps))
    }
}
