//! # helio-chain
//! Block-index graph, active-chain view, and chain-work arithmetic.

pub mod active_chain;
pub mod block_index;
pub mod checkpoint;
pub mod work;
