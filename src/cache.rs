//! Cache topology description and the tile-size advisor.
//!
//! The advisor is a capacity heuristic, not a cache simulator: it sizes a
//! square tile so that three of them (one each from A, B and C) fit inside
//! the usable part of a cache level, and errs toward smaller, safer tiles.
//! Associativity and eviction behavior are deliberately not modeled.

use std::mem;

use crate::TILE_ALIGN;

/// Tiles that must be cache-resident at once: one each from A, B and C.
const RESIDENT_TILES: usize = 3;

/// One level of the cache hierarchy, supplied by the caller.
///
/// The crate never probes hardware; the harness hardcodes the figures the
/// same way a benchmark config file would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLevel {
    /// Human-readable label, e.g. `"L1d"`.
    pub name: String,
    /// Capacity in bytes.
    pub capacity: usize,
}

impl CacheLevel {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        CacheLevel {
            name: name.into(),
            capacity,
        }
    }
}

/// Ordered sequence of cache levels, innermost first.
///
/// Order matters for [`BlockPolicy::FirstQualifying`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheTopology {
    levels: Vec<CacheLevel>,
}

impl CacheTopology {
    pub fn new(levels: Vec<CacheLevel>) -> Self {
        CacheTopology { levels }
    }

    pub fn levels(&self) -> &[CacheLevel] {
        &self.levels
    }
}

/// Result of the tile-size advisor.
///
/// `NoSolution` is a normal value the caller must branch on, never a panic:
/// it means the usage fraction was invalid or no tile of at least
/// [`TILE_ALIGN`] elements fits the usable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPlan {
    /// A usable tile edge: at least [`TILE_ALIGN`] and a multiple of it.
    Edge(usize),
    NoSolution,
}

impl BlockPlan {
    /// Returns the tile edge, or `None` for `NoSolution`.
    pub fn edge(self) -> Option<usize> {
        match self {
            BlockPlan::Edge(edge) => Some(edge),
            BlockPlan::NoSolution => None,
        }
    }
}

/// How [`select_block_size`] combines the levels of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPolicy {
    /// Take the first level (in topology order) that yields a solution.
    FirstQualifying,
    /// Evaluate every level and take the smallest valid edge, biasing
    /// toward the tightest-fitting (typically fastest) level.
    SmallestAcrossAll,
}

/// Computes a tile edge so that three square `f64` tiles fit in
/// `capacity_bytes * usage_fraction` bytes.
///
/// The raw edge `sqrt(effective / 24)` is floored and rounded down to a
/// multiple of [`TILE_ALIGN`]. A `usage_fraction` outside `(0, 1]` or an
/// edge below [`TILE_ALIGN`] yields [`BlockPlan::NoSolution`].
pub fn compute_block_size(capacity_bytes: usize, usage_fraction: f64) -> BlockPlan {
    if !(usage_fraction > 0.0 && usage_fraction <= 1.0) {
        return BlockPlan::NoSolution;
    }

    let effective = capacity_bytes as f64 * usage_fraction;
    let raw = (effective / (RESIDENT_TILES * mem::size_of::<f64>()) as f64).sqrt();
    let edge = (raw.floor() as usize / TILE_ALIGN) * TILE_ALIGN;

    if edge < TILE_ALIGN {
        BlockPlan::NoSolution
    } else {
        BlockPlan::Edge(edge)
    }
}

/// Runs [`compute_block_size`] across a topology under the given policy.
///
/// Returns [`BlockPlan::NoSolution`] when no level yields a solution.
pub fn select_block_size(
    topology: &CacheTopology,
    usage_fraction: f64,
    policy: BlockPolicy,
) -> BlockPlan {
    let mut edges = topology
        .levels()
        .iter()
        .filter_map(|level| compute_block_size(level.capacity, usage_fraction).edge());

    let picked = match policy {
        BlockPolicy::FirstQualifying => edges.next(),
        BlockPolicy::SmallestAcrossAll => edges.min(),
    };

    picked.map_or(BlockPlan::NoSolution, BlockPlan::Edge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_128kb_at_80_percent() {
        // sqrt(131072 * 0.8 / 24) = 66.1 -> floor -> 64
        assert_eq!(compute_block_size(128 * 1024, 0.8), BlockPlan::Edge(64));
    }

    #[test]
    fn test_invalid_fraction_is_no_solution() {
        for capacity in [1024, 128 * 1024, 12 * 1024 * 1024] {
            assert_eq!(compute_block_size(capacity, 1.5), BlockPlan::NoSolution);
            assert_eq!(compute_block_size(capacity, 0.0), BlockPlan::NoSolution);
            assert_eq!(compute_block_size(capacity, -0.3), BlockPlan::NoSolution);
            assert_eq!(compute_block_size(capacity, f64::NAN), BlockPlan::NoSolution);
        }
    }

    #[test]
    fn test_tiny_cache_is_no_solution() {
        // 1 KB at 80% leaves room for a raw edge of ~5.8, below the
        // alignment unit.
        assert_eq!(compute_block_size(1024, 0.8), BlockPlan::NoSolution);
    }

    #[test]
    fn test_edges_are_aligned_multiples() {
        for capacity in (2..64).map(|kb| kb * 1024) {
            if let BlockPlan::Edge(edge) = compute_block_size(capacity, 0.8) {
                assert!(edge >= TILE_ALIGN);
                assert_eq!(edge % TILE_ALIGN, 0, "capacity {capacity}");
            }
        }
    }

    #[test]
    fn test_edge_monotone_in_capacity() {
        let mut last = 0;
        for capacity in (2..512).map(|kb| kb * 1024) {
            if let BlockPlan::Edge(edge) = compute_block_size(capacity, 0.8) {
                assert!(edge >= last, "edge shrank at capacity {capacity}");
                last = edge;
            }
        }
    }

    #[test]
    fn test_first_qualifying_takes_topology_order() {
        let topology = CacheTopology::new(vec![
            CacheLevel::new("L1d", 32 * 1024),
            CacheLevel::new("L2", 1024 * 1024),
        ]);

        let l1_alone = compute_block_size(32 * 1024, 0.8);
        assert_eq!(
            select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
            l1_alone
        );
    }

    #[test]
    fn test_first_qualifying_skips_hopeless_levels() {
        let topology = CacheTopology::new(vec![
            CacheLevel::new("tiny", 1024),
            CacheLevel::new("L2", 1024 * 1024),
        ]);

        assert_eq!(
            select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
            compute_block_size(1024 * 1024, 0.8)
        );
    }

    #[test]
    fn test_smallest_across_all_is_bounded_by_l1() {
        let topology = CacheTopology::new(vec![
            CacheLevel::new("L1d", 32 * 1024),
            CacheLevel::new("L2", 1024 * 1024),
        ]);

        let smallest = select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll)
            .edge()
            .unwrap();
        let l1_alone = compute_block_size(32 * 1024, 0.8).edge().unwrap();
        assert!(smallest <= l1_alone);
    }

    #[test]
    fn test_empty_topology_is_no_solution() {
        let topology = CacheTopology::default();
        assert_eq!(
            select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
            BlockPlan::NoSolution
        );
        assert_eq!(
            select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll),
            BlockPlan::NoSolution
        );
    }
}
