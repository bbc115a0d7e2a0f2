use tilemul::{
    compute_block_size, select_block_size, BlockPlan, BlockPolicy, CacheLevel, CacheTopology,
    TILE_ALIGN,
};

#[test]
fn test_128kb_cache_at_80_percent() {
    // floor(sqrt(131072 * 0.8 / 24)) = 66, rounded down to a multiple
    // of 8 -> at most 64.
    let plan = compute_block_size(131072, 0.8);
    let edge = plan.edge().expect("128 KB should yield a tile");

    assert!(edge > 0);
    assert_eq!(edge % TILE_ALIGN, 0);
    assert!(edge <= 64, "edge {} exceeds the capacity bound", edge);
}

#[test]
fn test_invalid_usage_fraction_is_no_solution() {
    for capacity in [0, 1024, 131072, 12 * 1024 * 1024] {
        assert_eq!(compute_block_size(capacity, 1.5), BlockPlan::NoSolution);
        assert_eq!(compute_block_size(capacity, 0.0), BlockPlan::NoSolution);
        assert_eq!(compute_block_size(capacity, -0.8), BlockPlan::NoSolution);
    }
}

#[test]
fn test_undersized_cache_is_no_solution() {
    // Below ~2 KB no aligned tile of 8 fits three ways.
    assert_eq!(compute_block_size(1024, 0.8), BlockPlan::NoSolution);
    assert_eq!(compute_block_size(0, 0.8), BlockPlan::NoSolution);
}

#[test]
fn test_first_qualifying_returns_l1_value() {
    let topology = CacheTopology::new(vec![
        CacheLevel::new("L1d", 32 * 1024),
        CacheLevel::new("L2", 1024 * 1024),
    ]);

    let l1_alone = compute_block_size(32 * 1024, 0.8);
    assert_ne!(l1_alone, BlockPlan::NoSolution);
    assert_eq!(
        select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
        l1_alone
    );
}

#[test]
fn test_smallest_across_all_bounded_by_l1() {
    let topology = CacheTopology::new(vec![
        CacheLevel::new("L1d", 32 * 1024),
        CacheLevel::new("L2", 1024 * 1024),
    ]);

    let smallest = select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll)
        .edge()
        .expect("topology should yield a tile");
    let l1_alone = compute_block_size(32 * 1024, 0.8)
        .edge()
        .expect("L1 should yield a tile");

    assert!(smallest <= l1_alone);
}

#[test]
fn test_policies_skip_unusable_levels() {
    // The first level is too small to hold three aligned tiles; both
    // policies should fall through to the L2-derived edge.
    let topology = CacheTopology::new(vec![
        CacheLevel::new("scratchpad", 1024),
        CacheLevel::new("L2", 1024 * 1024),
    ]);

    let l2_alone = compute_block_size(1024 * 1024, 0.8);
    assert_eq!(
        select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
        l2_alone
    );
    assert_eq!(
        select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll),
        l2_alone
    );
}

#[test]
fn test_no_level_qualifies() {
    let topology = CacheTopology::new(vec![
        CacheLevel::new("tiny", 512),
        CacheLevel::new("small", 1024),
    ]);

    assert_eq!(
        select_block_size(&topology, 0.8, BlockPolicy::FirstQualifying),
        BlockPlan::NoSolution
    );
    assert_eq!(
        select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll),
        BlockPlan::NoSolution
    );

    // An invalid fraction disqualifies every level, whatever its size.
    let big = CacheTopology::new(vec![CacheLevel::new("L3", 32 * 1024 * 1024)]);
    assert_eq!(
        select_block_size(&big, 1.2, BlockPolicy::SmallestAcrossAll),
        BlockPlan::NoSolution
    );
}
