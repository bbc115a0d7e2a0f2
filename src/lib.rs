//! Cache-blocked dense matrix multiplication in Rust.
//!
//! This crate benchmarks square `f64` matrix multiplication under several
//! loop-order strategies and exposes the part that actually matters for
//! performance: a tiled ("blocked") kernel whose tile edge is derived from
//! cache capacity, a blocked transpose that gives the right-hand operand
//! sequential access, and a row-partitioning rule that makes parallel
//! execution safe without locks or atomics.
//!
//! ## Usage
//!
//! ```
//! use tilemul::multiply_blocked;
//!
//! let n = 64;
//! let a = vec![1.0f64; n * n];
//! let b = vec![1.0f64; n * n];
//! let mut c = vec![0.0f64; n * n];
//!
//! multiply_blocked(n, n, n, 32, &a, &b, &mut c);
//! assert_eq!(c[0], n as f64);
//! ```
//!
//! Picking the tile edge from the cache hierarchy instead:
//!
//! ```
//! use tilemul::{select_block_size, BlockPlan, BlockPolicy, CacheLevel, CacheTopology};
//!
//! let topology = CacheTopology::new(vec![
//!     CacheLevel::new("L1d", 32 * 1024),
//!     CacheLevel::new("L2", 1024 * 1024),
//! ]);
//!
//! let plan = select_block_size(&topology, 0.8, BlockPolicy::SmallestAcrossAll);
//! assert!(matches!(plan, BlockPlan::Edge(edge) if edge % 8 == 0));
//! ```
//!
//! ## What's inside
//!
//! - Naive (i-j-k), row-broadcast (i-k-j) and blocked kernels, plus a
//!   transposed-operand mode
//! - A capacity heuristic that turns cache sizes into tile edges
//! - Rayon-backed parallel execution over disjoint row bands
//! - A benchmark driver binary that sweeps sizes and logs CSV

pub mod cache;
pub mod error;
pub mod multiply;
pub mod transpose;
pub mod utils;

pub use cache::{
    compute_block_size, select_block_size, BlockPlan, BlockPolicy, CacheLevel, CacheTopology,
};
pub use multiply::{
    multiply, multiply_blocked, multiply_blocked_parallel, multiply_naive,
    multiply_row_broadcast, multiply_transposed, Algorithm, MultiplyConfig,
};
pub use transpose::transpose;

/// Tile edges produced by the advisor are multiples of this unit.
pub const TILE_ALIGN: usize = 8;

/// Tile edge used when no cache level yields a plan.
pub const DEFAULT_TILE_EDGE: usize = 64;

/// Block edge used by the transpose engine.
pub const TRANSPOSE_BLOCK: usize = 32;

/// Fraction of a cache level the advisor assumes is available for the three
/// working tiles, leaving headroom for other memory traffic.
pub const DEFAULT_USAGE_FRACTION: f64 = 0.8;

/// Matrix buffers are allocated on this byte boundary.
pub const MATRIX_ALIGN: usize = 64;
